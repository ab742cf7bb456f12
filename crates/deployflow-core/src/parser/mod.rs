//! KDLパーサー
//!
//! `deployflow.kdl` をパースして [`PipelineSettings`] を生成します。
//!
//! ```kdl
//! pipeline "log-stack"
//! namespace "mudam5"
//! tag "latest"
//! source "https://github.com/org/repo.git" branch="main"
//! workdir "."
//! manifest "docker-compose.yml"
//! concurrency 2
//! services {
//!     service "log-collector"
//!     service "persistor-auth"
//! }
//! ```

use crate::discovery::project_root;
use crate::error::{FlowError, Result};
use crate::model::PipelineSettings;
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::{Path, PathBuf};

/// KDLファイルをパース
pub fn parse_pipeline_file<P: AsRef<Path>>(path: P) -> Result<PipelineSettings> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| FlowError::IoError {
        path: path.as_ref().to_path_buf(),
        message: e.to_string(),
    })?;
    let mut settings = parse_pipeline_string(&content)?;

    // 相対パスの workdir はプロジェクトルート（.deployflow/ の場合はその親）基準。
    // 未指定の場合は None のまま
    if let Some(workdir) = settings.workdir.take() {
        settings.workdir = Some(if workdir.is_absolute() {
            workdir
        } else {
            project_root(path.as_ref()).join(workdir)
        });
    }

    Ok(settings)
}

/// KDL文字列をパース
pub fn parse_pipeline_string(content: &str) -> Result<PipelineSettings> {
    let doc: KdlDocument = content.parse()?;

    let mut settings = PipelineSettings::default();

    for node in doc.nodes() {
        match node.name().value() {
            "pipeline" => settings.name = Some(required_string(node)?),
            "namespace" | "registry" => settings.namespace = Some(required_string(node)?),
            "tag" => settings.tag = Some(required_string(node)?),
            "source" => {
                settings.repository = Some(required_string(node)?);
                settings.branch = string_property(node, "branch");
            }
            "workdir" => settings.workdir = Some(PathBuf::from(required_string(node)?)),
            "manifest" => settings.manifest = Some(PathBuf::from(required_string(node)?)),
            "concurrency" => {
                let value = node
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_integer())
                    .ok_or_else(|| {
                        FlowError::InvalidConfig("concurrency には整数を指定してください".to_string())
                    })?;
                let value = usize::try_from(value).map_err(|_| {
                    FlowError::InvalidConfig(format!("concurrency が範囲外です: {}", value))
                })?;
                settings.concurrency = Some(value);
            }
            "services" => {
                // サービスリストは1か所でのみ宣言できる
                if settings.services.is_some() {
                    return Err(FlowError::InvalidConfig(
                        "services は1回だけ宣言してください".to_string(),
                    ));
                }
                settings.services = Some(parse_services(node)?);
            }
            other => {
                tracing::debug!("Skipping unknown node: {}", other);
            }
        }
    }

    Ok(settings)
}

/// services ノードをパース
///
/// `services "a" "b"` と子ノード `service "a"` の両方の書き方を受け付ける。
fn parse_services(node: &KdlNode) -> Result<Vec<String>> {
    let mut names: Vec<String> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "service" {
                names.push(required_string(child)?);
            }
        }
    }

    Ok(names)
}

/// 最初の引数を文字列として取得
fn required_string(node: &KdlNode) -> Result<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            FlowError::InvalidConfig(format!(
                "{} requires a string argument",
                node.name().value()
            ))
        })
}

/// 名前付きプロパティを文字列として取得
fn string_property(node: &KdlNode, key: &str) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests;
