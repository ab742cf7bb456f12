//! compose マニフェストの書き換え
//!
//! `services.<name>.build` をレジストリのイメージ参照 `image` に置き換えます。
//! テキスト置換ではなく YAML として読み込み、全サービスの検証が通ってから
//! 一度だけ書き出します。

use crate::error::{FlowError, Result};
use crate::model::{ImageRef, ServiceName};
use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// サービスごとの書き換え結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// build ディレクティブを image に置き換えた
    Rewritten,
    /// 既存の image を別のタグに差し替えた
    Retagged { previous: String },
    /// 既に目的の image になっている
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRewrite {
    pub service: ServiceName,
    pub image: String,
    pub outcome: RewriteOutcome,
}

/// マニフェスト全体の書き換え結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub changes: Vec<ServiceRewrite>,
}

impl RewriteReport {
    /// 何も変更がなかったか
    pub fn is_noop(&self) -> bool {
        self.changes
            .iter()
            .all(|c| c.outcome == RewriteOutcome::Unchanged)
    }

    pub fn count(&self, predicate: impl Fn(&RewriteOutcome) -> bool) -> usize {
        self.changes.iter().filter(|c| predicate(&c.outcome)).count()
    }

    /// 1行サマリー
    pub fn summary(&self) -> String {
        format!(
            "{} rewritten, {} retagged, {} unchanged",
            self.count(|o| *o == RewriteOutcome::Rewritten),
            self.count(|o| matches!(o, RewriteOutcome::Retagged { .. })),
            self.count(|o| *o == RewriteOutcome::Unchanged),
        )
    }
}

/// 読み込んだ compose マニフェスト
#[derive(Debug, Clone)]
pub struct ComposeManifest {
    path: PathBuf,
    document: Value,
}

impl ComposeManifest {
    /// ファイルから読み込み
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlowError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// 文字列から読み込み（path はエラーメッセージと保存先に使う）
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(content).map_err(|e| FlowError::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if !matches!(document.get("services"), Some(Value::Mapping(_))) {
            return Err(FlowError::ManifestParse {
                path: path.to_path_buf(),
                message: "services セクションがありません".to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 定義されているサービス名
    pub fn service_names(&self) -> Vec<String> {
        self.services()
            .map(|services| {
                services
                    .keys()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// サービスの image 値
    pub fn image(&self, service: &str) -> Option<&str> {
        self.entry(service)
            .and_then(|entry| entry.get("image"))
            .and_then(Value::as_str)
    }

    /// サービスに build ディレクティブがあるか
    pub fn has_build(&self, service: &str) -> bool {
        self.entry(service)
            .map(|entry| entry.contains_key("build"))
            .unwrap_or(false)
    }

    /// 書き換え内容を計算（マニフェストは変更しない）
    ///
    /// どれか1つでもサービスが欠けている・不正な場合はエラー。
    pub fn plan(&self, images: &[ImageRef]) -> Result<RewriteReport> {
        let mut changes = Vec::with_capacity(images.len());

        for image in images {
            let service = image.service().as_str();
            let entry = self
                .entry(service)
                .ok_or_else(|| FlowError::ManifestServiceMissing {
                    path: self.path.clone(),
                    service: service.to_string(),
                })?;

            let target = image.to_string();
            let current = entry.get("image").and_then(Value::as_str);

            let outcome = if entry.contains_key("build") {
                RewriteOutcome::Rewritten
            } else {
                match current {
                    Some(current) if current == target => RewriteOutcome::Unchanged,
                    Some(current) => RewriteOutcome::Retagged {
                        previous: current.to_string(),
                    },
                    None => {
                        return Err(FlowError::ManifestEntryInvalid {
                            path: self.path.clone(),
                            service: service.to_string(),
                            message: "build も image も定義されていません".to_string(),
                        });
                    }
                }
            };

            changes.push(ServiceRewrite {
                service: image.service().clone(),
                image: target,
                outcome,
            });
        }

        Ok(RewriteReport { changes })
    }

    /// 書き換えを適用
    ///
    /// 検証は [`plan`](Self::plan) で先に済ませるため、途中で失敗して
    /// 一部だけ書き換わることはない。
    pub fn apply(&mut self, images: &[ImageRef]) -> Result<RewriteReport> {
        let report = self.plan(images)?;

        for change in report
            .changes
            .iter()
            .filter(|c| c.outcome != RewriteOutcome::Unchanged)
        {
            let path = self.path.clone();
            let entry = self
                .entry_mut(change.service.as_str())
                .ok_or_else(|| FlowError::ManifestServiceMissing {
                    path,
                    service: change.service.to_string(),
                })?;
            replace_with_image(entry, &change.image);
            tracing::debug!("Rewrote {} -> {}", change.service, change.image);
        }

        Ok(report)
    }

    /// YAML 文字列に変換
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.document).map_err(|e| FlowError::ManifestParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// 読み込み元に保存
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// 指定パスに保存
    ///
    /// 同じディレクトリの一時ファイルに書いてから rename するので、
    /// 書き込み途中のファイルが残ることはない。
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let io_error = |e: std::io::Error| FlowError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(content.as_bytes()).map_err(io_error)?;
        // 一時ファイルは 0600 で作られるため、既存ファイルの権限を引き継ぐ
        if let Ok(metadata) = std::fs::metadata(path) {
            file.as_file()
                .set_permissions(metadata.permissions())
                .map_err(io_error)?;
        }
        file.persist(path).map_err(|e| io_error(e.error))?;

        Ok(())
    }

    fn services(&self) -> Option<&Mapping> {
        self.document.get("services").and_then(Value::as_mapping)
    }

    fn entry(&self, service: &str) -> Option<&Mapping> {
        self.services()
            .and_then(|services| services.get(service))
            .and_then(Value::as_mapping)
    }

    fn entry_mut(&mut self, service: &str) -> Option<&mut Mapping> {
        self.document
            .get_mut("services")
            .and_then(Value::as_mapping_mut)
            .and_then(|services| services.get_mut(service))
            .and_then(Value::as_mapping_mut)
    }
}

/// build を image に置き換える（キーの並び順は維持）
fn replace_with_image(entry: &mut Mapping, image: &str) {
    let has_build = entry.contains_key("build");
    let mut rebuilt = Mapping::with_capacity(entry.len());

    for (key, value) in entry.iter() {
        match key.as_str() {
            Some("build") => {
                rebuilt.insert(Value::from("image"), Value::from(image));
            }
            Some("image") if has_build => {}
            Some("image") => {
                rebuilt.insert(key.clone(), Value::from(image));
            }
            _ => {
                rebuilt.insert(key.clone(), value.clone());
            }
        }
    }

    *entry = rebuilt;
}

/// マニフェストを読み込んで書き換え、保存する
///
/// `output` が指定された場合はそちらに書き出し、元のファイルは変更しない。
/// 変更がなく出力先も元ファイルの場合は書き込み自体を行わない。
pub fn rewrite_manifest(
    path: &Path,
    images: &[ImageRef],
    output: Option<&Path>,
) -> Result<RewriteReport> {
    let mut manifest = ComposeManifest::load(path)?;
    let report = manifest.apply(images)?;

    match output {
        Some(target) => manifest.save_to(target)?,
        None if report.is_noop() => {
            tracing::debug!("Manifest already up to date: {}", path.display());
        }
        None => manifest.save()?,
    }

    Ok(report)
}
