//! パイプライン設定

use super::image::{DEFAULT_TAG, ImageRef, validate_tag};
use super::service::{ServiceList, ServiceName};
use crate::error::{FlowError, Result};
use std::path::{Path, PathBuf};

/// 既定の compose マニフェスト名
pub const DEFAULT_MANIFEST: &str = "docker-compose.yml";
/// source に branch が指定されていない場合のブランチ
pub const DEFAULT_BRANCH: &str = "main";

/// ソース取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub repository: String,
    pub branch: String,
}

/// 部分的なパイプライン設定
///
/// `deployflow.kdl`、環境変数、CLI 引数のそれぞれから作られ、
/// `merge` で重ね合わせてから [`PipelineConfig`] に確定させます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub tag: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub workdir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub services: Option<Vec<String>>,
    pub concurrency: Option<usize>,
}

impl PipelineSettings {
    /// 別の設定をマージ（other の値が Some なら上書き）
    pub fn merge(&mut self, other: PipelineSettings) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.namespace.is_some() {
            self.namespace = other.namespace;
        }
        if other.tag.is_some() {
            self.tag = other.tag;
        }
        if other.repository.is_some() {
            self.repository = other.repository;
        }
        if other.branch.is_some() {
            self.branch = other.branch;
        }
        if other.workdir.is_some() {
            self.workdir = other.workdir;
        }
        if other.manifest.is_some() {
            self.manifest = other.manifest;
        }
        if other.services.is_some() {
            self.services = other.services;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
    }
}

/// 確定したパイプライン設定
///
/// 各ステージはこの構造体だけを受け取り、環境変数は参照しません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub name: String,
    pub namespace: String,
    pub tag: String,
    pub source: Option<SourceSpec>,
    pub workdir: PathBuf,
    pub manifest: PathBuf,
    pub services: ServiceList,
    pub concurrency: usize,
}

impl PipelineConfig {
    /// 部分設定から確定させる
    pub fn from_settings(settings: PipelineSettings) -> Result<Self> {
        let namespace = settings
            .namespace
            .map(|ns| ns.trim().trim_end_matches('/').to_string())
            .filter(|ns| !ns.is_empty())
            .ok_or(FlowError::MissingSetting("namespace"))?;

        let tag = settings.tag.unwrap_or_else(|| DEFAULT_TAG.to_string());
        validate_tag(&tag)?;

        let source = match (settings.repository, settings.branch) {
            (Some(repository), branch) => Some(SourceSpec {
                repository,
                branch: branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            }),
            (None, Some(branch)) => {
                return Err(FlowError::InvalidConfig(format!(
                    "branch '{}' が指定されていますが repository がありません",
                    branch
                )));
            }
            (None, None) => None,
        };

        let services = match settings.services {
            Some(names) => ServiceList::new(names)?,
            None => ServiceList::defaults(),
        };

        let concurrency = settings.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(FlowError::InvalidConfig(
                "concurrency は1以上を指定してください".to_string(),
            ));
        }

        Ok(Self {
            name: settings.name.unwrap_or_else(|| "deployflow".to_string()),
            namespace,
            tag,
            source,
            workdir: settings.workdir.unwrap_or_else(|| PathBuf::from(".")),
            manifest: settings
                .manifest
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
            services,
            concurrency,
        })
    }

    /// サービスのイメージ参照
    pub fn image_for(&self, service: &ServiceName) -> ImageRef {
        ImageRef::new(&self.namespace, service, &self.tag)
    }

    /// 全サービスのイメージ参照（宣言順）
    pub fn images(&self) -> Vec<ImageRef> {
        self.services
            .iter()
            .map(|service| self.image_for(service))
            .collect()
    }

    /// サービスのビルドコンテキスト（作業ディレクトリ直下の同名ディレクトリ）
    pub fn context_dir(&self, service: &ServiceName) -> PathBuf {
        self.workdir.join(service.as_str())
    }

    /// マニフェストの実パス（相対パスは作業ディレクトリ基準）
    pub fn manifest_path(&self) -> PathBuf {
        if self.manifest.is_absolute() {
            self.manifest.clone()
        } else {
            self.workdir.join(&self.manifest)
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// 指定サービスだけに絞った設定を返す
    pub fn with_services(mut self, only: &[String]) -> Result<Self> {
        self.services = self.services.select(only)?;
        Ok(self)
    }
}
