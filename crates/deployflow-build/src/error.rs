use deployflow_container::ContainerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Invalid tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Registry login failed for {registry}: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("Build failed for {service}: {message}")]
    BuildFailed { service: String, message: String },

    #[error("Push failed for {image}: {message}")]
    PushFailed { image: String, message: String },

    #[error(transparent)]
    Command(#[from] ContainerError),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     サービス名と同じディレクトリがリポジトリ直下にあるか確認してください。",
                    path.display()
                )
            }
            BuildError::AuthFailed { registry, message } => {
                format!(
                    "レジストリへのログインに失敗しました: {}\n\
                     {}\n\
                     \n\
                     DEPLOYFLOW_REGISTRY_USERNAME / DEPLOYFLOW_REGISTRY_PASSWORD を確認してください。",
                    registry, message
                )
            }
            BuildError::BuildFailed { service, message } => {
                format!(
                    "ビルドに失敗しました: {}\n{}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    service, message
                )
            }
            BuildError::Command(e) => e.user_message(),
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// 失敗したコマンドの stderr を取り出す（起動失敗などはそのまま返す）
pub(crate) fn command_message(err: &ContainerError) -> Option<String> {
    match err {
        ContainerError::CommandFailed { stderr, .. } => Some(stderr.clone()),
        _ => None,
    }
}
