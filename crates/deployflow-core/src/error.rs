use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("設定 '{0}' が指定されていません")]
    MissingSetting(&'static str),

    #[error("無効なサービス名: '{0}'")]
    InvalidServiceName(String),

    #[error("サービスが重複しています: {0}")]
    DuplicateService(String),

    #[error("サービスが見つかりません: {0}")]
    ServiceNotFound(String),

    #[error("無効なタグ: {0}")]
    InvalidTag(String),

    #[error("パイプラインファイルが見つかりません: {0}")]
    PipelineFileNotFound(PathBuf),

    #[error("マニフェストを解析できません: {path}\n理由: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("マニフェスト {path} にサービス '{service}' の定義がありません")]
    ManifestServiceMissing { path: PathBuf, service: String },

    #[error("マニフェスト {path} のサービス '{service}' が不正です: {message}")]
    ManifestEntryInvalid {
        path: PathBuf,
        service: String,
        message: String,
    },
}

impl FlowError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            FlowError::MissingSetting(key) => {
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     1. deployflow.kdl に `{} \"...\"` を追加してください\n\
                     2. または --{} オプション / DEPLOYFLOW_{} 環境変数で指定してください",
                    self,
                    key,
                    key,
                    key.to_uppercase()
                )
            }
            FlowError::ManifestServiceMissing { service, .. } => {
                format!(
                    "{}\n\
                     \n\
                     compose ファイルの services セクションに '{}' を定義するか、\n\
                     deployflow.kdl の services から除外してください。",
                    self, service
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
