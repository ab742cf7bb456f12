use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("コマンドを起動できません: {command}\n理由: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("コマンドが失敗しました ({}): {command}\n{stderr}", exit_label(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("作業ディレクトリが空ではなく git リポジトリでもありません: {0}")]
    WorkdirNotEmpty(PathBuf),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            ContainerError::Spawn { command, .. } => {
                let program = command.split_whitespace().next().unwrap_or(command);
                format!(
                    "{}\n\
                     \n\
                     解決方法:\n\
                     • {} がインストールされ PATH に含まれているか確認してください",
                    self, program
                )
            }
            ContainerError::WorkdirNotEmpty(path) => {
                format!(
                    "{}\n\
                     \n\
                     空のディレクトリを workdir に指定するか、--skip-fetch で取得をスキップしてください: {}",
                    self,
                    path.display()
                )
            }
            _ => format!("{}", self),
        }
    }
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit {}", code),
        None => "signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
