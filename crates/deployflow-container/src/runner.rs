//! 外部コマンド実行

use crate::error::{ContainerError, Result};
use async_trait::async_trait;
use deployflow_core::Secret;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// stderr をエラーメッセージに含める最大行数
const STDERR_TAIL_LINES: usize = 20;

/// 実行するコマンド1回分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    stdin: Option<Secret>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// 秘密値を stdin から渡す（コマンドラインには現れない）
    pub fn stdin_secret(mut self, secret: Secret) -> Self {
        self.stdin = Some(secret);
        self
    }

    pub fn stdin(&self) -> Option<&Secret> {
        self.stdin.as_ref()
    }

    /// 表示用のコマンドライン
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())?;
        if let Some(secret) = &self.stdin {
            write!(f, " <<< {}", secret)?;
        }
        Ok(())
    }
}

/// 空白を含む引数だけクォートする
fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}

/// コマンドの実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// 外部コマンドを実行する
///
/// 非ゼロ終了は `ContainerError::CommandFailed` として返す。
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// tokio のプロセスとして実際に実行する Runner
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    stream_output: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 子プロセスの stdout/stderr をそのまま端末に流す
    pub fn streaming() -> Self {
        Self {
            stream_output: true,
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command_line = invocation.command_line();
        tracing::debug!("Running: {}", command_line);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if self.stream_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|source| ContainerError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        if let Some(secret) = &invocation.stdin
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(secret.expose().as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            tracing::debug!("Command failed ({:?}): {}", result.status, command_line);
            return Err(ContainerError::CommandFailed {
                command: command_line,
                status: result.status,
                stderr: tail(&result.stderr, STDERR_TAIL_LINES),
            });
        }

        Ok(result)
    }
}

/// 末尾 n 行を取り出す
fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
