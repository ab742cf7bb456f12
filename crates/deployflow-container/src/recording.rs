//! 記録用 Runner
//!
//! コマンドを実行せずに記録する。`--dry-run` の表示と、
//! パイプラインのテストで実行順序を検証するために使う。

use crate::error::{ContainerError, Result};
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use async_trait::async_trait;
use colored::Colorize;
use std::sync::{Mutex, MutexGuard};

/// コマンドを記録するだけの Runner
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Vec<String>,
    echo: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録と同時にコマンドを標準出力に表示する（dry-run 用）
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// コマンドラインに `needle` を含む呼び出しを失敗させる
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    /// 記録された呼び出し（実行順）
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().clone()
    }

    /// 記録されたコマンドライン（実行順）
    pub fn command_lines(&self) -> Vec<String> {
        self.lock().iter().map(Invocation::command_line).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Invocation>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.lock().push(invocation.clone());

        if self.echo {
            println!("  {} {}", "$".dimmed(), invocation.to_string().dimmed());
        }

        let command_line = invocation.command_line();
        if self.failures.iter().any(|needle| command_line.contains(needle)) {
            return Err(ContainerError::CommandFailed {
                command: command_line,
                status: Some(1),
                stderr: "injected failure".to_string(),
            });
        }

        Ok(CommandOutput {
            status: Some(0),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let runner = RecordingRunner::new();
        runner.run(&Invocation::new("git").arg("clone")).await.unwrap();
        runner.run(&Invocation::new("docker").arg("build")).await.unwrap();

        assert_eq!(runner.command_lines(), vec!["git clone", "docker build"]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_still_recorded() {
        let runner = RecordingRunner::new().fail_on("push");
        let result = runner
            .run(&Invocation::new("docker").args(["push", "mudam5/api:latest"]))
            .await;

        assert!(matches!(result, Err(ContainerError::CommandFailed { .. })));
        assert_eq!(runner.invocations().len(), 1);
    }
}
