//! ソース取得（git）

use crate::error::{ContainerError, Result};
use crate::runner::{CommandRunner, Invocation};
use deployflow_core::SourceSpec;
use std::path::Path;

/// 作業ディレクトリにブランチの内容を用意する
pub struct SourceFetcher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SourceFetcher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// 取得に使うコマンド列を決める
    ///
    /// - 作業ディレクトリが git リポジトリ: fetch して該当ブランチを強制 checkout
    /// - 存在しない／空: clone
    /// - それ以外: エラー（既存ファイルを上書きしない）
    pub fn plan(&self, source: &SourceSpec, dest: &Path) -> Result<Vec<Invocation>> {
        if dest.join(".git").exists() {
            return Ok(vec![
                Invocation::new("git")
                    .arg("-C")
                    .path_arg(dest)
                    .args(["fetch", "--depth", "1", "origin", source.branch.as_str()]),
                Invocation::new("git")
                    .arg("-C")
                    .path_arg(dest)
                    .args(["checkout", "--force", "-B", source.branch.as_str(), "FETCH_HEAD"]),
            ]);
        }

        if dest.is_dir() && dest.read_dir()?.next().is_some() {
            return Err(ContainerError::WorkdirNotEmpty(dest.to_path_buf()));
        }

        Ok(vec![
            Invocation::new("git")
                .args([
                    "clone",
                    "--branch",
                    source.branch.as_str(),
                    "--single-branch",
                    source.repository.as_str(),
                ])
                .path_arg(dest),
        ])
    }

    /// ブランチを取得
    pub async fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<()> {
        tracing::info!(
            "Fetching {} ({}) into {}",
            source.repository,
            source.branch,
            dest.display()
        );

        for invocation in self.plan(source, dest)? {
            self.runner.run(&invocation).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingRunner;
    use std::fs;

    fn source() -> SourceSpec {
        SourceSpec {
            repository: "https://github.com/org/logs.git".to_string(),
            branch: "main".to_string(),
        }
    }

    #[tokio::test]
    async fn test_clone_into_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("checkout");
        let runner = RecordingRunner::new();

        SourceFetcher::new(&runner).fetch(&source(), &dest).await.unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![format!(
                "git clone --branch main --single-branch https://github.com/org/logs.git {}",
                dest.display()
            )]
        );
    }

    #[tokio::test]
    async fn test_existing_repository_is_updated() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let runner = RecordingRunner::new();

        SourceFetcher::new(&runner)
            .fetch(&source(), dir.path())
            .await
            .unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("fetch --depth 1 origin main"));
        assert!(lines[1].ends_with("checkout --force -B main FETCH_HEAD"));
    }

    #[tokio::test]
    async fn test_non_empty_plain_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "hi").unwrap();
        let runner = RecordingRunner::new();

        let result = SourceFetcher::new(&runner).fetch(&source(), dir.path()).await;

        assert!(matches!(result, Err(ContainerError::WorkdirNotEmpty(_))));
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_clone_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new().fail_on("git clone");

        let result = SourceFetcher::new(&runner)
            .fetch(&source(), &dir.path().join("checkout"))
            .await;
        assert!(matches!(result, Err(ContainerError::CommandFailed { .. })));
    }
}
