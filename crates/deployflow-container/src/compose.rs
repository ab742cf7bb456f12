//! compose スタックの再起動

use crate::error::Result;
use crate::runner::{CommandRunner, Invocation};
use std::path::Path;

/// `docker compose down` → `docker compose up -d` を行う
pub struct StackRestarter<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> StackRestarter<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn down_invocation(manifest: &Path, workdir: &Path) -> Invocation {
        Invocation::new("docker")
            .args(["compose", "-f"])
            .path_arg(manifest)
            .arg("down")
            .current_dir(workdir)
    }

    pub fn up_invocation(manifest: &Path, workdir: &Path) -> Invocation {
        Invocation::new("docker")
            .args(["compose", "-f"])
            .path_arg(manifest)
            .args(["up", "-d"])
            .current_dir(workdir)
    }

    /// スタックを停止してから再作成・起動する
    ///
    /// down が失敗した場合は up を実行しない。up が失敗した場合スタックは停止したまま。
    pub async fn restart(&self, manifest: &Path, workdir: &Path) -> Result<()> {
        tracing::info!("Bringing stack down: {}", manifest.display());
        self.runner
            .run(&Self::down_invocation(manifest, workdir))
            .await?;

        tracing::info!("Bringing stack up (detached): {}", manifest.display());
        self.runner
            .run(&Self::up_invocation(manifest, workdir))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContainerError;
    use crate::recording::RecordingRunner;

    #[tokio::test]
    async fn test_down_then_up() {
        let runner = RecordingRunner::new();
        StackRestarter::new(&runner)
            .restart(Path::new("docker-compose.yml"), Path::new("/srv/app"))
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "docker compose -f docker-compose.yml down",
                "docker compose -f docker-compose.yml up -d",
            ]
        );
        assert!(
            runner
                .invocations()
                .iter()
                .all(|inv| inv.current_dir.as_deref() == Some(Path::new("/srv/app")))
        );
    }

    #[tokio::test]
    async fn test_down_failure_skips_up() {
        let runner = RecordingRunner::new().fail_on(" down");
        let result = StackRestarter::new(&runner)
            .restart(Path::new("docker-compose.yml"), Path::new("."))
            .await;

        assert!(matches!(result, Err(ContainerError::CommandFailed { .. })));
        assert_eq!(runner.invocations().len(), 1);
    }
}
