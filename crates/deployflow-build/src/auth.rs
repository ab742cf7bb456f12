//! レジストリ認証処理
//!
//! `docker login --password-stdin` でセッションを確立し、
//! 実行の最後に `docker logout` で破棄します。

use crate::error::{BuildError, BuildResult, command_message};
use deployflow_container::{CommandRunner, Invocation};
use deployflow_core::Credentials;

/// Docker Hub を表す表示名
const DOCKER_HUB: &str = "docker.io";

/// 名前空間からレジストリのホストを抽出
///
/// Docker Hub の場合は `None`（login/logout にサーバー引数を渡さない）。
///
/// # Examples
/// - `ghcr.io/org` -> `Some("ghcr.io")`
/// - `mudam5` -> `None`
/// - `123456.dkr.ecr.region.amazonaws.com/app` -> `Some("123456.dkr.ecr.region.amazonaws.com")`
/// - `localhost:5000/team` -> `Some("localhost:5000")`
pub fn extract_registry(namespace: &str) -> Option<String> {
    let (first, rest) = namespace.split_once('/')?;

    // レジストリの判定:
    // - `.` を含む（例: ghcr.io, gcr.io, *.amazonaws.com）
    // - `:` を含む（例: localhost:5000）
    // - `localhost` そのもの
    if !rest.is_empty() && (first.contains('.') || first.contains(':') || first == "localhost") {
        return Some(first.to_string());
    }

    None
}

/// レジストリのログインセッションを管理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    server: Option<String>,
}

impl RegistryAuth {
    pub fn new(server: Option<String>) -> Self {
        Self { server }
    }

    /// 名前空間からログイン先を決める
    pub fn for_namespace(namespace: &str) -> Self {
        Self::new(extract_registry(namespace))
    }

    /// 表示用のレジストリ名
    pub fn registry(&self) -> &str {
        self.server.as_deref().unwrap_or(DOCKER_HUB)
    }

    /// パスワードは stdin 経由で渡し、引数には含めない
    pub fn login_invocation(&self, credentials: &Credentials) -> Invocation {
        Invocation::new("docker")
            .arg("login")
            .args(self.server.iter())
            .args(["--username", credentials.username.as_str(), "--password-stdin"])
            .stdin_secret(credentials.password.clone())
    }

    pub fn logout_invocation(&self) -> Invocation {
        Invocation::new("docker").arg("logout").args(self.server.iter())
    }

    /// ログイン
    pub async fn login(
        &self,
        runner: &dyn CommandRunner,
        credentials: &Credentials,
    ) -> BuildResult<()> {
        tracing::info!("Logging in to {} as {}", self.registry(), credentials.username);

        runner
            .run(&self.login_invocation(credentials))
            .await
            .map_err(|e| match command_message(&e) {
                Some(message) => BuildError::AuthFailed {
                    registry: self.registry().to_string(),
                    message,
                },
                None => BuildError::Command(e),
            })?;

        Ok(())
    }

    /// ログアウト
    pub async fn logout(&self, runner: &dyn CommandRunner) -> BuildResult<()> {
        tracing::info!("Logging out of {}", self.registry());
        runner.run(&self.logout_invocation()).await?;
        Ok(())
    }
}
