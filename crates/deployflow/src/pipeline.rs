//! パイプラインの実行
//!
//! ステージは宣言順に1つずつ実行し、失敗した時点で以降のステージはスキップします。
//! ログインを行う実行では、結果に関わらず最後にログアウトします。

use crate::progress::StageProgress;
use crate::report::RunReport;
use colored::Colorize;
use deployflow_build::{BuildError, BuildOptions, ImageBuilder, ImagePusher, RegistryAuth, WorkerPool};
use deployflow_container::{CommandRunner, ContainerError, SourceFetcher, StackRestarter};
use deployflow_core::{
    ComposeManifest, Credentials, FlowError, PASSWORD_ENV, PipelineConfig, USERNAME_ENV,
    rewrite_manifest,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// パイプラインのステージ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Login,
    Build,
    Push,
    Rewrite,
    Restart,
    Logout,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Login => "login",
            Stage::Build => "build",
            Stage::Push => "push",
            Stage::Rewrite => "rewrite",
            Stage::Restart => "restart",
            Stage::Logout => "logout",
        }
    }

    /// 表示用の名前
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Fetch => "ソースを取得",
            Stage::Login => "レジストリにログイン",
            Stage::Build => "イメージをビルド",
            Stage::Push => "イメージをプッシュ",
            Stage::Rewrite => "マニフェストを書き換え",
            Stage::Restart => "スタックを再起動",
            Stage::Logout => "レジストリからログアウト",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 実行するステージの組み合わせ
///
/// ログアウトはログインを含む場合に自動で付く。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSelection {
    pub fetch: bool,
    pub login: bool,
    pub build: bool,
    pub push: bool,
    pub rewrite: bool,
    pub restart: bool,
}

impl StageSelection {
    /// 全ステージ
    pub fn full() -> Self {
        Self {
            fetch: true,
            login: true,
            build: true,
            push: true,
            rewrite: true,
            restart: true,
        }
    }

    /// ビルドのみ（`push` の場合はログインとプッシュも）
    pub fn build_only(push: bool) -> Self {
        Self {
            fetch: false,
            login: push,
            build: true,
            push,
            rewrite: false,
            restart: false,
        }
    }

    pub fn rewrite_only() -> Self {
        Self {
            rewrite: true,
            ..Self::none()
        }
    }

    pub fn restart_only() -> Self {
        Self {
            restart: true,
            ..Self::none()
        }
    }

    fn none() -> Self {
        Self {
            fetch: false,
            login: false,
            build: false,
            push: false,
            rewrite: false,
            restart: false,
        }
    }

    /// 選択されたステージ（実行順、ログアウトを除く）
    pub fn stages(&self) -> Vec<Stage> {
        [
            (self.fetch, Stage::Fetch),
            (self.login, Stage::Login),
            (self.build, Stage::Build),
            (self.push, Stage::Push),
            (self.rewrite, Stage::Rewrite),
            (self.restart, Stage::Restart),
        ]
        .into_iter()
        .filter_map(|(selected, stage)| selected.then_some(stage))
        .collect()
    }
}

/// 実行オプション
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// ソース取得をスキップ（CI で既にチェックアウト済み）
    pub skip_fetch: bool,
    /// ログイン・ログアウトをスキップ（既に認証済み）
    pub skip_login: bool,
    pub no_cache: bool,
    pub pull: bool,
    /// 書き換えたマニフェストの出力先（元ファイルは変更しない）
    pub manifest_out: Option<PathBuf>,
    /// コマンドを実行せず表示する
    pub dry_run: bool,
}

/// ステージ内で発生したエラー
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("{source}\nプッシュ済みのサービス: {}", pushed_label(.pushed))]
    PushIncomplete {
        pushed: Vec<String>,
        #[source]
        source: BuildError,
    },
}

impl StageError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            StageError::Flow(e) => e.user_message(),
            StageError::Container(e) => e.user_message(),
            StageError::Build(e) => e.user_message(),
            StageError::PushIncomplete { pushed, source } => format!(
                "{}\n\
                 \n\
                 レジストリは途中までプッシュされた状態です: {}",
                source.user_message(),
                pushed_label(pushed)
            ),
        }
    }
}

fn pushed_label(pushed: &[String]) -> String {
    if pushed.is_empty() {
        "(なし)".to_string()
    } else {
        pushed.join(", ")
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "レジストリの認証情報がありません: {} と {} を設定するか --skip-login を指定してください",
        USERNAME_ENV,
        PASSWORD_ENV
    )]
    MissingCredentials,

    #[error("{stage} ステージが失敗しました: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: StageError,
    },
}

impl PipelineError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::MissingCredentials => self.to_string(),
            PipelineError::StageFailed { stage, source } => {
                format!("{} ステージが失敗しました\n{}", stage, source.user_message())
            }
        }
    }
}

/// パイプライン
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    runner: &'a dyn CommandRunner,
    credentials: Option<Credentials>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        runner: &'a dyn CommandRunner,
        credentials: Option<Credentials>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            config,
            runner,
            credentials,
            options,
        }
    }

    /// 選択されたステージを実行する
    ///
    /// 実行前の検証（認証情報の有無）に失敗した場合はどのステージも実行せずにエラーを返す。
    /// それ以外の失敗はレポートの `failure` に入る。
    pub async fn run(&self, selection: &StageSelection) -> Result<RunReport, PipelineError> {
        let wants_login = selection.login && !self.options.skip_login;
        if wants_login && self.credentials.is_none() && !self.options.dry_run {
            return Err(PipelineError::MissingCredentials);
        }
        let session = wants_login && self.credentials.is_some();

        let auth = RegistryAuth::for_namespace(&self.config.namespace);
        let stages = selection.stages();
        let total = stages.len();
        let mut report = RunReport::new();

        for (index, stage) in stages.into_iter().enumerate() {
            println!();
            println!(
                "{}",
                format!("【Step {}/{}】{}", index + 1, total, stage.title()).bold()
            );

            if report.failure.is_some() {
                println!("  {}", "前のステージが失敗したためスキップ".dimmed());
                report.skipped(stage, "前のステージが失敗しました");
                continue;
            }
            if let Some(reason) = self.skip_reason(stage, session) {
                println!("  {}", format!("スキップ: {}", reason).dimmed());
                report.skipped(stage, reason);
                continue;
            }

            let progress = StageProgress::new(stage, !self.options.dry_run);
            let started = Instant::now();
            tracing::info!("Stage started: {}", stage);

            match self.execute(stage, &auth).await {
                Ok(detail) => {
                    progress.finish_success();
                    tracing::info!("Stage finished: {}", stage);
                    match &detail {
                        Some(d) => println!("  {} {}", "✓".green(), d),
                        None => println!("  {} 完了", "✓".green()),
                    }
                    report.succeeded(stage, started.elapsed(), detail);
                }
                Err(source) => {
                    progress.finish_error();
                    tracing::error!("Stage failed: {}: {}", stage, source);
                    eprintln!("  {} {}", "✗".red().bold(), source);
                    report.failed(
                        stage,
                        started.elapsed(),
                        PipelineError::StageFailed { stage, source },
                    );
                }
            }
        }

        if session {
            self.logout(&auth, &mut report).await;
        } else if selection.login {
            report.skipped(Stage::Logout, "ログインしていません");
        }

        Ok(report)
    }

    fn skip_reason(&self, stage: Stage, session: bool) -> Option<&'static str> {
        match stage {
            Stage::Fetch if self.options.skip_fetch => Some("--skip-fetch が指定されました"),
            Stage::Fetch if self.config.source.is_none() => Some("source が設定されていません"),
            Stage::Login if self.options.skip_login => Some("--skip-login が指定されました"),
            Stage::Login if !session => Some("認証情報がありません (dry-run)"),
            _ => None,
        }
    }

    async fn execute(
        &self,
        stage: Stage,
        auth: &RegistryAuth,
    ) -> Result<Option<String>, StageError> {
        match stage {
            Stage::Fetch => self.fetch().await,
            Stage::Login => {
                if let Some(credentials) = &self.credentials {
                    auth.login(self.runner, credentials).await?;
                }
                Ok(Some(format!("{} にログインしました", auth.registry())))
            }
            Stage::Build => self.build().await,
            Stage::Push => self.push().await,
            Stage::Rewrite => self.rewrite(),
            Stage::Restart => self.restart().await,
            Stage::Logout => {
                auth.logout(self.runner).await?;
                Ok(None)
            }
        }
    }

    async fn fetch(&self) -> Result<Option<String>, StageError> {
        let Some(source) = &self.config.source else {
            return Ok(None);
        };

        SourceFetcher::new(self.runner)
            .fetch(source, self.config.workdir())
            .await?;

        Ok(Some(format!("{} ({})", source.repository, source.branch)))
    }

    async fn build(&self) -> Result<Option<String>, StageError> {
        let builder = ImageBuilder::new(
            self.runner,
            BuildOptions {
                no_cache: self.options.no_cache,
                pull: self.options.pull,
                check_context: !self.options.dry_run,
            },
        );
        let pool = WorkerPool::new(self.config.concurrency);

        let report = pool
            .run(self.config.services.as_slice(), |service| {
                let image = self.config.image_for(service);
                let context = self.config.context_dir(service);
                let builder = &builder;
                async move { builder.build(&image, &context).await.map(|_| image) }
            })
            .await;

        if report.not_started > 0 {
            tracing::warn!("{} build(s) not started after failure", report.not_started);
        }
        let built = report.into_result()?;
        for image in &built {
            println!("  {} {}", "✓".green(), image.to_string().cyan());
        }

        Ok(Some(format!("{} 個のイメージをビルドしました", built.len())))
    }

    async fn push(&self) -> Result<Option<String>, StageError> {
        let pusher = ImagePusher::new(self.runner);
        let pool = WorkerPool::new(self.config.concurrency);

        let report = pool
            .run(self.config.services.as_slice(), |service| {
                let image = self.config.image_for(service);
                let pusher = &pusher;
                async move { pusher.push(&image).await.map(|_| image) }
            })
            .await;

        let pushed: Vec<String> = report
            .completed
            .iter()
            .map(|image| image.service().to_string())
            .collect();

        match report.failure {
            Some(source) => Err(StageError::PushIncomplete { pushed, source }),
            None => {
                for image in &report.completed {
                    println!("  {} {}", "✓".green(), image.to_string().cyan());
                }
                Ok(Some(format!("{} 個のイメージをプッシュしました", pushed.len())))
            }
        }
    }

    fn rewrite(&self) -> Result<Option<String>, StageError> {
        let path = self.config.manifest_path();
        let images = self.config.images();

        if self.options.dry_run {
            if !path.exists() {
                return Ok(Some(format!(
                    "{} は未取得のため検証を省略",
                    path.display()
                )));
            }
            let report = ComposeManifest::load(&path)?.plan(&images)?;
            return Ok(Some(format!("{} (書き込みなし)", report.summary())));
        }

        let output = self.manifest_out()?;
        let report = rewrite_manifest(&path, &images, output.as_deref())?;
        for change in &report.changes {
            tracing::debug!("{}: {:?} -> {}", change.service, change.outcome, change.image);
        }

        Ok(Some(report.summary()))
    }

    async fn restart(&self) -> Result<Option<String>, StageError> {
        // compose は workdir で実行されるので `-f` は絶対パスで渡す
        let manifest = match self.manifest_out()? {
            Some(path) => path,
            None => absolute(&self.config.manifest_path())?,
        };

        StackRestarter::new(self.runner)
            .restart(&manifest, self.config.workdir())
            .await?;

        Ok(None)
    }

    /// `--manifest-out` の出力先（カレントディレクトリ基準の絶対パス）
    fn manifest_out(&self) -> Result<Option<PathBuf>, StageError> {
        self.options
            .manifest_out
            .as_deref()
            .map(absolute)
            .transpose()
    }

    /// ログアウト（失敗しても実行結果は変えない）
    async fn logout(&self, auth: &RegistryAuth, report: &mut RunReport) {
        let started = Instant::now();

        match self.execute(Stage::Logout, auth).await {
            Ok(_) => report.succeeded(Stage::Logout, started.elapsed(), None),
            Err(e) => {
                tracing::warn!("Logout failed: {}", e);
                println!("  {} ログアウトに失敗しました: {}", "⚠".yellow(), e);
                report.warned(Stage::Logout, started.elapsed(), e.to_string());
            }
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, StageError> {
    std::path::absolute(path).map_err(|e| StageError::Container(ContainerError::Io(e)))
}
