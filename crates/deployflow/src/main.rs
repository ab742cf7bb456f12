mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use deployflow::{PipelineOptions, StageSelection, load_config};
use deployflow_core::PipelineSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deployflow")]
#[command(about = "取得して、ビルドして、差し替える。デプロイは一本の流れになった。", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// 全コマンド共通のオプション（CLI > 環境変数 > パイプラインファイル）
#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// パイプラインファイルのパス
    #[arg(short = 'c', long, env = "DEPLOYFLOW_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// レジストリの名前空間 (mudam5, ghcr.io/org)
    #[arg(long, env = "DEPLOYFLOW_NAMESPACE", global = true)]
    namespace: Option<String>,
    /// イメージタグ
    #[arg(short = 't', long, env = "DEPLOYFLOW_TAG", global = true)]
    tag: Option<String>,
    /// 取得するリポジトリのURL
    #[arg(long, env = "DEPLOYFLOW_REPOSITORY", global = true)]
    repository: Option<String>,
    /// 取得するブランチ
    #[arg(long, env = "DEPLOYFLOW_BRANCH", global = true)]
    branch: Option<String>,
    /// 作業ディレクトリ（ビルドコンテキストの親）
    #[arg(short = 'w', long, env = "DEPLOYFLOW_WORKDIR", global = true)]
    workdir: Option<PathBuf>,
    /// compose マニフェストのパス（作業ディレクトリ基準）
    #[arg(short = 'f', long, env = "DEPLOYFLOW_MANIFEST", global = true)]
    manifest: Option<PathBuf>,
    /// ビルド・プッシュの並列数
    #[arg(short = 'j', long, env = "DEPLOYFLOW_JOBS", global = true)]
    jobs: Option<usize>,
    /// 対象サービス（複数指定可、実行順はサービス一覧の順）
    #[arg(short = 'n', long = "service", global = true)]
    services: Vec<String>,
    /// コマンドを実行せずに表示する
    #[arg(long, global = true)]
    dry_run: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> PipelineSettings {
        PipelineSettings {
            namespace: self.namespace.clone(),
            tag: self.tag.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            workdir: self.workdir.clone(),
            manifest: self.manifest.clone(),
            concurrency: self.jobs,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// パイプライン全体を実行（取得→ログイン→ビルド→プッシュ→書き換え→再起動）
    Run {
        /// ソース取得をスキップ（チェックアウト済みの場合）
        #[arg(long)]
        skip_fetch: bool,
        /// ログイン・ログアウトをスキップ（認証済みの場合）
        #[arg(long)]
        skip_login: bool,
        /// キャッシュを使わずにビルド
        #[arg(long)]
        no_cache: bool,
        /// ベースイメージを常に pull
        #[arg(long)]
        pull: bool,
        /// 書き換えたマニフェストの出力先（元ファイルは変更しない）
        #[arg(long)]
        manifest_out: Option<PathBuf>,
    },
    /// イメージをビルド
    Build {
        /// ビルド後にレジストリへプッシュ
        #[arg(long)]
        push: bool,
        /// ログイン・ログアウトをスキップ（認証済みの場合）
        #[arg(long)]
        skip_login: bool,
        /// キャッシュを使わずにビルド
        #[arg(long)]
        no_cache: bool,
        /// ベースイメージを常に pull
        #[arg(long)]
        pull: bool,
    },
    /// compose マニフェストの build をイメージ参照に書き換え
    Rewrite {
        /// 書き換えたマニフェストの出力先（元ファイルは変更しない）
        #[arg(long)]
        manifest_out: Option<PathBuf>,
    },
    /// スタックを再起動（down → up -d）
    Restart,
    /// 実行内容を表示（何も実行しない）
    Plan {
        /// ソース取得をスキップ
        #[arg(long)]
        skip_fetch: bool,
        /// ログイン・ログアウトをスキップ
        #[arg(long)]
        skip_login: bool,
    },
    /// 設定ファイル・ビルドコンテキスト・マニフェストを検証
    Validate,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr に出力（RUST_LOG で調整）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("deployflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let base = std::env::current_dir()?;
    let loaded = load_config(
        cli.global.config.as_deref(),
        &base,
        cli.global.overrides(),
        &cli.global.services,
    )
    .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let dry_run = cli.global.dry_run;

    match cli.command {
        Commands::Run {
            skip_fetch,
            skip_login,
            no_cache,
            pull,
            manifest_out,
        } => {
            let options = PipelineOptions {
                skip_fetch,
                skip_login,
                no_cache,
                pull,
                manifest_out,
                dry_run,
            };
            commands::run::handle(&loaded, StageSelection::full(), options).await?;
        }
        Commands::Build {
            push,
            skip_login,
            no_cache,
            pull,
        } => {
            let options = PipelineOptions {
                skip_login,
                no_cache,
                pull,
                dry_run,
                ..Default::default()
            };
            commands::run::handle(&loaded, StageSelection::build_only(push), options).await?;
        }
        Commands::Rewrite { manifest_out } => {
            let options = PipelineOptions {
                manifest_out,
                dry_run,
                ..Default::default()
            };
            commands::run::handle(&loaded, StageSelection::rewrite_only(), options).await?;
        }
        Commands::Restart => {
            let options = PipelineOptions {
                dry_run,
                ..Default::default()
            };
            commands::run::handle(&loaded, StageSelection::restart_only(), options).await?;
        }
        Commands::Plan {
            skip_fetch,
            skip_login,
        } => {
            commands::plan::handle(&loaded, skip_fetch, skip_login).await?;
        }
        Commands::Validate => {
            commands::validate::handle(&loaded)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
