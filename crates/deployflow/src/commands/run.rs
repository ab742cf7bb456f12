use crate::utils;
use colored::Colorize;
use deployflow::{LoadedConfig, Pipeline, PipelineError, PipelineOptions, StageSelection};
use deployflow_container::{CommandRunner, ProcessRunner, RecordingRunner};
use deployflow_core::Credentials;

pub async fn handle(
    loaded: &LoadedConfig,
    selection: StageSelection,
    options: PipelineOptions,
) -> anyhow::Result<()> {
    if options.dry_run {
        println!("{}", "dry-run: コマンドは実行せずに表示します".yellow().bold());
    } else {
        println!("{}", "パイプラインを開始します...".blue().bold());
    }
    utils::print_config(loaded);

    // 認証情報はログインするコマンドでだけ読む
    let credentials = if selection.login && !options.skip_login {
        Credentials::from_env().map_err(|e| anyhow::anyhow!(e.user_message()))?
    } else {
        None
    };

    let runner: Box<dyn CommandRunner> = if options.dry_run {
        Box::new(RecordingRunner::echoing())
    } else {
        Box::new(ProcessRunner::new())
    };

    let pipeline = Pipeline::new(&loaded.config, runner.as_ref(), credentials, options);
    let report = pipeline
        .run(&selection)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    report.print_summary();

    match &report.failure {
        Some(err) => {
            eprintln!();
            eprintln!("{}", err.user_message().red());
            let stage = match err {
                PipelineError::StageFailed { stage, .. } => stage.label(),
                PipelineError::MissingCredentials => "preflight",
            };
            anyhow::bail!("パイプラインが {} で失敗しました", stage)
        }
        None => {
            println!();
            println!("{}", "✓ パイプラインが完了しました！".green().bold());
            Ok(())
        }
    }
}
