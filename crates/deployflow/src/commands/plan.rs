use super::run;
use colored::Colorize;
use deployflow::{LoadedConfig, PipelineOptions, StageSelection};

/// 実行されるコマンドを表示する（秘密値は `****` で伏せる）
pub async fn handle(loaded: &LoadedConfig, skip_fetch: bool, skip_login: bool) -> anyhow::Result<()> {
    println!("{}", "実行計画".bold());

    let options = PipelineOptions {
        skip_fetch,
        skip_login,
        dry_run: true,
        ..Default::default()
    };
    run::handle(loaded, StageSelection::full(), options).await
}
