//! 設定の読み込み
//!
//! 優先順位: CLI 引数 > 環境変数 > パイプラインファイル > 既定値
//! （CLI 引数と環境変数は clap が解決済みのものを `overrides` として受け取る）
//!
//! workdir は常に絶対パスに確定させる。未指定の場合はパイプラインファイルの
//! プロジェクトルート、ファイルも無ければ `base`。

use deployflow_core::{
    PipelineConfig, PipelineSettings, Result, find_pipeline_file, parse_pipeline_file,
    project_root,
};
use std::path::{Path, PathBuf};

/// 確定した設定と、その読み込み元
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PipelineConfig,
    pub source_file: Option<PathBuf>,
}

pub fn load_config(
    explicit: Option<&Path>,
    base: &Path,
    overrides: PipelineSettings,
    only: &[String],
) -> Result<LoadedConfig> {
    let source_file = find_pipeline_file(explicit, base)?;

    let mut settings = match &source_file {
        Some(path) => {
            tracing::info!("Loading pipeline file: {}", path.display());
            parse_pipeline_file(path)?
        }
        None => PipelineSettings::default(),
    };
    settings.merge(overrides);

    let workdir = settings
        .workdir
        .take()
        .or_else(|| source_file.as_deref().map(project_root))
        .unwrap_or_else(|| base.to_path_buf());
    settings.workdir = Some(if workdir.is_absolute() {
        workdir
    } else {
        base.join(workdir)
    });

    let config = PipelineConfig::from_settings(settings)?.with_services(only)?;

    Ok(LoadedConfig {
        config,
        source_file,
    })
}
