//! パイプラインファイルの発見

use crate::error::{FlowError, Result};
use std::path::{Path, PathBuf};

/// 検索するファイル名（優先順）
pub const PIPELINE_FILE_CANDIDATES: [&str; 2] = ["deployflow.local.kdl", "deployflow.kdl"];

/// 設定ファイル用の隠しディレクトリ名
pub const PIPELINE_DIR: &str = ".deployflow";

/// パイプラインファイルが属するプロジェクトのルート
///
/// `.deployflow/` 内のファイルはその親ディレクトリがルートになる。
pub fn project_root(pipeline_file: &Path) -> PathBuf {
    let parent = match pipeline_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return PathBuf::from("."),
    };

    if parent.file_name().is_some_and(|name| name == PIPELINE_DIR) {
        match parent.parent() {
            Some(root) if !root.as_os_str().is_empty() => root.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        parent.to_path_buf()
    }
}

/// パイプラインファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 明示的な指定（--config / DEPLOYFLOW_CONFIG）。存在しなければエラー
/// 2. 基準ディレクトリ: deployflow.local.kdl, deployflow.kdl
/// 3. 基準ディレクトリの .deployflow/ 内: 同様の順序
///
/// どれも見つからない場合は `Ok(None)`（既定値と CLI 引数だけで実行する）。
pub fn find_pipeline_file(explicit: Option<&Path>, base: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(FlowError::PipelineFileNotFound(path.to_path_buf()));
    }

    for dir in [base.to_path_buf(), base.join(PIPELINE_DIR)] {
        for filename in PIPELINE_FILE_CANDIDATES {
            let path = dir.join(filename);
            if path.is_file() {
                tracing::debug!("Found pipeline file: {}", path.display());
                return Ok(Some(path));
            }
        }
    }

    tracing::debug!("No pipeline file under {}", base.display());
    Ok(None)
}
