//! deployflow のコア機能
//!
//! パイプライン設定のモデル、`deployflow.kdl` のパース、
//! 設定ファイルの発見、compose マニフェストの書き換えを提供します。

pub mod discovery;
pub mod error;
pub mod manifest;
pub mod model;
pub mod parser;

pub use discovery::{PIPELINE_DIR, PIPELINE_FILE_CANDIDATES, find_pipeline_file, project_root};
pub use error::{FlowError, Result};
pub use manifest::{ComposeManifest, RewriteOutcome, RewriteReport, ServiceRewrite, rewrite_manifest};
pub use model::*;
pub use parser::{parse_pipeline_file, parse_pipeline_string};
