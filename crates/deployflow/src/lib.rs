//! deployflow パイプライン
//!
//! ソース取得 → ログイン → ビルド → プッシュ → マニフェスト書き換え → 再起動
//! を順に実行し、最後に必ずログアウトします。

pub mod pipeline;
pub mod progress;
pub mod report;
pub mod settings;

pub use pipeline::{Pipeline, PipelineError, PipelineOptions, Stage, StageError, StageSelection};
pub use report::{RunReport, StageRecord, StageStatus};
pub use settings::{LoadedConfig, load_config};
