//! モデル定義
//!
//! パイプライン実行で使用される設定値を定義します。
//! どれも1回の実行の間だけ生存し、永続化はされません。

mod credentials;
mod image;
mod pipeline;
mod service;

// Re-exports
pub use credentials::*;
pub use image::*;
pub use pipeline::*;
pub use service::*;
