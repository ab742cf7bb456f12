//! deployflow の Docker イメージビルド機能
//!
//! レジストリへのログイン／ログアウト、サービスごとのイメージビルド、
//! レジストリへのプッシュ、それらを並列に流すワーカープールを提供します。

pub mod auth;
pub mod builder;
pub mod error;
pub mod pool;
pub mod pusher;

pub use auth::{RegistryAuth, extract_registry};
pub use builder::{BuildOptions, ImageBuilder};
pub use error::{BuildError, BuildResult};
pub use pool::{PoolReport, WorkerPool};
pub use pusher::ImagePusher;
