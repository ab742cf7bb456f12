//! deployflow のコンテナ・外部コマンド連携
//!
//! すべての外部コマンド（git / docker / docker compose）は
//! [`CommandRunner`] を経由して実行されます。

pub mod compose;
pub mod error;
pub mod recording;
pub mod runner;
pub mod source;

pub use compose::StackRestarter;
pub use error::{ContainerError, Result};
pub use recording::RecordingRunner;
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
pub use source::SourceFetcher;
