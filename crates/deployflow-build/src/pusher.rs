//! レジストリへのイメージプッシュ

use crate::error::{BuildError, BuildResult, command_message};
use deployflow_container::{CommandRunner, Invocation};
use deployflow_core::{ImageRef, validate_tag};

pub struct ImagePusher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> ImagePusher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn push_invocation(&self, image: &ImageRef) -> Invocation {
        Invocation::new("docker").arg("push").arg(image.to_string())
    }

    /// イメージをプッシュ
    ///
    /// 事前の `docker login` によるセッションを前提とする。
    pub async fn push(&self, image: &ImageRef) -> BuildResult<()> {
        validate_tag(image.tag()).map_err(|_| BuildError::InvalidTag {
            tag: image.tag().to_string(),
        })?;

        tracing::info!("Pushing image: {}", image);

        self.runner
            .run(&self.push_invocation(image))
            .await
            .map_err(|e| match command_message(&e) {
                Some(message) => BuildError::PushFailed {
                    image: image.to_string(),
                    message,
                },
                None => BuildError::Command(e),
            })?;

        tracing::info!("Successfully pushed: {}", image);
        Ok(())
    }
}
