use crate::error::{BuildError, BuildResult, command_message};
use deployflow_container::{CommandRunner, Invocation};
use deployflow_core::ImageRef;
use std::path::Path;

/// `docker build` に渡すオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// キャッシュを使用しない
    pub no_cache: bool,
    /// ベースイメージを常に pull
    pub pull: bool,
    /// ビルド前にコンテキストディレクトリの存在を確認する
    pub check_context: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            no_cache: false,
            pull: false,
            check_context: true,
        }
    }
}

pub struct ImageBuilder<'a> {
    runner: &'a dyn CommandRunner,
    options: BuildOptions,
}

impl<'a> ImageBuilder<'a> {
    pub fn new(runner: &'a dyn CommandRunner, options: BuildOptions) -> Self {
        Self { runner, options }
    }

    pub fn build_invocation(&self, image: &ImageRef, context: &Path) -> Invocation {
        let mut invocation = Invocation::new("docker")
            .arg("build")
            .args(["-t", image.to_string().as_str()]);

        if self.options.no_cache {
            invocation = invocation.arg("--no-cache");
        }
        if self.options.pull {
            invocation = invocation.arg("--pull");
        }

        invocation.path_arg(context)
    }

    /// イメージをビルド
    pub async fn build(&self, image: &ImageRef, context: &Path) -> BuildResult<()> {
        if self.options.check_context && !context.is_dir() {
            return Err(BuildError::ContextNotFound(context.to_path_buf()));
        }

        tracing::info!("Building image: {}", image);

        self.runner
            .run(&self.build_invocation(image, context))
            .await
            .map_err(|e| match command_message(&e) {
                Some(message) => BuildError::BuildFailed {
                    service: image.service().to_string(),
                    message,
                },
                None => BuildError::Command(e),
            })?;

        tracing::info!("Successfully built: {}", image);
        Ok(())
    }
}
