use crate::pipeline::Stage;
use indicatif::{ProgressBar, ProgressStyle};

/// ステージ実行中のスピナー
pub struct StageProgress {
    progress_bar: ProgressBar,
}

impl StageProgress {
    pub fn new(stage: Stage, visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("{}...", stage.title()));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        Self { progress_bar: pb }
    }

    pub fn finish_success(&self) {
        self.progress_bar.finish_and_clear();
    }

    pub fn finish_error(&self) {
        self.progress_bar.abandon();
    }
}
