//! 実行結果のレポート

use crate::pipeline::{PipelineError, Stage};
use chrono::{DateTime, Local};
use colored::Colorize;
use std::time::Duration;

/// ステージの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Succeeded,
    Failed,
    /// 実行しなかった（理由付き）
    Skipped(String),
    /// 失敗したが結果には影響しない（ログアウト）
    Warned(String),
}

#[derive(Debug, Clone)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

/// 1回の実行のレポート
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub records: Vec<StageRecord>,
    pub failure: Option<PipelineError>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            records: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn status_of(&self, stage: Stage) -> Option<&StageStatus> {
        self.records
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.status)
    }

    pub(crate) fn succeeded(&mut self, stage: Stage, elapsed: Duration, detail: Option<String>) {
        self.records.push(StageRecord {
            stage,
            status: StageStatus::Succeeded,
            elapsed,
            detail,
        });
    }

    pub(crate) fn failed(&mut self, stage: Stage, elapsed: Duration, error: PipelineError) {
        self.records.push(StageRecord {
            stage,
            status: StageStatus::Failed,
            elapsed,
            detail: None,
        });
        self.failure = Some(error);
    }

    pub(crate) fn skipped(&mut self, stage: Stage, reason: impl Into<String>) {
        self.records.push(StageRecord {
            stage,
            status: StageStatus::Skipped(reason.into()),
            elapsed: Duration::ZERO,
            detail: None,
        });
    }

    pub(crate) fn warned(&mut self, stage: Stage, elapsed: Duration, message: impl Into<String>) {
        self.records.push(StageRecord {
            stage,
            status: StageStatus::Warned(message.into()),
            elapsed,
            detail: None,
        });
    }

    /// サマリーを表示
    pub fn print_summary(&self) {
        println!();
        println!(
            "{}",
            format!(
                "実行結果 (開始: {})",
                self.started_at.format("%Y-%m-%d %H:%M:%S")
            )
            .bold()
        );

        for record in &self.records {
            let elapsed = format!("{:.1}s", record.elapsed.as_secs_f64());
            match &record.status {
                StageStatus::Succeeded => {
                    let detail = record
                        .detail
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default();
                    println!(
                        "  {} {:<8} {}{}",
                        "✓".green(),
                        record.stage.label(),
                        elapsed.dimmed(),
                        detail
                    );
                }
                StageStatus::Failed => {
                    println!(
                        "  {} {:<8} {}",
                        "✗".red().bold(),
                        record.stage.label(),
                        elapsed.dimmed()
                    );
                }
                StageStatus::Skipped(reason) => {
                    println!(
                        "  {} {:<8} {}",
                        "-".dimmed(),
                        record.stage.label(),
                        format!("スキップ: {}", reason).dimmed()
                    );
                }
                StageStatus::Warned(message) => {
                    println!(
                        "  {} {:<8} {}",
                        "⚠".yellow(),
                        record.stage.label(),
                        message.yellow()
                    );
                }
            }
        }
    }
}
