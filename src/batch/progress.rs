//! Progress reporting for batch runs
//!
//! Observers are notified from the dispatching thread only, once per
//! completed item, in completion order.

use log::{info, warn};

use super::RunResult;

/// Snapshot sent after each finished item
#[derive(Debug, Clone)]
pub struct ProgressInfo<'a> {
    /// Items finished so far, this one included
    pub done: usize,
    pub total: usize,
    /// Label of the item that just finished
    pub current: &'a str,
    pub succeeded: bool,
    /// Counters including this item
    pub result: RunResult,
}

impl ProgressInfo<'_> {
    /// Completion in percent (0.0 - 100.0)
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f32 / self.total as f32 * 100.0).clamp(0.0, 100.0)
    }
}

pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _total: usize) {}

    fn on_progress_update(&self, progress: &ProgressInfo<'_>);

    fn on_finish(&self, _result: &RunResult) {}
}

/// Writes one log line per finished item
pub struct LogObserver {
    task: String,
}

impl LogObserver {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

impl ProgressObserver for LogObserver {
    fn on_start(&self, total: usize) {
        info!("{}: processing {} files", self.task, total);
    }

    fn on_progress_update(&self, progress: &ProgressInfo<'_>) {
        if progress.succeeded {
            info!(
                "{} [{}/{}] {:.0}% {}",
                self.task,
                progress.done,
                progress.total,
                progress.percent(),
                progress.current
            );
        } else {
            warn!(
                "{} [{}/{}] {:.0}% failed: {}",
                self.task,
                progress.done,
                progress.total,
                progress.percent(),
                progress.current
            );
        }
    }

    fn on_finish(&self, result: &RunResult) {
        info!(
            "{}: done, {} succeeded, {} failed",
            self.task, result.succeeded, result.failed
        );
    }
}

/// Discards all notifications
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_progress_update(&self, _progress: &ProgressInfo<'_>) {}
}
