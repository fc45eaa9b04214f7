//! Batch progress reporting.
//!
//! The scheduler notifies a [`ProgressSink`] after every batch; the sink
//! decides how (or whether) to show it.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// State after one batch has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based index of the batch that just completed.
    pub batch_index: usize,
    pub batch_count: usize,
    /// Repositories fetched so far.
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// Receives progress events from the batch scheduler.
pub trait ProgressSink: Send + Sync {
    fn on_batch(&self, progress: BatchProgress);

    fn on_finish(&self, _total: usize) {}
}

/// How progress is shown on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProgressMode {
    /// Redrawn progress bar (default)
    #[default]
    Bar,
    /// One log line per batch
    Log,
    /// Nothing
    None,
}

/// Build the sink for a progress mode.
pub fn sink_for(mode: ProgressMode, total: usize) -> Box<dyn ProgressSink> {
    match mode {
        ProgressMode::Bar => Box::new(BarProgress::new(total)),
        ProgressMode::Log => Box::new(LogProgress),
        ProgressMode::None => Box::new(NoProgress),
    }
}

/// Progress bar on stderr.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:50.cyan/blue}] {percent}%  -  # {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_batch(&self, progress: BatchProgress) {
        self.bar.set_position(progress.completed as u64);
        self.bar.set_message(format!(
            "(batch {}/{})",
            progress.batch_index + 1,
            progress.batch_count
        ));
    }

    fn on_finish(&self, _total: usize) {
        self.bar.finish_with_message("done");
    }
}

/// Logs a line per batch through `tracing`.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_batch(&self, progress: BatchProgress) {
        info!(
            "Batch {}/{} done: {}/{} repositories ({}%)",
            progress.batch_index + 1,
            progress.batch_count,
            progress.completed,
            progress.total,
            progress.percent()
        );
    }

    fn on_finish(&self, total: usize) {
        info!("Fetched metadata for {} repositories", total);
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_batch(&self, _progress: BatchProgress) {}
}
