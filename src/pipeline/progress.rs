// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for a sync run
// reference: uses indicatif for the read spinner and tracks run metrics

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const TICK_EVERY_ROWS: u64 = 1_000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub rows_read: u64,
    pub documents_built: usize,
    pub documents_submitted: usize,
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub duration_secs: f64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_per_second(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        self.rows_read as f64 / self.duration_secs
    }

    /// Share of submitted documents the store confirmed, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.documents_submitted == 0 {
            return 0.0;
        }
        (self.documents_indexed as f64 / self.documents_submitted as f64) * 100.0
    }
}

/// Spinner and counters for the read stage.
pub struct ProgressTracker {
    bar: ProgressBar,
    rows_read: AtomicU64,
    documents_built: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            create_spinner()
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            rows_read: AtomicU64::new(0),
            documents_built: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn inc_rows_read(&self) {
        let rows = self.rows_read.fetch_add(1, Ordering::SeqCst) + 1;
        if rows % TICK_EVERY_ROWS == 0 {
            self.bar.set_message(format!("Read {} rows", rows));
        }
    }

    pub fn add_document(&self) {
        self.documents_built.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            rows_read: self.rows_read.load(Ordering::SeqCst),
            documents_built: self.documents_built.load(Ordering::SeqCst),
            duration_secs: self.elapsed().as_secs_f64(),
            ..RunStats::default()
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
