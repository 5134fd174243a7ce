// file: src/pipeline/progress.rs
// description: progress bars and job statistics for a migration run
// reference: uses indicatif for progress bars and tracks job outcomes

use crate::models::JobOutcome;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub succeeded: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

impl RunStats {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn repositories_per_minute(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.attempted() as f64 * 60.0 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.attempted();
        if total == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_jobs: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        let main_bar = multi_progress.add(ProgressBar::new(total_jobs as u64));
        main_bar.set_style(main_style(colored));
        let detail_bar = multi_progress.add(ProgressBar::new(0));
        detail_bar.set_style(detail_style());

        Self::from_bars(main_bar, detail_bar)
    }

    /// Same bookkeeping, nothing drawn.
    pub fn hidden(total_jobs: usize) -> Self {
        let main_bar = ProgressBar::hidden();
        main_bar.set_length(total_jobs as u64);
        Self::from_bars(main_bar, ProgressBar::hidden())
    }

    fn from_bars(main_bar: ProgressBar, detail_bar: ProgressBar) -> Self {
        Self {
            main_bar,
            detail_bar,
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, outcome: &JobOutcome) {
        if outcome.is_success() {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Migration complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let succeeded = self.succeeded.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        self.detail_bar
            .set_message(format!("Uploaded: {} | Failed: {}", succeeded, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.main_bar.is_finished() {
            self.finish();
        }
    }
}

fn main_style(colored: bool) -> ProgressStyle {
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}

fn detail_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
