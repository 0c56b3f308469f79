//! Progress tracking for export operations
//!
//! A spinner on stderr with the running record count and throughput. Only
//! shown for file output modes, since stdout carries the exported data.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressTracker {
    start_time: Instant,
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `limit` - Record limit if one is set, shown as the bar length
    /// * `enable_bar` - Whether to display anything
    pub fn new(limit: Option<u64>, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| match limit {
            Some(n) => {
                let bar = ProgressBar::new(n);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} {pos} records {msg}")
                {
                    bar.set_style(style);
                }
                bar
            }
        });

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Disabled tracker
    pub fn hidden() -> Self {
        Self::new(None, false)
    }

    /// Update progress with the total number of records emitted so far
    pub fn update(&self, count: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_position(count);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                bar.set_message(format!("({:.0} records/sec)", count as f64 / elapsed));
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
