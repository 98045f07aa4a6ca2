//! Progress reporting for the hashing phase.
//!
//! The scheduler polls its shared group counter and forwards the value to a
//! [`ProgressCallback`]. Two reporters are provided:
//!
//! - [`LineProgress`] prints `"NN% processed so far"` lines through the
//!   diagnostics sink, suitable for logs and non-interactive terminals
//! - [`Progress`] draws an indicatif progress bar

use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;

/// Name of the hashing phase reported to callbacks.
pub const PHASE_HASHING: &str = "hashing";

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "hashing")
    /// * `total` - Total number of units to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called with the number of units completed so far.
    ///
    /// Called from the progress task, not from the workers.
    fn on_progress(&self, done: usize, total: usize);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// How hashing progress is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// `"NN% processed so far"` lines
    #[default]
    Lines,
    /// An indicatif progress bar
    Bar,
    /// Nothing
    #[serde(rename = "none")]
    #[value(name = "none")]
    Off,
}

impl ProgressMode {
    /// Build the callback for this mode.
    #[must_use]
    pub fn into_callback(
        self,
        diagnostics: Arc<dyn Diagnostics>,
        quiet: bool,
    ) -> Arc<dyn ProgressCallback> {
        match self {
            Self::Lines => Arc::new(LineProgress::new(diagnostics)),
            Self::Bar => Arc::new(Progress::new(quiet)),
            Self::Off => Arc::new(NoProgress),
        }
    }
}

/// Percentage of `done` over `total`, 100 when there is nothing to do.
#[must_use]
pub fn percent_complete(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (done.min(total) as f64 / total as f64) * 100.0
    }
}

/// Prints percentage lines through a diagnostics sink.
pub struct LineProgress {
    diagnostics: Arc<dyn Diagnostics>,
}

impl LineProgress {
    /// Create a line reporter writing to `diagnostics`.
    #[must_use]
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { diagnostics }
    }
}

impl ProgressCallback for LineProgress {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, done: usize, total: usize) {
        self.diagnostics.info(&format!(
            "{:>2.0}% processed so far",
            percent_complete(done, total)
        ));
    }

    fn on_phase_end(&self, _phase: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupescan::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message(phase.to_string());
        *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn on_progress(&self, done: usize, _total: usize) {
        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(|e| e.into_inner()) {
            pb.set_position(done as u64);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if let Some(pb) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pb.finish_with_message(format!("{phase} complete"));
        }
    }
}

/// Discards all progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _done: usize, _total: usize) {}
    fn on_phase_end(&self, _phase: &str) {}
}
