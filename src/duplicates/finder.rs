//! Duplicate finder orchestrating the full pipeline.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs the phases in order:
//!
//! 1. **Scan** - walk every root into one [`PathIndex`] (sequential)
//! 2. **Shortlist** - group by extension and size, drop singletons
//! 3. **Hash** - digest every candidate in parallel (see
//!    [`crate::duplicates::scheduler`])
//! 4. **Filter** - freeze the index and keep groups with 2+ paths
//!
//! Status lines go through the configured [`Diagnostics`] sink. The finder
//! never writes files and never formats sizes for humans.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use dupescan::scanner::ScanConfig;
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_scan_config(ScanConfig::default().with_min_size(4096))
//!     .with_parallelism(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let result = finder.find_duplicates(&[PathBuf::from("/some/path")]).unwrap();
//! println!("{} duplicates, {} bytes reclaimable",
//!     result.duplicate_count(), result.reclaimable_bytes());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::scheduler::{
    HashScheduler, Schedule, ScheduleStats, SchedulerError, StaticShards,
    DEFAULT_PROGRESS_INITIAL_DELAY, DEFAULT_PROGRESS_INTERVAL,
};
use super::{build_shortlist, Aggregate, DuplicateGroups, DuplicateIndex};
use crate::diagnostics::{Diagnostics, NullDiagnostics};
use crate::progress::{LineProgress, ProgressCallback};
use crate::scanner::{scan_roots, DigestStrategy, PathIndex, RootFailurePolicy, ScanConfig, ScanError};

/// Worker count used when none is configured: one less than the number of
/// logical CPUs, at least 1.
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .saturating_sub(1)
        .max(1)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Exclusions and minimum size for the walk
    pub scan: ScanConfig,
    /// Number of hash workers (at least 1)
    pub parallelism: usize,
    /// Sampled or full-content digests
    pub strategy: DigestStrategy,
    /// How candidate groups are spread over workers
    pub schedule: Arc<dyn Schedule>,
    /// What to do when a root cannot be walked
    pub root_failure: RootFailurePolicy,
    /// Sink for status lines and per-file errors
    pub diagnostics: Arc<dyn Diagnostics>,
    /// Optional progress callback. Defaults to percentage lines on
    /// `diagnostics`.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Delay before the first progress report
    pub progress_initial_delay: Duration,
    /// Interval between progress reports
    pub progress_interval: Duration,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("scan", &self.scan)
            .field("parallelism", &self.parallelism)
            .field("strategy", &self.strategy)
            .field("schedule", &self.schedule.name())
            .field("root_failure", &self.root_failure)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress_initial_delay", &self.progress_initial_delay)
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            parallelism: default_parallelism(),
            strategy: DigestStrategy::default(),
            schedule: Arc::new(StaticShards),
            root_failure: RootFailurePolicy::default(),
            diagnostics: Arc::new(NullDiagnostics),
            progress_callback: None,
            shutdown_flag: None,
            progress_initial_delay: DEFAULT_PROGRESS_INITIAL_DELAY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl FinderConfig {
    /// Set the walk filters.
    #[must_use]
    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Set the number of hash workers.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the digest strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: DigestStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the work distribution schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Arc<dyn Schedule>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the root failure policy.
    #[must_use]
    pub fn with_root_failure(mut self, policy: RootFailurePolicy) -> Self {
        self.root_failure = policy;
        self
    }

    /// Set the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress timing.
    #[must_use]
    pub fn with_progress_timing(mut self, initial_delay: Duration, interval: Duration) -> Self {
        self.progress_initial_delay = initial_delay;
        self.progress_interval = interval;
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A root could not be scanned and the policy is to abort.
    #[error("error while scanning directory {}: {source}", .source.path().display())]
    Scan {
        /// The root failure
        #[from]
        source: ScanError,
    },

    /// Every root failed under the continue policy.
    #[error("all {count} input directories failed to scan")]
    AllRootsFailed {
        /// Number of roots
        count: usize,
    },

    /// The hash workers could not be started.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Outcome of one duplicate search.
#[derive(Debug)]
pub struct RunResult {
    duplicates: DuplicateGroups,
    aggregate: Aggregate,
    files: PathIndex,
    scanned_bytes: u64,
    root_errors: Vec<ScanError>,
    stats: ScheduleStats,
    duration: Duration,
}

impl RunResult {
    fn without_duplicates(
        files: PathIndex,
        scanned_bytes: u64,
        root_errors: Vec<ScanError>,
        started: Instant,
    ) -> Self {
        Self {
            duplicates: DuplicateGroups::default(),
            aggregate: Aggregate::default(),
            files,
            scanned_bytes,
            root_errors,
            stats: ScheduleStats::default(),
            duration: started.elapsed(),
        }
    }

    /// Confirmed duplicate groups.
    #[must_use]
    pub fn duplicates(&self) -> &DuplicateGroups {
        &self.duplicates
    }

    /// Σ (group size − 1) over all groups.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.aggregate.duplicate_count
    }

    /// Σ (group size − 1) × file size over all groups.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.aggregate.reclaimable_bytes
    }

    /// Aggregate statistics over the groups.
    #[must_use]
    pub fn aggregate(&self) -> Aggregate {
        self.aggregate
    }

    /// Every scanned file with its metadata.
    #[must_use]
    pub fn files(&self) -> &PathIndex {
        &self.files
    }

    /// Number of scanned files.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Total bytes of scanned files.
    #[must_use]
    pub fn scanned_bytes(&self) -> u64 {
        self.scanned_bytes
    }

    /// Roots that were skipped because they could not be walked.
    #[must_use]
    pub fn root_errors(&self) -> &[ScanError] {
        &self.root_errors
    }

    /// Hashing phase statistics.
    #[must_use]
    pub fn stats(&self) -> ScheduleStats {
        self.stats
    }

    /// Number of candidates skipped because their digest failed.
    #[must_use]
    pub fn digest_failures(&self) -> usize {
        self.stats.files_failed
    }

    /// Wall time of the whole run.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Check if no file survived the scan filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if at least one duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Duplicate finder that orchestrates the scan, shortlist and hash phases.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `roots`.
    ///
    /// An empty result (nothing scanned, or nothing duplicated) is a
    /// successful outcome.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - A root fails and the policy is [`RootFailurePolicy::Abort`]
    /// - Every root fails under [`RootFailurePolicy::Continue`]
    /// - The hash worker pool cannot be built
    /// - The run is interrupted by the shutdown flag
    pub fn find_duplicates(&self, roots: &[PathBuf]) -> Result<RunResult, FinderError> {
        let started = Instant::now();
        let config = &self.config;
        let diagnostics = config.diagnostics.as_ref();

        diagnostics.info(&format!("Scanning {} directories...", roots.len()));
        let outcome = scan_roots(
            roots,
            &config.scan,
            config.root_failure,
            diagnostics,
            config.shutdown_flag.as_ref(),
        )?;

        if config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        if !roots.is_empty() && outcome.root_errors.len() == roots.len() {
            return Err(FinderError::AllRootsFailed { count: roots.len() });
        }

        diagnostics.info(&format!(
            "Done. Found {} files of total size {} bytes.",
            outcome.index.len(),
            outcome.scanned_bytes
        ));
        log::debug!(
            "Scanned {} roots: {} files, {} bytes, {} root failures",
            roots.len(),
            outcome.index.len(),
            outcome.scanned_bytes,
            outcome.root_errors.len()
        );

        if outcome.index.is_empty() {
            return Ok(RunResult::without_duplicates(
                outcome.index,
                outcome.scanned_bytes,
                outcome.root_errors,
                started,
            ));
        }

        diagnostics.info("Finding potential duplicates...");
        let shortlist = build_shortlist(&outcome.index);
        if shortlist.is_empty() {
            return Ok(RunResult::without_duplicates(
                outcome.index,
                outcome.scanned_bytes,
                outcome.root_errors,
                started,
            ));
        }
        diagnostics.info(&format!(
            "Completed. Found {} files that may have one or more duplicates!",
            shortlist.candidate_count()
        ));

        diagnostics.info(match config.strategy {
            DigestStrategy::Full => "Thoroughly scanning for duplicates...",
            DigestStrategy::Sampled => "Scanning for duplicates...",
        });

        let progress = config.progress_callback.clone().unwrap_or_else(|| {
            Arc::new(LineProgress::new(Arc::clone(&config.diagnostics))) as Arc<dyn ProgressCallback>
        });
        let mut scheduler = HashScheduler::new(config.strategy, config.parallelism)
            .with_schedule(Arc::clone(&config.schedule))
            .with_diagnostics(Arc::clone(&config.diagnostics))
            .with_progress_callback(progress)
            .with_progress_timing(config.progress_initial_delay, config.progress_interval);
        if let Some(ref flag) = config.shutdown_flag {
            scheduler = scheduler.with_shutdown_flag(Arc::clone(flag));
        }

        let index = DuplicateIndex::new();
        let stats = scheduler.run(&shortlist, &index)?;
        if stats.interrupted || config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let duplicates = index.filter_to_duplicates_only();
        let aggregate = duplicates.aggregate();
        diagnostics.info("Scan completed.");

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable bytes",
            aggregate.group_count,
            aggregate.duplicate_count,
            aggregate.reclaimable_bytes
        );

        Ok(RunResult {
            duplicates,
            aggregate,
            files: outcome.index,
            scanned_bytes: outcome.scanned_bytes,
            root_errors: outcome.root_errors,
            stats,
            duration: started.elapsed(),
        })
    }
}
