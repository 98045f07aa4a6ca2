//! Parallel hash scheduling.
//!
//! # Overview
//!
//! [`HashScheduler`] takes the [`Shortlist`], hashes every candidate with
//! [`compute_digest`] and feeds the results into a [`DuplicateIndex`]. The
//! way groups are distributed over workers is a [`Schedule`]:
//!
//! - [`StaticShards`] (default): the ordered group list is cut into P
//!   contiguous shards, shard `i` owning `[i·n/P, (i+1)·n/P)`. Each shard is
//!   one task on a dedicated P-thread pool. Skewed group sizes can leave
//!   some workers idle; that is accepted.
//! - [`WorkStealing`]: rayon's parallel iterator over the same groups.
//!
//! A progress task runs alongside the workers. It waits for an initial
//! delay, then polls the shared group counter at a fixed interval and
//! forwards it to a [`ProgressCallback`] until all groups are done.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{build_shortlist, DuplicateIndex, HashScheduler};
//! use dupescan::scanner::{DigestStrategy, PathIndex};
//!
//! let files = PathIndex::new();
//! let shortlist = build_shortlist(&files);
//! let index = DuplicateIndex::new();
//!
//! let stats = HashScheduler::new(DigestStrategy::Sampled, 4)
//!     .run(&shortlist, &index)
//!     .unwrap();
//! println!("hashed {} files", stats.files_hashed);
//! ```

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{DuplicateIndex, Shortlist};
use crate::diagnostics::{Diagnostics, NullDiagnostics};
use crate::progress::{NoProgress, ProgressCallback, PHASE_HASHING};
use crate::scanner::{compute_digest, DigestStrategy};

/// Default delay before the first progress poll.
pub const DEFAULT_PROGRESS_INITIAL_DELAY: Duration = Duration::from_millis(200);

/// Default interval between progress polls.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Granularity at which the progress task notices completion.
const PROGRESS_POLL_SLICE: Duration = Duration::from_millis(20);

/// Errors that can occur while scheduling hash work.
#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    /// The worker pool could not be created.
    #[error("failed to build hash worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Strategy for distributing candidate groups over workers.
///
/// `work` must be called exactly once per group. Implementations return
/// only after every call has completed.
pub trait Schedule: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run `work` over every group using `parallelism` workers.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the workers cannot be started.
    fn run(
        &self,
        groups: &[&[PathBuf]],
        parallelism: usize,
        work: &(dyn Fn(&[PathBuf]) + Sync),
    ) -> Result<(), SchedulerError>;
}

/// Contiguous shard ranges for `n` items over `p` workers.
///
/// Shard `i` is `[i·n/p, (i+1)·n/p)`. The ranges are disjoint, cover
/// `0..n` in order, and differ in length by at most one. `p` is clamped
/// to at least 1.
#[must_use]
pub fn shard_ranges(n: usize, p: usize) -> Vec<Range<usize>> {
    let p = p.max(1);
    (0..p).map(|i| (i * n / p)..((i + 1) * n / p)).collect()
}

fn build_pool(parallelism: usize) -> Result<rayon::ThreadPool, SchedulerError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .thread_name(|i| format!("dupescan-hash-{i}"))
        .build()?;
    Ok(pool)
}

/// Static contiguous sharding, one task per shard.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticShards;

impl Schedule for StaticShards {
    fn name(&self) -> &'static str {
        "static"
    }

    fn run(
        &self,
        groups: &[&[PathBuf]],
        parallelism: usize,
        work: &(dyn Fn(&[PathBuf]) + Sync),
    ) -> Result<(), SchedulerError> {
        let pool = build_pool(parallelism)?;
        let ranges = shard_ranges(groups.len(), parallelism);

        pool.scope(|s| {
            for (shard, range) in ranges.into_iter().enumerate() {
                let slice = &groups[range];
                s.spawn(move |_| {
                    log::trace!("Shard {} starting with {} groups", shard, slice.len());
                    for group in slice {
                        work(group);
                    }
                });
            }
        });
        Ok(())
    }
}

/// Dynamic work-stealing over rayon's parallel iterator.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkStealing;

impl Schedule for WorkStealing {
    fn name(&self) -> &'static str {
        "work-stealing"
    }

    fn run(
        &self,
        groups: &[&[PathBuf]],
        parallelism: usize,
        work: &(dyn Fn(&[PathBuf]) + Sync),
    ) -> Result<(), SchedulerError> {
        let pool = build_pool(parallelism)?;
        pool.install(|| groups.par_iter().for_each(|group| work(group)));
        Ok(())
    }
}

/// Selectable schedule, as written in configuration files and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleKind {
    /// [`StaticShards`]
    #[default]
    Static,
    /// [`WorkStealing`]
    WorkStealing,
}

impl ScheduleKind {
    /// Instantiate the schedule.
    #[must_use]
    pub fn into_schedule(self) -> Arc<dyn Schedule> {
        match self {
            Self::Static => Arc::new(StaticShards),
            Self::WorkStealing => Arc::new(WorkStealing),
        }
    }
}

/// Statistics from the hashing phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Candidate groups handed to the schedule
    pub groups_total: usize,
    /// Groups fully processed
    pub groups_done: usize,
    /// Files digested successfully
    pub files_hashed: usize,
    /// Files skipped because their digest failed
    pub files_failed: usize,
    /// Whether the phase stopped early on a shutdown request
    pub interrupted: bool,
}

/// Hashes shortlisted candidates in parallel.
pub struct HashScheduler {
    strategy: DigestStrategy,
    parallelism: usize,
    schedule: Arc<dyn Schedule>,
    diagnostics: Arc<dyn Diagnostics>,
    progress: Arc<dyn ProgressCallback>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_initial_delay: Duration,
    progress_interval: Duration,
}

impl fmt::Debug for HashScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashScheduler")
            .field("strategy", &self.strategy)
            .field("parallelism", &self.parallelism)
            .field("schedule", &self.schedule.name())
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress_initial_delay", &self.progress_initial_delay)
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl HashScheduler {
    /// Create a scheduler with static sharding and no output.
    ///
    /// `parallelism` is clamped to at least 1.
    #[must_use]
    pub fn new(strategy: DigestStrategy, parallelism: usize) -> Self {
        Self {
            strategy,
            parallelism: parallelism.max(1),
            schedule: Arc::new(StaticShards),
            diagnostics: Arc::new(NullDiagnostics),
            progress: Arc::new(NoProgress),
            shutdown_flag: None,
            progress_initial_delay: DEFAULT_PROGRESS_INITIAL_DELAY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Set the distribution strategy.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Arc<dyn Schedule>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the sink for per-file digest failures.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Workers check it before each file; the progress task stops polling.
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash every candidate in `shortlist` into `index`.
    ///
    /// A file whose digest fails is reported and skipped. Returns after all
    /// workers and the progress task have finished.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the worker pool cannot be created.
    pub fn run(
        &self,
        shortlist: &Shortlist,
        index: &DuplicateIndex,
    ) -> Result<ScheduleStats, SchedulerError> {
        let groups: Vec<&[PathBuf]> = shortlist
            .groups_ordered()
            .into_iter()
            .map(|(_, paths)| paths)
            .collect();
        let total = groups.len();

        let groups_done = AtomicUsize::new(0);
        let files_hashed = AtomicUsize::new(0);
        let files_failed = AtomicUsize::new(0);
        let finished = AtomicBool::new(false);

        log::debug!(
            "Hashing {} groups with {} {} workers ({})",
            total,
            self.parallelism,
            self.schedule.name(),
            self.strategy.name()
        );
        self.progress.on_phase_start(PHASE_HASHING, total);

        let work = |group: &[PathBuf]| {
            for path in group {
                if self.is_shutdown_requested() {
                    return;
                }
                match compute_digest(path, self.strategy) {
                    Ok(digest) => {
                        index.insert(digest, path.clone());
                        files_hashed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        self.diagnostics.error(&format!(
                            "error while scanning {}: {}",
                            path.display(),
                            err
                        ));
                        files_failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            groups_done.fetch_add(1, Ordering::SeqCst);
        };

        let started = Instant::now();
        let result = std::thread::scope(|s| {
            s.spawn(|| self.report_progress(&groups_done, total, &finished));
            let result = self.schedule.run(&groups, self.parallelism, &work);
            finished.store(true, Ordering::SeqCst);
            result
        });
        result?;
        self.progress.on_phase_end(PHASE_HASHING);

        let stats = ScheduleStats {
            groups_total: total,
            groups_done: groups_done.load(Ordering::SeqCst),
            files_hashed: files_hashed.load(Ordering::Relaxed),
            files_failed: files_failed.load(Ordering::Relaxed),
            interrupted: self.is_shutdown_requested(),
        };
        log::debug!("Hashing finished in {:?}: {:?}", started.elapsed(), stats);
        Ok(stats)
    }

    /// Poll `done` until it reaches `total` or the workers have finished.
    ///
    /// Once polling has started, the last report is always taken after the
    /// workers are done, so a completed phase ends on 100%. Nothing is
    /// reported if the phase finishes within the initial delay or is
    /// interrupted.
    fn report_progress(&self, done: &AtomicUsize, total: usize, finished: &AtomicBool) {
        if !self.wait_unless_finished(self.progress_initial_delay, finished) {
            return;
        }
        while !self.is_shutdown_requested() {
            let running = self.wait_unless_finished(self.progress_interval, finished);
            if self.is_shutdown_requested() {
                return;
            }
            let current = done.load(Ordering::SeqCst);
            self.progress.on_progress(current, total);
            if !running || current >= total {
                return;
            }
        }
    }

    /// Sleep for `duration` in short slices. Returns `false` if the workers
    /// finished in the meantime.
    fn wait_unless_finished(&self, duration: Duration, finished: &AtomicBool) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if finished.load(Ordering::SeqCst) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(PROGRESS_POLL_SLICE.min(deadline - now));
        }
    }
}
