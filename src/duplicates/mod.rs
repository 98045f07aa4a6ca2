//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Candidate shortlisting by extension and size
//! - Parallel content hashing of candidates
//! - The digest-keyed duplicate index and its aggregate statistics
//! - Orchestration of the whole pipeline

pub mod finder;
pub mod index;
pub mod scheduler;
pub mod shortlist;

pub use finder::{default_parallelism, DuplicateFinder, FinderConfig, FinderError, RunResult};
pub use index::{Aggregate, Digest, DuplicateGroup, DuplicateGroups, DuplicateIndex};
pub use scheduler::{
    shard_ranges, HashScheduler, Schedule, ScheduleKind, ScheduleStats, SchedulerError,
    StaticShards, WorkStealing,
};
pub use shortlist::{build_shortlist, CandidateKey, Shortlist};
