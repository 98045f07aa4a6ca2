//! Command-line interface definitions for dupescan.
//!
//! Flags that mirror a [`Settings`](crate::config::Settings) field are
//! optional so that an absent flag leaves the config file or environment
//! value in place.
//!
//! # Example
//!
//! ```bash
//! # Scan two trees, write duplicates_<runid>.txt in the current directory
//! dupescan ~/Photos /mnt/backup/Photos
//!
//! # Full SHA-256 hashing, 1 MiB minimum, CSV report
//! dupescan -t -m 1024 -o csv ~/Downloads
//!
//! # Print the report instead of writing a file
//! dupescan -o print ~/Downloads
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::duplicates::ScheduleKind;
use crate::output::OutputMode;
use crate::progress::ProgressMode;

/// Find duplicate files by content across directory trees.
///
/// Files are first grouped by extension and size, and only files that share
/// both are hashed. The default mode samples large files; `--thorough` hashes
/// every byte with SHA-256.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan
    #[arg(value_name = "DIR", required = true)]
    pub directories: Vec<PathBuf>,

    /// File of newline-separated file or directory names to skip
    ///
    /// When absent a built-in list (.git, node_modules, .DS_Store, ...) is used.
    #[arg(short = 'x', long, value_name = "FILE")]
    pub exclusions: Option<PathBuf>,

    /// Minimum file size in KiB [default: 4]
    #[arg(short = 'm', long = "minsize", value_name = "KIB")]
    pub min_size_kib: Option<u64>,

    /// Number of hashing workers, 0 for one less than the number of cores
    #[arg(short, long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Hash whole files with SHA-256 instead of sampling
    #[arg(short, long)]
    pub thorough: bool,

    /// Report mode [default: text]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputMode>,

    /// How candidate groups are spread over workers [default: static]
    #[arg(long, value_enum)]
    pub schedule: Option<ScheduleKind>,

    /// Stop at the first directory that cannot be walked
    #[arg(long)]
    pub abort_on_root_failure: bool,

    /// Directory report files are written to [default: .]
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// How hashing progress is shown [default: lines]
    #[arg(long, value_enum)]
    pub progress: Option<ProgressMode>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}
