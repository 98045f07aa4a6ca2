//! Internal logging through the `log` facade and `env_logger`.
//!
//! Status lines for the user ("Scanning 2 directories...") go through
//! [`crate::diagnostics`]. The logger here carries tracing for the person
//! debugging a run and writes to stderr.
//!
//! Level selection:
//!
//! - `RUST_LOG` set: parsed as-is, flags are ignored
//! - `--quiet`: errors only
//! - `-v` / `-vv`: debug / trace for `dupescan`; dependencies stay at warn
//! - otherwise: info for `dupescan`, warn for dependencies
//!
//! In verbose mode each line carries the thread name, so output from the hash
//! workers (`dupescan-hash-N`) can be told apart. Release builds drop the
//! timestamp.
//!
//! ```rust,no_run
//! use dupescan::logging::init_logging;
//!
//! init_logging(2, false);
//! log::trace!("walking /data");
//! ```

use std::env;
use std::io::Write;

use env_logger::fmt::Formatter;
use env_logger::Builder;
use log::LevelFilter;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Level applied to other crates unless `RUST_LOG` says otherwise.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

/// Install the global logger for the given CLI flags.
///
/// Only the first call in a process installs anything; later calls are
/// ignored so tests and embedders can call it freely.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let from_env = env::var("RUST_LOG").ok();

    match from_env {
        Some(ref filters) => {
            builder.parse_filters(filters);
        }
        None => {
            let level = crate_level(verbose, quiet);
            builder
                .filter_level(DEPENDENCY_LEVEL.min(level))
                .filter_module(CRATE_TARGET, level);
        }
    }
    builder.format(line_format(verbose > 0));

    if builder.try_init().is_err() {
        return;
    }
    match from_env {
        Some(filters) => log::debug!("Log filters from RUST_LOG: {}", filters),
        None => log::debug!("Log level {}", crate_level(verbose, quiet)),
    }
}

/// Level for this crate's own targets.
fn crate_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn line_format(
    with_thread: bool,
) -> impl Fn(&mut Formatter, &log::Record<'_>) -> std::io::Result<()> + Send + Sync + 'static {
    move |buf: &mut Formatter, record: &log::Record<'_>| {
        let style = buf.default_level_style(record.level());

        #[cfg(debug_assertions)]
        write!(buf, "{} ", buf.timestamp_millis())?;

        write!(buf, "{style}{:<5}{style:#} ", record.level())?;
        if with_thread {
            let thread = std::thread::current();
            write!(
                buf,
                "[{}] ({}) ",
                record.target(),
                thread.name().unwrap_or("-")
            )?;
        }
        writeln!(buf, "{}", record.args())
    }
}
