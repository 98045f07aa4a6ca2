//! User-facing status and error sink.
//!
//! # Overview
//!
//! The pipeline reports progress lines ("Scanning 2 directories...") and
//! per-file failures through a [`Diagnostics`] implementation rather than
//! writing to the terminal directly. This keeps the library embeddable:
//! the CLI uses [`ConsoleDiagnostics`], tests use [`MemoryDiagnostics`], and
//! callers that want silence use [`NullDiagnostics`].
//!
//! Every line is also forwarded to the `log` facade at debug level.
//!
//! # Example
//!
//! ```
//! use dupescan::diagnostics::{Diagnostics, MemoryDiagnostics};
//!
//! let sink = MemoryDiagnostics::new();
//! sink.info("Scan completed.");
//! assert_eq!(sink.infos(), vec!["Scan completed.".to_string()]);
//! ```

use std::io::Write;
use std::sync::Mutex;

use yansi::Paint;

/// Sink for informational and error lines. Safe to call from any thread.
pub trait Diagnostics: Send + Sync {
    /// Report a status line.
    fn info(&self, message: &str);

    /// Report a non-fatal error.
    fn error(&self, message: &str);
}

/// Writes info lines to stdout and error lines to stderr.
///
/// Lines from concurrent workers never interleave.
#[derive(Debug, Default)]
pub struct ConsoleDiagnostics {
    lock: Mutex<()>,
    quiet: bool,
}

impl ConsoleDiagnostics {
    /// Create a console sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress info lines. Errors are still printed.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl Diagnostics for ConsoleDiagnostics {
    fn info(&self, message: &str) {
        log::debug!("{}", message);
        if self.quiet {
            return;
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(std::io::stdout().lock(), "{}", message);
    }

    fn error(&self, message: &str) {
        log::debug!("error: {}", message);
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(std::io::stderr().lock(), "{}", message.red());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn info(&self, message: &str) {
        log::trace!("{}", message);
    }

    fn error(&self, message: &str) {
        log::trace!("error: {}", message);
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MemoryDiagnostics {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Info lines received so far, in order.
    #[must_use]
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Error lines received so far, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn info(&self, message: &str) {
        log::debug!("{}", message);
        self.infos
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }

    fn error(&self, message: &str) {
        log::debug!("error: {}", message);
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}
