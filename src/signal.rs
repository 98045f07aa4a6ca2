//! Ctrl+C cancellation.
//!
//! One [`ShutdownFlag`] is shared by the walker, every hash shard and the
//! progress poller. The Ctrl+C hook trips it; each of them stops at its next
//! check and the run ends with [`crate::error::ExitCode::Interrupted`].
//!
//! ```rust,no_run
//! use dupescan::duplicates::FinderConfig;
//! use dupescan::signal::install_handler;
//!
//! let shutdown = install_handler().expect("Ctrl+C hook");
//! let config = FinderConfig::default().with_shutdown_flag(shutdown.share());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Cancellation flag shared between the signal hook and the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// A fresh, untripped flag that no signal is hooked to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Request cancellation, as Ctrl+C would.
    pub fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Handle for [`crate::duplicates::FinderConfig::with_shutdown_flag`].
    #[must_use]
    pub fn share(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Error type for signal hook installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The operating system rejected the Ctrl+C hook.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static PROCESS_FLAG: OnceLock<ShutdownFlag> = OnceLock::new();

/// Hook Ctrl+C (and SIGTERM) to the process-wide [`ShutdownFlag`].
///
/// The hook is registered once per process. Every call returns the same flag,
/// cleared, so `run_app` can run several times in one test binary. If some
/// other code already owns the hook, the returned flag is unhooked but still
/// honors [`ShutdownFlag::trip`].
///
/// # Errors
///
/// Returns [`SignalError`] if the operating system rejects the hook.
pub fn install_handler() -> Result<ShutdownFlag, SignalError> {
    if let Some(flag) = PROCESS_FLAG.get() {
        flag.clear();
        return Ok(flag.clone());
    }

    let flag = ShutdownFlag::new();
    let hooked = flag.clone();
    match ctrlc::set_handler(move || {
        hooked.trip();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        log::info!("Shutdown signal received");
    }) {
        Ok(()) => {}
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C already hooked elsewhere, continuing with an unhooked flag");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(PROCESS_FLAG.get_or_init(|| flag).clone())
}
