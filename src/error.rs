//! Exit codes and structured error output.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: Success (including runs that found nothing to report)
/// - 1: General error (unexpected failure, every root failed, report not written)
/// - 3: Partial success (some roots were skipped)
/// - 4: Invalid input (bad directory argument or exclusions file)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed. Finding no duplicates is a success too.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Partial success: Scan completed but one or more roots were skipped.
    PartialSuccess = 3,
    /// Invalid input: Arguments could not be used.
    InvalidInput = 4,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::PartialSuccess => "DS003",
            Self::InvalidInput => "DS004",
            Self::Interrupted => "DS130",
        }
    }
}

/// Error raised by the application layer for unusable arguments.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct InvalidInput(pub String);

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Pick the exit code for an application error.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if matches!(
            cause.downcast_ref::<crate::duplicates::FinderError>(),
            Some(crate::duplicates::FinderError::Interrupted)
        ) {
            return ExitCode::Interrupted;
        }
        if cause.is::<InvalidInput>() || cause.is::<crate::exclusions::ExclusionsError>() {
            return ExitCode::InvalidInput;
        }
    }
    ExitCode::GeneralError
}
