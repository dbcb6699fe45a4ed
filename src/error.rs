//! Process exit codes and the JSON error form.

use serde::Serialize;

use crate::library::LibraryError;
use crate::scanner::ScanError;

/// Exit codes of the `jomics` binary.
///
/// - 0: Success
/// - 1: General error
/// - 2: Not found (missing root, unknown album, page out of range)
/// - 130: Interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The requested root, album or page does not exist.
    NotFound = 2,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "JM000",
            Self::GeneralError => "JM001",
            Self::NotFound => "JM002",
            Self::Interrupted => "JM130",
        }
    }

    /// Exit code for an error that escaped `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<LibraryError>() {
                if e.is_not_found() {
                    return Self::NotFound;
                }
            }
            if let Some(ScanError::NotFound(_)) = cause.downcast_ref::<ScanError>() {
                return Self::NotFound;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g. "JM002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Describe `err` exiting with `exit_code`.
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
