//! Exit status codes for the CLI
//!
//! authpulse follows standard Unix exit code conventions:
//! - 0: Success
//! - 1: Any error (network, authentication, config, HTTP errors with --check-status)

use std::process::{ExitCode, Termination};

/// Exit status codes following standard Unix conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Successful execution (HTTP 2xx or no --check-status)
    Success = 0,
    /// Any error (HTTP 3xx/4xx/5xx with --check-status, failed negotiation, connection errors)
    Error = 1,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

impl ExitStatus {
    /// Create an exit status from an HTTP status code with --check-status flag
    ///
    /// When check_status is false, always returns Success (HTTP errors are not
    /// considered application errors unless explicitly checked).
    pub fn from_http_status(status_code: u16, check_status: bool) -> Self {
        if !check_status || (200..300).contains(&status_code) {
            ExitStatus::Success
        } else {
            ExitStatus::Error
        }
    }
}
