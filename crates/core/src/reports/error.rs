//! Report error types.

use tallybook_shared::AppError;
use thiserror::Error;

/// Errors that can occur while loading ledger rows for reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The ledger store could not be reached.
    #[error("Ledger source unavailable: {0}")]
    SourceUnavailable(String),

    /// The ledger payload is not a list of rows.
    #[error("Invalid ledger payload: {0}")]
    InvalidPayload(String),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "LEDGER_SOURCE_UNAVAILABLE",
            Self::InvalidPayload(_) => "INVALID_LEDGER_PAYLOAD",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::SourceUnavailable(msg) => Self::Network(msg),
            ReportError::InvalidPayload(msg) => Self::Validation(msg),
        }
    }
}
