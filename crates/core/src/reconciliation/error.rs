//! Reconciliation error types.

use tallybook_shared::AppError;
use thiserror::Error;

/// Errors that can occur while consuming reconciliation suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// The suggestion service could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The query or selection is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The bank line is not among the current suggestions.
    #[error("Unknown bank line: {0}")]
    UnknownBankLine(String),

    /// The candidate was not offered for the bank line.
    #[error("Candidate {candidate_id} was not offered for bank line {bank_line_id}")]
    UnknownCandidate {
        /// Bank line ID.
        bank_line_id: String,
        /// Candidate ID.
        candidate_id: String,
    },
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnknownBankLine(_) => "UNKNOWN_BANK_LINE",
            Self::UnknownCandidate { .. } => "UNKNOWN_CANDIDATE",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::Network(msg) => Self::Network(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}
