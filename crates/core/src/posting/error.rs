//! Posting protocol error types.
//!
//! Network errors leave the draft intact and may be retried by the user.
//! Validation errors reject the attempt before anything is sent. Integrity
//! errors mean the preview can no longer be confirmed and a fresh preview is
//! required.

use tallybook_shared::AppError;
use thiserror::Error;

/// Errors returned by a posting gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request did not complete.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The server reported a conflict with its stored preview.
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Why a preview can no longer be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityFailure {
    /// No preview is awaiting confirmation.
    #[error("No preview is awaiting confirmation")]
    NoActivePreview,

    /// The pair does not match the active preview.
    #[error("Preview {preview_id} does not match the active preview")]
    Mismatch {
        /// Preview ID supplied by the caller.
        preview_id: String,
    },

    /// The pair was already confirmed.
    #[error("Preview {preview_id} was already confirmed")]
    Consumed {
        /// Preview ID supplied by the caller.
        preview_id: String,
    },

    /// A newer preview replaced this one.
    #[error("Preview {preview_id} was superseded by a newer preview")]
    Superseded {
        /// Preview ID supplied by the caller.
        preview_id: String,
    },

    /// The server rejected the hash.
    #[error("Server rejected the preview: {0}")]
    Rejected(String),
}

/// Errors that can occur during preview and confirm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostingError {
    /// The request did not reach the server or timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The request was malformed and was not sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The preview cannot be confirmed.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityFailure),
}

impl PostingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Integrity(_) => "INTEGRITY_ERROR",
        }
    }

    /// Returns true if the user may retry the same request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns true if a fresh preview is required before confirming.
    #[must_use]
    pub fn requires_new_preview(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

impl From<GatewayError> for PostingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(msg) => Self::Network(msg),
            GatewayError::Timeout => Self::Network("request timed out".to_string()),
            GatewayError::Conflict(msg) => Self::Integrity(IntegrityFailure::Rejected(msg)),
        }
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        match err {
            PostingError::Network(msg) => Self::Network(msg),
            PostingError::Validation(msg) => Self::Validation(msg),
            PostingError::Integrity(failure) => Self::Integrity(failure.to_string()),
        }
    }
}
