//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Module errors in the core crate convert into this umbrella so a caller can
/// decide between a retry affordance and a correction prompt.
#[derive(Debug, Error)]
pub enum AppError {
    /// Transport failure, safe for the user to retry.
    #[error("Network error: {0}")]
    Network(String),

    /// Input failed shape checks.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Preview integrity check failed; a fresh preview is required.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Server response matched no known shape.
    #[error("Unrecognized response: {0}")]
    Shape(String),

    /// Business rule violation reported by the server.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Shape(_) => "SHAPE_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns true if the user can retry the same attempt unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
