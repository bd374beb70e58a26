//! Preview/confirm posting protocol.
//!
//! A draft is sent for preview; the server answers with a journal, a preview
//! token and a content hash. Only the exact token and hash of the newest
//! preview may be confirmed, and each pair is consumed at most once.

pub mod error;
pub mod gateway;
pub mod idempotency;
pub mod protocol;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{GatewayError, IntegrityFailure, PostingError};
pub use gateway::PostingGateway;
pub use idempotency::IdempotencyKey;
pub use protocol::PostingProtocol;
pub use tracker::{ActivePreview, PreviewTracker};
pub use types::*;
