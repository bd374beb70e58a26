//! Posting gateway trait.

use serde_json::Value;

use super::error::GatewayError;
use super::types::{ConfirmRequest, LegacyPostRequest, PreviewRequest};

/// Transport for the preview/confirm endpoints.
///
/// Response bodies are returned as raw JSON, including business errors; only
/// transport failures and integrity conflicts are errors. Implementations
/// must not retry.
pub trait PostingGateway: Send + Sync {
    /// Sends a draft for preview.
    fn preview(
        &self,
        request: &PreviewRequest,
    ) -> impl std::future::Future<Output = Result<Value, GatewayError>> + Send;

    /// Confirms a preview.
    fn confirm(
        &self,
        request: &ConfirmRequest,
    ) -> impl std::future::Future<Output = Result<Value, GatewayError>> + Send;

    /// Posts a journal directly.
    fn confirm_legacy(
        &self,
        request: &LegacyPostRequest,
    ) -> impl std::future::Future<Output = Result<Value, GatewayError>> + Send;
}
