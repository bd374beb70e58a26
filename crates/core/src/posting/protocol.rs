//! Preview/confirm protocol.
//!
//! States: idle, drafted, previewed, confirmed; with a follow-up loop back to
//! drafted and failure reachable from any point. The protocol never retries a
//! request on its own.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{GatewayError, IntegrityFailure, PostingError};
use super::gateway::PostingGateway;
use super::idempotency::{IdempotencyKey, payload_seed};
use super::types::{
    ConfirmRequest, Draft, LegacyPostRequest, PendingPreview, PostResult, PreviewRequest, RowPatch,
};
use crate::thread::{Normalizer, SaveStatus, Session, SessionStatus};

/// Message recorded when a server refuses a post without saying why.
const DEFAULT_REJECTION: &str = "The server did not post the entry";

/// Drives previews and confirmations for a session.
#[derive(Debug, Clone, Default)]
pub struct PostingProtocol {
    normalizer: Normalizer,
}

impl PostingProtocol {
    /// Creates a protocol that normalizes responses with the given normalizer.
    #[must_use]
    pub const fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Returns the normalizer.
    #[must_use]
    pub const fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Issues a preview request for a draft.
    ///
    /// The request is not sent; pass the answer to [`Self::complete_preview`].
    ///
    /// # Errors
    ///
    /// Returns a validation error if the prompt is blank.
    pub fn begin_preview(
        &self,
        session: &mut Session,
        draft: Draft,
    ) -> Result<PendingPreview, PostingError> {
        if let Draft::Prompt(text) = &draft {
            if text.trim().is_empty() {
                return Err(PostingError::Validation("prompt is empty".to_string()));
            }
            session.remember_prompt(text);
        }
        let issue_seq = session.previews_mut().begin();
        let request = PreviewRequest::for_draft(session.id(), draft);
        debug!(
            session_id = %session.id(),
            issue_seq,
            idempotency_key = %request.idempotency_key,
            "Issued preview request"
        );
        Ok(PendingPreview { issue_seq, request })
    }

    /// Issues a preview request that edits rows of the active preview.
    ///
    /// The active preview is superseded immediately.
    ///
    /// # Errors
    ///
    /// Returns a validation error if there is no active preview, the patch is
    /// empty, or a row index is outside the previewed journal.
    pub fn begin_patch(
        &self,
        session: &mut Session,
        patch: Vec<RowPatch>,
    ) -> Result<PendingPreview, PostingError> {
        let Some(active) = session.active_preview() else {
            return Err(PostingError::Validation(
                "there is no preview to edit".to_string(),
            ));
        };
        if patch.is_empty() {
            return Err(PostingError::Validation("patch is empty".to_string()));
        }
        for edit in &patch {
            if edit.row >= active.journal_len {
                return Err(PostingError::Validation(format!(
                    "row {} is outside the previewed journal of {} rows",
                    edit.row, active.journal_len
                )));
            }
            if edit.is_empty() {
                return Err(PostingError::Validation(format!(
                    "edit for row {} changes nothing",
                    edit.row
                )));
            }
            if edit.amount.is_some_and(|amount| amount.is_sign_negative()) {
                return Err(PostingError::Validation(format!(
                    "amount for row {} is negative",
                    edit.row
                )));
            }
        }
        let base_preview_id = active.preview_id.clone();
        let issue_seq = session.previews_mut().begin_patch();
        let request = PreviewRequest::for_patch(session.id(), base_preview_id, patch);
        debug!(session_id = %session.id(), issue_seq, "Issued patch preview request");
        Ok(PendingPreview { issue_seq, request })
    }

    /// Records the answer to an issued preview request.
    ///
    /// Any response body becomes exactly one timeline entry. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request did not complete, or an integrity
    /// error if the server reported a conflict.
    pub fn complete_preview(
        &self,
        session: &mut Session,
        pending: PendingPreview,
        response: Result<Value, GatewayError>,
    ) -> Result<usize, PostingError> {
        match response {
            Ok(body) => Ok(self
                .normalizer
                .normalize_issued(session, &body, Some(pending.issue_seq))),
            Err(err) => {
                warn!(
                    session_id = %session.id(),
                    issue_seq = pending.issue_seq,
                    error = %err,
                    "Preview request failed"
                );
                session.previews_mut().fail(pending.issue_seq);
                Err(err.into())
            }
        }
    }

    /// Sends a draft for preview.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_preview`] and [`Self::complete_preview`].
    pub async fn preview<G: PostingGateway>(
        &self,
        gateway: &G,
        session: &mut Session,
        draft: Draft,
    ) -> Result<usize, PostingError> {
        let pending = self.begin_preview(session, draft)?;
        let response = gateway.preview(pending.request()).await;
        self.complete_preview(session, pending, response)
    }

    /// Sends row edits to the active preview for a fresh preview.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_patch`] and [`Self::complete_preview`].
    pub async fn patch<G: PostingGateway>(
        &self,
        gateway: &G,
        session: &mut Session,
        patch: Vec<RowPatch>,
    ) -> Result<usize, PostingError> {
        let pending = self.begin_patch(session, patch)?;
        let response = gateway.preview(pending.request()).await;
        self.complete_preview(session, pending, response)
    }

    /// Confirms a preview by its exact token and hash.
    ///
    /// The pair is checked locally against the active preview before anything
    /// is sent. A server refusal that is not an integrity failure is returned
    /// as [`SaveStatus::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns an integrity error if the pair is stale, consumed, or rejected
    /// by the server, and a network error if the request did not complete.
    pub async fn confirm<G: PostingGateway>(
        &self,
        gateway: &G,
        session: &mut Session,
        preview_id: &str,
        hash: &str,
    ) -> Result<SaveStatus, PostingError> {
        let checked = session.previews_mut().check(preview_id, hash).cloned();
        let active = match checked {
            Ok(active) => active,
            Err(failure) => {
                warn!(session_id = %session.id(), preview_id, reason = %failure, "Refused confirm locally");
                if !matches!(failure, IntegrityFailure::Consumed { .. })
                    && let Some(index) = find_preview(session, preview_id, hash)
                {
                    session.annotate(
                        index,
                        SaveStatus::IntegrityFailed {
                            message: failure.to_string(),
                        },
                    );
                }
                return Err(failure.into());
            }
        };

        let request = ConfirmRequest {
            preview_id: preview_id.to_string(),
            hash: hash.to_string(),
            session_id: session.id(),
            idempotency_key: IdempotencyKey::generate(&payload_seed("confirm", &(preview_id, hash))),
        };
        let result = match gateway.confirm(&request).await {
            Ok(body) => PostResult::from_value(&body),
            Err(GatewayError::Conflict(message)) => {
                return Err(Self::integrity_failed(session, active.entry_index, None, message));
            }
            Err(err) => {
                warn!(session_id = %session.id(), preview_id, error = %err, "Confirm request failed");
                return Err(err.into());
            }
        };

        if result.success {
            session.previews_mut().consume();
            info!(
                session_id = %session.id(),
                preview_id,
                posted = result.posted_ids.len(),
                "Confirmed preview"
            );
        } else if result.is_integrity_failure() {
            let message = result.message.unwrap_or_else(|| DEFAULT_REJECTION.to_string());
            return Err(Self::integrity_failed(session, active.entry_index, None, message));
        }
        Ok(Self::record(session, active.entry_index, result))
    }

    /// Confirms whichever preview is currently active.
    ///
    /// # Errors
    ///
    /// See [`Self::confirm`].
    pub async fn confirm_active<G: PostingGateway>(
        &self,
        gateway: &G,
        session: &mut Session,
    ) -> Result<SaveStatus, PostingError> {
        let Some((preview_id, hash)) = session
            .active_preview()
            .map(|active| (active.preview_id.clone(), active.hash.clone()))
        else {
            return Err(IntegrityFailure::NoActivePreview.into());
        };
        self.confirm(gateway, session, &preview_id, &hash).await
    }

    /// Posts a previewed journal directly, bypassing confirm.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the entry is not a preview with journal
    /// lines, an integrity error if the server reports a conflict, and a
    /// network error if the request did not complete.
    pub async fn post_legacy<G: PostingGateway>(
        &self,
        gateway: &G,
        session: &mut Session,
        entry_index: usize,
    ) -> Result<SaveStatus, PostingError> {
        let Some(preview) = session
            .timeline()
            .get(entry_index)
            .and_then(|item| item.entry.as_preview())
        else {
            return Err(PostingError::Validation(format!(
                "timeline entry {entry_index} is not a preview"
            )));
        };
        if preview.journal.is_empty() {
            return Err(PostingError::Validation(format!(
                "timeline entry {entry_index} has no journal lines"
            )));
        }
        let pair = preview
            .snapshot()
            .map(|(preview_id, hash)| (preview_id.to_string(), hash.to_string()));
        if let Some((preview_id, hash)) = &pair
            && session.previews().is_consumed(preview_id, hash)
        {
            warn!(session_id = %session.id(), entry_index, preview_id = %preview_id, "Refused to post a consumed preview");
            return Err(IntegrityFailure::Consumed {
                preview_id: preview_id.clone(),
            }
            .into());
        }
        let request = LegacyPostRequest {
            journal: preview.journal.clone(),
            prompt: session.last_prompt().unwrap_or_default().to_string(),
            confirmed: true,
            doc_type: preview.doc_type.clone(),
            document_fields: Some(preview.document_fields.clone())
                .filter(|fields| !fields.is_empty()),
        };

        let result = match gateway.confirm_legacy(&request).await {
            Ok(body) => PostResult::from_value(&body),
            Err(GatewayError::Conflict(message)) => {
                return Err(Self::integrity_failed(session, entry_index, pair.as_ref(), message));
            }
            Err(err) => {
                warn!(session_id = %session.id(), entry_index, error = %err, "Legacy post failed");
                return Err(err.into());
            }
        };

        if result.success {
            if let Some((preview_id, hash)) = &pair {
                session.previews_mut().consume_pair(preview_id, hash);
            }
            info!(
                session_id = %session.id(),
                entry_index,
                posted = result.posted_ids.len(),
                "Posted journal directly"
            );
        } else if result.is_integrity_failure() {
            let message = result.message.unwrap_or_else(|| DEFAULT_REJECTION.to_string());
            return Err(Self::integrity_failed(session, entry_index, pair.as_ref(), message));
        }
        Ok(Self::record(session, entry_index, result))
    }

    fn record(session: &mut Session, entry_index: usize, result: PostResult) -> SaveStatus {
        let status = if result.success {
            session.set_status(SessionStatus::Idle);
            SaveStatus::Saved {
                message: result.message,
                posted_ids: result.posted_ids,
            }
        } else {
            warn!(
                session_id = %session.id(),
                entry_index,
                code = result.code.as_deref().unwrap_or_default(),
                "Server rejected post"
            );
            SaveStatus::Rejected {
                message: result.message.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            }
        };
        session.annotate(entry_index, status.clone());
        status
    }

    fn integrity_failed(
        session: &mut Session,
        entry_index: usize,
        pair: Option<&(String, String)>,
        message: String,
    ) -> PostingError {
        warn!(session_id = %session.id(), entry_index, reason = %message, "Server rejected preview integrity");
        let pair = pair.map(|(preview_id, hash)| (preview_id.as_str(), hash.as_str()));
        if session.previews_mut().invalidate(entry_index, pair) {
            session.set_status(SessionStatus::Error);
        }
        session.annotate(
            entry_index,
            SaveStatus::IntegrityFailed {
                message: message.clone(),
            },
        );
        IntegrityFailure::Rejected(message).into()
    }
}

fn find_preview(session: &Session, preview_id: &str, hash: &str) -> Option<usize> {
    session
        .timeline()
        .iter()
        .rev()
        .find(|item| {
            item.entry
                .as_preview()
                .and_then(|preview| preview.snapshot())
                == Some((preview_id, hash))
        })
        .map(|item| item.index)
}
