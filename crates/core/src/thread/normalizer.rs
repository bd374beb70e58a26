//! Ordered classification of orchestrator responses into thread entries.

use serde_json::Value;
use tallybook_shared::config::NormalizerConfig;
use tracing::{debug, warn};

use super::adapter::RawResponse;
use super::session::Session;
use super::types::{PreviewEntry, SessionStatus, ThreadEntry};

/// A classified response together with its session side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The timeline entry.
    pub entry: ThreadEntry,
    /// Status the session moves to.
    pub status: SessionStatus,
    /// Response type to remember, for legacy responses with valid results.
    pub response_type: Option<String>,
}

/// Response normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Creates a normalizer with the given fallback texts.
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Classifies a raw response. Never fails: unknown shapes become `raw`.
    ///
    /// First match wins:
    /// 1. `followup_needed` status
    /// 2. preview status with a journal
    /// 3. error status or `success: false`
    /// 4. legacy `prompt` + `results`
    /// 5. any extractable journal
    /// 6. raw
    #[must_use]
    pub fn classify(&self, raw: &Value) -> Normalized {
        let Some(response) = RawResponse::new(raw) else {
            return Self::raw(raw);
        };

        if response.is_followup() {
            return Normalized {
                entry: ThreadEntry::Followup {
                    clarification: response
                        .clarification()
                        .unwrap_or_else(|| self.config.default_clarification.clone()),
                    prompt_type: response.prompt_type(),
                },
                status: SessionStatus::Followup,
                response_type: None,
            };
        }

        if response.is_previewish()
            && let Some(preview) = Self::preview(&response)
        {
            return preview;
        }

        if response.is_error() {
            return Normalized {
                entry: ThreadEntry::Error {
                    message: response
                        .error_message()
                        .unwrap_or_else(|| self.config.generic_error.clone()),
                },
                status: SessionStatus::Error,
                response_type: None,
            };
        }

        if let Some((prompt, results)) = response.legacy() {
            let response_type = results.first().map(|result| result.kind.clone());
            return Normalized {
                entry: ThreadEntry::Legacy { prompt, results },
                status: SessionStatus::Idle,
                response_type,
            };
        }

        Self::preview(&response).unwrap_or_else(|| Self::raw(raw))
    }

    /// Classifies a response and appends it to the session timeline.
    ///
    /// Returns the index of the new entry.
    pub fn normalize(&self, session: &mut Session, raw: &Value) -> usize {
        self.normalize_issued(session, raw, None)
    }

    pub(crate) fn normalize_issued(
        &self,
        session: &mut Session,
        raw: &Value,
        issue_seq: Option<u64>,
    ) -> usize {
        let normalized = self.classify(raw);
        match &normalized.entry {
            ThreadEntry::Raw { .. } => {
                warn!(session_id = %session.id(), "Unrecognized response shape, keeping raw payload");
            }
            entry => {
                debug!(session_id = %session.id(), kind = entry.kind(), "Normalized response");
            }
        }
        session.append(normalized, issue_seq)
    }

    fn preview(response: &RawResponse<'_>) -> Option<Normalized> {
        let journal = response.journal()?;
        let preview = PreviewEntry {
            journal,
            ledger: response.ledger_text(),
            ledger_view: response.ledger_view(),
            explanation: response.explanation(),
            new_accounts: response.new_accounts(),
            warnings: response.warnings(),
            doc_type: response.doc_type(),
            document_fields: response.document_fields(),
            preview_id: response.preview_id(),
            hash: response.hash(),
        };
        Some(Normalized {
            entry: ThreadEntry::Preview(preview),
            status: SessionStatus::Preview,
            response_type: None,
        })
    }

    fn raw(raw: &Value) -> Normalized {
        Normalized {
            entry: ThreadEntry::Raw {
                payload: raw.clone(),
            },
            status: SessionStatus::Error,
            response_type: None,
        }
    }
}
