//! Posting protocol request and response types.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tallybook_shared::types::{SessionId, coerce_id};

use super::error::PostingError;
use super::idempotency::{IdempotencyKey, fields_seed, payload_seed, prompt_seed};
use crate::thread::JournalLine;

/// Server error codes that mean the preview no longer matches the draft.
pub const INTEGRITY_CODES: [&str; 5] = [
    "HASH_MISMATCH",
    "STALE_PREVIEW",
    "PREVIEW_EXPIRED",
    "PREVIEW_CONSUMED",
    "INTEGRITY_ERROR",
];

/// Source tag sent with structured drafts.
const EXTRACTION_SOURCE: &str = "extraction";

/// Where a session is in the preview/confirm protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPhase {
    /// Nothing drafted.
    #[default]
    Idle,
    /// A draft was sent for preview.
    Drafted,
    /// The server asked for more information.
    FollowupNeeded,
    /// A preview is on screen.
    Previewed,
    /// The latest preview was posted.
    Confirmed,
    /// The latest attempt failed.
    Failed,
}

/// Input for a preview: natural-language text or a structured field set.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    /// Natural-language description of the transaction.
    Prompt(String),
    /// Fields extracted from a document.
    Structured {
        /// Document type the fields belong to.
        doc_type: Option<String>,
        /// Extracted fields.
        fields: Map<String, Value>,
    },
}

impl Draft {
    /// Creates a prompt draft.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the prompt is blank.
    pub fn prompt(text: &str) -> Result<Self, PostingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PostingError::Validation("prompt is empty".to_string()));
        }
        Ok(Self::Prompt(text.to_string()))
    }

    /// Creates a structured draft from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the fields are not a JSON object.
    pub fn structured(doc_type: Option<&str>, fields: Value) -> Result<Self, PostingError> {
        let Value::Object(fields) = fields else {
            return Err(PostingError::Validation(
                "structured fields must be a JSON object".to_string(),
            ));
        };
        Ok(Self::Structured {
            doc_type: doc_type
                .map(str::trim)
                .filter(|doc_type| !doc_type.is_empty())
                .map(str::to_string),
            fields,
        })
    }

    /// Creates a structured draft from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the text does not parse to a JSON object.
    pub fn structured_json(doc_type: Option<&str>, text: &str) -> Result<Self, PostingError> {
        let fields: Value = serde_json::from_str(text)
            .map_err(|e| PostingError::Validation(format!("structured fields are not valid JSON: {e}")))?;
        Self::structured(doc_type, fields)
    }

    pub(crate) fn seed(&self) -> String {
        match self {
            Self::Prompt(text) => prompt_seed(text),
            Self::Structured { doc_type, fields } => fields_seed(doc_type.as_deref(), fields),
        }
    }
}

/// Edit to one row of the previewed journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPatch {
    /// Zero-based journal row index.
    pub row: usize,
    /// New debit account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_account: Option<String>,
    /// New credit account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_account: Option<String>,
    /// New amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// New transaction date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// New narration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl RowPatch {
    /// Starts an edit for a row.
    #[must_use]
    pub fn row(row: usize) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    /// Sets the debit account.
    #[must_use]
    pub fn debit_account(mut self, account: &str) -> Self {
        self.debit_account = Some(account.to_string());
        self
    }

    /// Sets the credit account.
    #[must_use]
    pub fn credit_account(mut self, account: &str) -> Self {
        self.credit_account = Some(account.to_string());
        self
    }

    /// Sets the amount.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    /// Sets the narration.
    #[must_use]
    pub fn narration(mut self, narration: &str) -> Self {
        self.narration = Some(narration.to_string());
        self
    }

    /// True if the edit changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.debit_account.is_none()
            && self.credit_account.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.narration.is_none()
    }
}

/// Body of a preview request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum PreviewBody {
    /// Natural-language draft.
    Prompt {
        /// Prompt text.
        prompt: String,
    },
    /// Structured draft.
    Extraction {
        /// Document type.
        #[serde(skip_serializing_if = "Option::is_none")]
        doc_type: Option<String>,
        /// Extracted fields.
        fields: Map<String, Value>,
        /// Always `"extraction"`.
        source: &'static str,
    },
    /// Edits applied to the last previewed draft.
    Patch {
        /// Preview being edited.
        base_preview_id: String,
        /// Row edits.
        patch: Vec<RowPatch>,
    },
}

/// A preview request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// Session the draft belongs to.
    pub session_id: SessionId,
    /// Fresh key for this request.
    pub idempotency_key: IdempotencyKey,
    /// Draft content.
    #[serde(flatten)]
    pub body: PreviewBody,
}

impl PreviewRequest {
    pub(crate) fn for_draft(session_id: SessionId, draft: Draft) -> Self {
        let idempotency_key = IdempotencyKey::generate(&draft.seed());
        let body = match draft {
            Draft::Prompt(prompt) => PreviewBody::Prompt { prompt },
            Draft::Structured { doc_type, fields } => PreviewBody::Extraction {
                doc_type,
                fields,
                source: EXTRACTION_SOURCE,
            },
        };
        Self {
            session_id,
            idempotency_key,
            body,
        }
    }

    pub(crate) fn for_patch(
        session_id: SessionId,
        base_preview_id: String,
        patch: Vec<RowPatch>,
    ) -> Self {
        Self {
            session_id,
            idempotency_key: IdempotencyKey::generate(&payload_seed("patch", &patch)),
            body: PreviewBody::Patch {
                base_preview_id,
                patch,
            },
        }
    }
}

/// A preview request that has been issued but not yet answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPreview {
    pub(crate) issue_seq: u64,
    pub(crate) request: PreviewRequest,
}

impl PendingPreview {
    /// Returns the issue sequence number.
    #[must_use]
    pub const fn issue_seq(&self) -> u64 {
        self.issue_seq
    }

    /// Returns the request to send.
    #[must_use]
    pub const fn request(&self) -> &PreviewRequest {
        &self.request
    }
}

/// A confirm request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Preview token.
    pub preview_id: String,
    /// Digest returned with the preview.
    pub hash: String,
    /// Session the preview belongs to.
    pub session_id: SessionId,
    /// Fresh key for this request.
    pub idempotency_key: IdempotencyKey,
}

/// A direct post that bypasses preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPostRequest {
    /// Journal to post.
    pub journal: Vec<JournalLine>,
    /// Prompt that produced the journal.
    pub prompt: String,
    /// Always true.
    pub confirmed: bool,
    /// Document type, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Document fields, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_fields: Option<Map<String, Value>>,
}

/// Parsed answer to a confirm or legacy post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResult {
    /// Whether the entry was posted.
    pub success: bool,
    /// Server message.
    pub message: Option<String>,
    /// Server error code.
    pub code: Option<String>,
    /// IDs of the created ledger rows.
    pub posted_ids: Vec<String>,
}

impl PostResult {
    /// Reads a post response body.
    ///
    /// Success is taken from `success`, then `ok`, then the status string;
    /// a body carrying only an `error` is a failure.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                success: false,
                message: Some("Unrecognized post response".to_string()),
                code: None,
                posted_ids: Vec::new(),
            };
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        let status = text("status").map(|status| status.to_lowercase());
        let success = obj
            .get("success")
            .and_then(Value::as_bool)
            .or_else(|| obj.get("ok").and_then(Value::as_bool))
            .or_else(|| match status.as_deref() {
                Some("ok" | "success" | "posted" | "saved" | "confirmed") => Some(true),
                Some(_) => Some(false),
                None => None,
            })
            .unwrap_or_else(|| !obj.contains_key("error"));
        let posted_ids = ["entryIds", "entry_ids", "postedIds", "ids"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(|ids| ids.iter().filter_map(coerce_id).collect())
            .unwrap_or_default();
        Self {
            success,
            message: text("message").or_else(|| text("error")),
            code: text("code").map(|code| code.to_uppercase()),
            posted_ids,
        }
    }

    /// True if the server flagged the preview as stale or tampered.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| INTEGRITY_CODES.contains(&code))
    }
}
