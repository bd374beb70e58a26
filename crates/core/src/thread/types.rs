//! Thread timeline domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use tallybook_shared::AppError;

use crate::reports::LedgerRow;

/// Observable status of a session after its latest response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing pending.
    #[default]
    Idle,
    /// A preview is on screen.
    Preview,
    /// The server asked a clarifying question.
    Followup,
    /// The latest response was an error or unrecognized.
    Error,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preview => "preview",
            Self::Followup => "followup",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One proposed journal line inside a preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    /// Transaction date as sent by the server.
    pub date: Option<String>,
    /// Account to debit.
    pub debit_account: Option<String>,
    /// Account to credit.
    pub credit_account: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Narration.
    pub narration: Option<String>,
}

impl JournalLine {
    /// Converts the proposed line into a ledger row for what-if reporting.
    #[must_use]
    pub fn to_ledger_row(&self) -> LedgerRow {
        LedgerRow {
            id: None,
            transaction_date: self.date.clone(),
            debit_account: self.debit_account.clone(),
            credit_account: self.credit_account.clone(),
            amount: self.amount,
            narration: self.narration.clone(),
        }
    }
}

/// A journal the server has materialized and is waiting to have confirmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    /// Proposed journal lines.
    pub journal: Vec<JournalLine>,
    /// Human-readable ledger rendering.
    pub ledger: Option<String>,
    /// Structured ledger view, when the server sent one.
    pub ledger_view: Option<Value>,
    /// Explanation of how the entry was derived.
    pub explanation: Option<String>,
    /// Accounts the entry would create.
    pub new_accounts: Vec<String>,
    /// Warnings raised while drafting.
    pub warnings: Vec<String>,
    /// Document type the fields were extracted for.
    pub doc_type: Option<String>,
    /// Extracted document fields, keyed by document type.
    pub document_fields: Map<String, Value>,
    /// Opaque preview token.
    pub preview_id: Option<String>,
    /// Content-integrity digest of the draft.
    pub hash: Option<String>,
}

impl PreviewEntry {
    /// Returns the preview token and hash when both were sent.
    #[must_use]
    pub fn snapshot(&self) -> Option<(&str, &str)> {
        Some((self.preview_id.as_deref()?, self.hash.as_deref()?))
    }

    /// Converts the journal into ledger rows.
    #[must_use]
    pub fn ledger_rows(&self) -> Vec<LedgerRow> {
        self.journal.iter().map(JournalLine::to_ledger_row).collect()
    }
}

/// One result item of a legacy-shaped response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyResult {
    /// Result type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Result payload.
    pub content: Value,
}

/// Canonical timeline item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThreadEntry {
    /// A ready-to-confirm preview.
    Preview(PreviewEntry),
    /// The server needs more information.
    Followup {
        /// Question to show the user.
        clarification: String,
        /// Hint about the kind of answer expected.
        prompt_type: Option<String>,
    },
    /// The server reported an error.
    Error {
        /// Best-effort message.
        message: String,
    },
    /// A response in the legacy prompt/results shape.
    Legacy {
        /// The prompt echoed back.
        prompt: String,
        /// Well-formed result items.
        results: Vec<LegacyResult>,
    },
    /// A response that matched no known shape, kept verbatim.
    Raw {
        /// The unrecognized payload.
        payload: Value,
    },
}

impl ThreadEntry {
    /// Returns the variant name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Preview(_) => "preview",
            Self::Followup { .. } => "followup",
            Self::Error { .. } => "error",
            Self::Legacy { .. } => "legacy",
            Self::Raw { .. } => "raw",
        }
    }

    /// Returns the failure this entry records, if any.
    ///
    /// Business errors and unrecognized shapes stay inside the timeline; this
    /// lets a caller report them alongside protocol errors.
    #[must_use]
    pub fn as_error(&self) -> Option<AppError> {
        match self {
            Self::Error { message } => Some(AppError::BusinessRule(message.clone())),
            Self::Raw { payload } => Some(AppError::Shape(payload.to_string())),
            _ => None,
        }
    }

    /// Returns the preview payload, if this is a preview entry.
    #[must_use]
    pub const fn as_preview(&self) -> Option<&PreviewEntry> {
        match self {
            Self::Preview(preview) => Some(preview),
            _ => None,
        }
    }
}

/// Outcome of confirming a timeline entry, recorded beside the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    /// The entry was posted.
    Saved {
        /// Server message, if any.
        message: Option<String>,
        /// IDs of the ledger rows created.
        posted_ids: Vec<String>,
    },
    /// The server refused to post the entry.
    Rejected {
        /// Server message.
        message: String,
    },
    /// The preview no longer matched the draft on the server.
    IntegrityFailed {
        /// Reason reported.
        message: String,
    },
}

impl SaveStatus {
    /// Returns true if the entry was posted.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}
