//! Typed reads over loosely shaped orchestrator responses.
//!
//! Every camel/snake fallback chain lives here so the classifier can stay a
//! flat ordered match.

use serde_json::{Map, Value};
use tallybook_shared::types::{coerce_amount, coerce_id};

use super::types::{JournalLine, LegacyResult};

/// Statuses that mark a response as carrying a ready draft.
const PREVIEW_STATUSES: [&str; 4] = ["preview", "success", "ok", "ready"];

/// Statuses that mark a response as a business error.
const ERROR_STATUSES: [&str; 2] = ["invalid", "error"];

/// Status that asks the user for more information.
const FOLLOWUP_STATUS: &str = "followup_needed";

/// Read-only view over one response object.
#[derive(Debug, Clone, Copy)]
pub struct RawResponse<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> RawResponse<'a> {
    /// Wraps a response, unwrapping one `data` envelope when the outer object
    /// carries no `status` of its own. Returns `None` for non-objects.
    #[must_use]
    pub fn new(value: &'a Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.contains_key("status")
            && let Some(inner) = obj.get("data").and_then(Value::as_object)
        {
            return Some(Self { obj: inner });
        }
        Some(Self { obj })
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .find_map(|key| self.obj.get(*key).filter(|value| !value.is_null()))
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).and_then(non_blank)
    }

    /// Trimmed, lowercased status.
    #[must_use]
    pub fn status(&self) -> Option<String> {
        self.get(&["status"])
            .and_then(Value::as_str)
            .map(|status| status.trim().to_lowercase())
    }

    /// True when the status asks for a follow-up.
    #[must_use]
    pub fn is_followup(&self) -> bool {
        self.status().as_deref() == Some(FOLLOWUP_STATUS)
    }

    /// True when the status marks a ready draft.
    #[must_use]
    pub fn is_previewish(&self) -> bool {
        self.status()
            .is_some_and(|status| PREVIEW_STATUSES.contains(&status.as_str()))
    }

    /// True when the status or the `success` flag marks a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        let by_status = self
            .status()
            .is_some_and(|status| ERROR_STATUSES.contains(&status.as_str()));
        by_status || self.obj.get("success") == Some(&Value::Bool(false))
    }

    /// Clarification question.
    #[must_use]
    pub fn clarification(&self) -> Option<String> {
        self.text(&["clarification", "question"])
    }

    /// Hint about the expected answer.
    #[must_use]
    pub fn prompt_type(&self) -> Option<String> {
        self.text(&["promptType", "prompt_type"])
    }

    /// Best-effort error message: explicit error, then the error list, then a
    /// top-level message.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = self.get(&["error"])
            && let Some(message) = non_blank(error).or_else(|| message_of(error))
        {
            return Some(message);
        }
        let listed: Vec<String> = self
            .get(&["errors"])
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|item| non_blank(item).or_else(|| message_of(item)))
                    .collect()
            })
            .unwrap_or_default();
        if !listed.is_empty() {
            return Some(listed.join("; "));
        }
        self.text(&["message"])
    }

    /// First non-empty journal-like array: `journal`, `normalized`, then
    /// `ledgerView.journal`.
    #[must_use]
    pub fn journal(&self) -> Option<Vec<JournalLine>> {
        let nested = self
            .get(&["ledgerView", "ledger_view"])
            .and_then(|view| view.get("journal"));
        [self.get(&["journal"]), self.get(&["normalized"]), nested]
            .into_iter()
            .flatten()
            .filter_map(Value::as_array)
            .map(|rows| rows.iter().filter_map(journal_line).collect::<Vec<_>>())
            .find(|lines| !lines.is_empty())
    }

    /// Ledger rendering, when sent as text.
    #[must_use]
    pub fn ledger_text(&self) -> Option<String> {
        self.text(&["ledger", "ledgerText", "ledger_text"])
            .or_else(|| self.text(&["ledgerView", "ledger_view"]))
    }

    /// Structured ledger view, when sent as an object.
    #[must_use]
    pub fn ledger_view(&self) -> Option<Value> {
        self.get(&["ledgerView", "ledger_view"])
            .filter(|view| view.is_object())
            .cloned()
    }

    /// Explanation text.
    #[must_use]
    pub fn explanation(&self) -> Option<String> {
        self.text(&["explanation"])
    }

    /// Names of accounts the entry would create.
    #[must_use]
    pub fn new_accounts(&self) -> Vec<String> {
        self.get(&["newAccounts", "new_accounts"])
            .map(|value| string_list(value, |item| item.get("name").and_then(non_blank)))
            .unwrap_or_default()
    }

    /// Warnings raised while drafting.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.get(&["warnings"])
            .map(|value| string_list(value, message_of))
            .unwrap_or_default()
    }

    /// Document type.
    #[must_use]
    pub fn doc_type(&self) -> Option<String> {
        self.text(&["docType", "doc_type"])
    }

    /// Document fields, keyed by document type.
    #[must_use]
    pub fn document_fields(&self) -> Map<String, Value> {
        normalize_document_fields(
            self.doc_type().as_deref(),
            self.get(&["documentFields", "document_fields", "fields"]),
        )
    }

    /// Preview token.
    #[must_use]
    pub fn preview_id(&self) -> Option<String> {
        self.get(&["previewId", "preview_id"])
            .and_then(coerce_id)
    }

    /// Content-integrity digest.
    #[must_use]
    pub fn hash(&self) -> Option<String> {
        self.text(&["hash"])
    }

    /// Legacy `prompt` plus well-formed `results`, when the response has that
    /// shape.
    #[must_use]
    pub fn legacy(&self) -> Option<(String, Vec<LegacyResult>)> {
        let prompt = self.obj.get("prompt")?.as_str()?;
        let results = self.obj.get("results")?.as_array()?;
        let valid = results.iter().filter_map(legacy_result).collect();
        Some((prompt.to_string(), valid))
    }
}

/// Normalizes document fields.
///
/// An absent or `"none"` document type yields an empty object. Fields already
/// keyed by the document type pass through; a flat field set is re-keyed
/// under it.
#[must_use]
pub fn normalize_document_fields(
    doc_type: Option<&str>,
    fields: Option<&Value>,
) -> Map<String, Value> {
    let Some(doc_type) = doc_type.map(str::trim).filter(|doc_type| {
        !doc_type.is_empty() && !doc_type.eq_ignore_ascii_case("none")
    }) else {
        return Map::new();
    };
    let Some(fields) = fields.and_then(Value::as_object) else {
        return Map::new();
    };
    if fields.contains_key(doc_type) {
        return fields.clone();
    }
    let mut keyed = Map::new();
    keyed.insert(doc_type.to_string(), Value::Object(fields.clone()));
    keyed
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn message_of(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("msg"))
        .and_then(non_blank)
}

fn string_list(value: &Value, from_object: impl Fn(&Value) -> Option<String>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| non_blank(item).or_else(|| from_object(item)))
            .collect(),
        other => non_blank(other).into_iter().collect(),
    }
}

fn journal_line(value: &Value) -> Option<JournalLine> {
    let obj = value.as_object()?;
    let read = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| obj.get(*key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Some(JournalLine {
        date: read(&["transactionDate", "transaction_date", "date"]),
        debit_account: read(&["debitAccount", "debit_account", "debit"]),
        credit_account: read(&["creditAccount", "credit_account", "credit"]),
        amount: obj.get("amount").map(coerce_amount).unwrap_or_default(),
        narration: read(&["narration", "description"]),
    })
}

fn legacy_result(value: &Value) -> Option<LegacyResult> {
    let kind = value.get("type").and_then(non_blank)?;
    let content = value.get("content").filter(|content| !content.is_null())?;
    Some(LegacyResult {
        kind,
        content: content.clone(),
    })
}
