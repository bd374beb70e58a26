//! Reconciliation data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tallybook_shared::types::{
    BankAccountId, coerce_amount, from_minor_units, lenient_id, lenient_text,
};

/// A bank statement line awaiting a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankLine {
    /// Bank line ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Statement date.
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    /// Statement description.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Signed amount in minor units.
    #[serde(default, deserialize_with = "lenient_minor_units")]
    pub amount_minor_units: i64,
}

impl BankLine {
    /// Returns the amount as a decimal at the given minor-unit scale.
    #[must_use]
    pub fn amount(&self, scale: u32) -> Decimal {
        from_minor_units(self.amount_minor_units, scale)
    }
}

/// A ledger entry proposed as the counterpart of a bank line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Ledger entry ID.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Transaction date.
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    /// Debited account.
    #[serde(default, deserialize_with = "lenient_text")]
    pub debit_account: Option<String>,
    /// Credited account.
    #[serde(default, deserialize_with = "lenient_text")]
    pub credit_account: Option<String>,
    /// Amount in minor units.
    #[serde(default, deserialize_with = "lenient_minor_units")]
    pub amount_minor_units: i64,
    /// Server ranking score. Opaque: shown, never compared or re-ranked.
    #[serde(default)]
    pub score: Option<Value>,
}

impl Candidate {
    /// Returns the amount as a decimal at the given minor-unit scale.
    #[must_use]
    pub fn amount(&self, scale: u32) -> Decimal {
        from_minor_units(self.amount_minor_units, scale)
    }
}

/// A bank line with its candidate ledger entries, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSuggestion {
    /// The bank line.
    pub bank_line: BankLine,
    /// Candidates in server order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Scope of a suggestion fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    /// Bank account to reconcile.
    pub bank_account_id: BankAccountId,
    /// First statement date, inclusive.
    pub date_from: NaiveDate,
    /// Last statement date, inclusive.
    pub date_to: NaiveDate,
}

/// A user's choice of candidate for a bank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Bank line being matched.
    pub bank_line_id: String,
    /// Chosen candidate.
    pub candidate_id: String,
}

/// A match confirmation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    /// Bank line being matched.
    pub bank_line_id: String,
    /// Ledger entry it matches.
    pub ledger_entry_id: String,
}

impl From<&Selection> for MatchRequest {
    fn from(selection: &Selection) -> Self {
        Self {
            bank_line_id: selection.bank_line_id.clone(),
            ledger_entry_id: selection.candidate_id.clone(),
        }
    }
}

/// Answer to a match confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the match was recorded.
    #[serde(default)]
    pub ok: bool,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of confirming a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The match was recorded.
    Matched {
        /// The recorded selection.
        selection: Selection,
        /// False if the follow-up re-fetch failed and the list is stale.
        refreshed: bool,
    },
    /// The server declined the match; suggestions are unchanged.
    Rejected {
        /// The declined selection.
        selection: Selection,
        /// Server message, if any.
        message: Option<String>,
    },
}

fn lenient_minor_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(coerce_amount)
        .and_then(|amount| amount.trunc().to_i64())
        .unwrap_or(0))
}
