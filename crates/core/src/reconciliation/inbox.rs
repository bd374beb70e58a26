//! Reconciliation suggestion consumer.

use tallybook_shared::config::ReconciliationConfig;
use tracing::{debug, info, warn};

use super::error::ReconciliationError;
use super::types::{
    MatchOutcome, MatchRequest, MatchResult, ReconciliationSuggestion, Selection, SuggestionQuery,
};

/// Transport for the reconciliation endpoints.
pub trait ReconciliationGateway: Send + Sync {
    /// Fetch suggestions for a bank account and date range.
    fn fetch_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> impl std::future::Future<Output = Result<Vec<ReconciliationSuggestion>, ReconciliationError>>
    + Send;

    /// Record a match between a bank line and a ledger entry.
    fn confirm_match(
        &self,
        request: &MatchRequest,
    ) -> impl std::future::Future<Output = Result<MatchResult, ReconciliationError>> + Send;
}

/// Suggestions for one bank account and date range.
///
/// The list mirrors the server: it is never re-sorted, and confirmed matches
/// disappear only when a re-fetch no longer returns them.
#[derive(Debug, Clone)]
pub struct ReconciliationInbox {
    query: SuggestionQuery,
    minor_unit_scale: u32,
    suggestions: Vec<ReconciliationSuggestion>,
    selection: Option<Selection>,
}

impl ReconciliationInbox {
    /// Creates an empty inbox for a query.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the date range is inverted.
    pub fn new(
        query: SuggestionQuery,
        config: &ReconciliationConfig,
    ) -> Result<Self, ReconciliationError> {
        if query.date_from > query.date_to {
            return Err(ReconciliationError::Validation(format!(
                "date range starts after it ends ({} > {})",
                query.date_from, query.date_to
            )));
        }
        Ok(Self {
            query,
            minor_unit_scale: config.minor_unit_scale,
            suggestions: Vec::new(),
            selection: None,
        })
    }

    /// Returns the query.
    #[must_use]
    pub const fn query(&self) -> &SuggestionQuery {
        &self.query
    }

    /// Returns the minor-unit scale for amounts.
    #[must_use]
    pub const fn minor_unit_scale(&self) -> u32 {
        self.minor_unit_scale
    }

    /// Returns the suggestions in server order.
    #[must_use]
    pub fn suggestions(&self) -> &[ReconciliationSuggestion] {
        &self.suggestions
    }

    /// Returns the current selection.
    #[must_use]
    pub const fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Replaces the suggestions with a fresh fetch.
    ///
    /// A selection that is no longer offered is dropped.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's error; the previous list is kept.
    pub async fn refresh<G: ReconciliationGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<&[ReconciliationSuggestion], ReconciliationError> {
        let suggestions = gateway.fetch_suggestions(&self.query).await?;
        debug!(
            bank_account_id = %self.query.bank_account_id,
            suggestions = suggestions.len(),
            "Fetched reconciliation suggestions"
        );
        self.suggestions = suggestions;
        if let Some(selection) = &self.selection
            && self.validate(&selection.bank_line_id, &selection.candidate_id).is_err()
        {
            self.selection = None;
        }
        Ok(&self.suggestions)
    }

    /// Selects a candidate for a bank line.
    ///
    /// # Errors
    ///
    /// Returns an error if the bank line is not in the list or the candidate
    /// was not offered for it.
    pub fn select(
        &mut self,
        bank_line_id: &str,
        candidate_id: &str,
    ) -> Result<&Selection, ReconciliationError> {
        self.validate(bank_line_id, candidate_id)?;
        Ok(self.selection.insert(Selection {
            bank_line_id: bank_line_id.to_string(),
            candidate_id: candidate_id.to_string(),
        }))
    }

    /// Confirms the current selection.
    ///
    /// On success the suggestions are re-fetched rather than edited locally.
    /// A declined match leaves the list and the selection as they were.
    ///
    /// # Errors
    ///
    /// Returns a validation error if nothing is selected, and propagates
    /// gateway errors from the confirmation. A failed re-fetch after a
    /// recorded match is reported through [`MatchOutcome::Matched`] instead.
    pub async fn confirm<G: ReconciliationGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<MatchOutcome, ReconciliationError> {
        let Some(selection) = self.selection.clone() else {
            return Err(ReconciliationError::Validation(
                "no candidate is selected".to_string(),
            ));
        };
        let result = gateway.confirm_match(&MatchRequest::from(&selection)).await?;
        if !result.ok {
            warn!(
                bank_line_id = %selection.bank_line_id,
                candidate_id = %selection.candidate_id,
                "Match declined"
            );
            return Ok(MatchOutcome::Rejected {
                selection,
                message: result.message,
            });
        }

        info!(
            bank_line_id = %selection.bank_line_id,
            candidate_id = %selection.candidate_id,
            "Match confirmed"
        );
        self.selection = None;
        let refreshed = match self.refresh(gateway).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    bank_line_id = %selection.bank_line_id,
                    error = %err,
                    "Match recorded but suggestions could not be re-fetched"
                );
                false
            }
        };
        Ok(MatchOutcome::Matched {
            selection,
            refreshed,
        })
    }

    fn validate(&self, bank_line_id: &str, candidate_id: &str) -> Result<(), ReconciliationError> {
        let suggestion = self
            .suggestions
            .iter()
            .find(|suggestion| suggestion.bank_line.id.as_deref() == Some(bank_line_id))
            .ok_or_else(|| ReconciliationError::UnknownBankLine(bank_line_id.to_string()))?;
        if suggestion
            .candidates
            .iter()
            .any(|candidate| candidate.id.as_deref() == Some(candidate_id))
        {
            Ok(())
        } else {
            Err(ReconciliationError::UnknownCandidate {
                bank_line_id: bank_line_id.to_string(),
                candidate_id: candidate_id.to_string(),
            })
        }
    }
}
