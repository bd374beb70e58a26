//! Ledger snapshot façade over the external ledger store.

use tallybook_shared::types::SessionId;
use tracing::debug;

use super::error::ReportError;
use super::service::ReportService;
use super::types::{BalanceSheet, LedgerRow, ProfitAndLoss, RowIssue, TrialBalance};
use crate::chart::ClassifierRules;

/// Source of ledger rows.
///
/// This trait is implemented by the transport layer; the core never talks to
/// storage itself.
pub trait LedgerSource: Send + Sync {
    /// Fetch every ledger row visible to a session.
    fn fetch_ledger_rows(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerRow>, ReportError>> + Send;
}

/// One fetched set of ledger rows together with the rules used to report on it.
#[derive(Debug, Clone)]
pub struct LedgerBook {
    rows: Vec<LedgerRow>,
    rules: ClassifierRules,
}

impl LedgerBook {
    /// Creates a book over rows already in hand.
    #[must_use]
    pub fn new(rows: Vec<LedgerRow>, rules: ClassifierRules) -> Self {
        Self { rows, rules }
    }

    /// Fetches the session's rows from a ledger source.
    ///
    /// # Errors
    ///
    /// Propagates the source's error.
    pub async fn fetch<S: LedgerSource>(
        source: &S,
        session_id: SessionId,
        rules: ClassifierRules,
    ) -> Result<Self, ReportError> {
        let rows = source.fetch_ledger_rows(session_id).await?;
        debug!(session_id = %session_id, rows = rows.len(), "Fetched ledger rows");
        Ok(Self::new(rows, rules))
    }

    /// Returns the rows in this book.
    #[must_use]
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Computes the trial balance.
    #[must_use]
    pub fn trial_balance(&self) -> TrialBalance {
        ReportService::trial_balance(&self.rows)
    }

    /// Computes the profit and loss view.
    #[must_use]
    pub fn profit_and_loss(&self) -> ProfitAndLoss {
        ReportService::profit_and_loss(&self.rows, &self.rules)
    }

    /// Computes the balance sheet view.
    #[must_use]
    pub fn balance_sheet(&self) -> BalanceSheet {
        ReportService::balance_sheet(&self.rows, &self.rules)
    }

    /// Lists rows that break the double-entry shape rules.
    #[must_use]
    pub fn issues(&self) -> Vec<RowIssue> {
        ReportService::validate_rows(&self.rows)
    }
}
