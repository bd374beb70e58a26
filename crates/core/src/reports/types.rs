//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tallybook_shared::types::{lenient_amount, lenient_id, lenient_text};

/// A double-entry ledger row as served by the ledger store.
///
/// Each row debits at most one account and credits at most one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    /// Row ID (string or number on the wire).
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Transaction date (ISO 8601).
    #[serde(default, deserialize_with = "lenient_text")]
    pub transaction_date: Option<String>,
    /// Account debited by this row.
    #[serde(default, deserialize_with = "lenient_text")]
    pub debit_account: Option<String>,
    /// Account credited by this row.
    #[serde(default, deserialize_with = "lenient_text")]
    pub credit_account: Option<String>,
    /// Amount posted to both sides; unreadable amounts become zero.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Decimal,
    /// Free-text narration.
    #[serde(default, deserialize_with = "lenient_text")]
    pub narration: Option<String>,
}

impl LedgerRow {
    /// Creates a row debiting one account and crediting another.
    #[must_use]
    pub fn new(debit_account: &str, credit_account: &str, amount: Decimal) -> Self {
        Self {
            debit_account: Some(debit_account.to_string()),
            credit_account: Some(credit_account.to_string()),
            amount,
            ..Self::default()
        }
    }

    /// Returns the parsed transaction date, if it is a valid ISO date.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.transaction_date
            .as_deref()
            .and_then(|raw| raw.get(..10))
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }
}

/// Per-account debit and credit totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// Account display name (first spelling seen).
    pub account: String,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Returns the signed balance, debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    /// Account balances, sorted by account name.
    pub accounts: Vec<AccountBalance>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

impl TrialBalance {
    /// Looks up an account balance, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn account(&self, name: &str) -> Option<&AccountBalance> {
        let key = name.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|balance| balance.account.to_lowercase() == key)
    }
}

/// Trial balance totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// A single account line on a financial statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    /// Account name.
    pub account: String,
    /// Balance magnitude, `|debit - credit|`.
    pub amount: Decimal,
    /// Balance on the bucket's normal side; negative for contra balances.
    pub balance: Decimal,
}

/// Profit and loss view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    /// Income accounts with a non-zero balance.
    pub income: Vec<StatementLine>,
    /// Expense accounts with a non-zero balance.
    pub expenses: Vec<StatementLine>,
    /// Total income.
    pub total_income: Decimal,
    /// Total expenses.
    pub total_expenses: Decimal,
    /// Total income minus total expenses; negative for a loss.
    pub net_profit: Decimal,
}

/// Balance sheet totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetTotals {
    /// Total assets.
    pub assets: Decimal,
    /// Total liabilities.
    pub liabilities: Decimal,
    /// Total equity, including the current year result.
    pub equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
}

/// Balance sheet view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    /// Asset accounts with a non-zero balance.
    pub assets: Vec<StatementLine>,
    /// Liability accounts with a non-zero balance.
    pub liabilities: Vec<StatementLine>,
    /// Equity accounts, followed by the synthetic current year line.
    pub equity: Vec<StatementLine>,
    /// Totals.
    pub totals: BalanceSheetTotals,
    /// Whether assets equal liabilities plus equity. Advisory only.
    pub is_balanced: bool,
}

impl BalanceSheet {
    /// Returns liabilities and equity merged into a single list.
    #[must_use]
    pub fn liabilities_and_equity(&self) -> Vec<StatementLine> {
        self.liabilities
            .iter()
            .chain(self.equity.iter())
            .cloned()
            .collect()
    }
}

/// A shape problem found in a ledger row.
///
/// Issues are advisory: the trial balance still folds every row leniently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    /// Row names neither a debit nor a credit account.
    NoAccounts {
        /// Position of the row in its batch.
        index: usize,
        /// Row ID, if any.
        id: Option<String>,
    },
    /// Row debits and credits the same account.
    SameAccount {
        /// Position of the row in its batch.
        index: usize,
        /// Row ID, if any.
        id: Option<String>,
        /// The repeated account.
        account: String,
    },
    /// Row carries a negative amount.
    NegativeAmount {
        /// Position of the row in its batch.
        index: usize,
        /// Row ID, if any.
        id: Option<String>,
        /// The offending amount.
        amount: Decimal,
    },
}
