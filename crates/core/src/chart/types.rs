//! Statement bucket types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Financial statement bucket an account is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementBucket {
    /// Resources owned (cash, receivables, equipment).
    Assets,
    /// Obligations owed (payables, loans).
    Liabilities,
    /// Owner's stake (capital, drawings, retained earnings).
    Equity,
    /// Revenue earned.
    Income,
    /// Costs incurred.
    Expenses,
    /// No keyword matched.
    Uncategorized,
}

impl StatementBucket {
    /// Every bucket, in classification priority order.
    pub const ALL: [Self; 6] = [
        Self::Income,
        Self::Expenses,
        Self::Assets,
        Self::Liabilities,
        Self::Equity,
        Self::Uncategorized,
    ];

    /// Returns the string representation of the bucket.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Liabilities => "liabilities",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expenses => "expenses",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Returns true if the bucket carries a debit-normal balance.
    ///
    /// Assets and expenses grow with debits; liabilities, equity and income
    /// grow with credits.
    #[must_use]
    pub const fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Assets | Self::Expenses)
    }

    /// Returns true if the bucket belongs on the profit and loss statement.
    #[must_use]
    pub const fn is_profit_and_loss(&self) -> bool {
        matches!(self, Self::Income | Self::Expenses)
    }
}

impl fmt::Display for StatementBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
