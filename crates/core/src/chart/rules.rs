//! Keyword rule sets and account classification.

use serde::Serialize;
use tallybook_shared::config::ChartConfig;

use super::types::StatementBucket;

const DEFAULT_INCOME: &[&str] = &[
    "income",
    "revenue",
    "sales",
    "fees earned",
    "commission received",
    "interest received",
    "interest earned",
    "rent received",
    "discount received",
    "dividend received",
];

const DEFAULT_EXPENSES: &[&str] = &[
    "expense",
    "rent",
    "salary",
    "salaries",
    "wages",
    "utilities",
    "electricity",
    "telephone",
    "internet",
    "purchase",
    "cost of",
    "depreciation",
    "insurance",
    "advertising",
    "marketing",
    "repairs",
    "maintenance",
    "fuel",
    "travel",
    "supplies",
    "stationery",
    "bank charges",
    "interest paid",
    "discount allowed",
    "bad debt",
    "freight",
    "postage",
    "subscription",
];

const DEFAULT_ASSETS: &[&str] = &[
    "cash",
    "bank",
    "receivable",
    "debtor",
    "inventory",
    "stock",
    "equipment",
    "machinery",
    "furniture",
    "fixture",
    "building",
    "land",
    "vehicle",
    "computer",
    "prepaid",
    "investment",
    "goodwill",
    "asset",
];

const DEFAULT_LIABILITIES: &[&str] = &[
    "payable",
    "creditor",
    "loan",
    "overdraft",
    "accrued",
    "outstanding",
    "unearned",
    "deferred",
    "mortgage",
    "borrowing",
    "credit card",
    "gst",
    "vat",
    "tax",
    "liabilit",
];

const DEFAULT_EQUITY: &[&str] = &[
    "capital",
    "equity",
    "drawing",
    "retained",
    "reserve",
    "owner",
    "share",
    "partner",
    "proprietor",
];

/// Ordered keyword lists used to classify account names.
///
/// Lists are consulted in the fixed priority order income, expenses, assets,
/// liabilities, equity; the first list containing a keyword that is a
/// substring of the lowercased, trimmed account name wins. The order is what
/// resolves overlaps such as "Loan interest income".
///
/// A keyword only matches where a word starts, so "rent" finds "Office Rent"
/// and "Rental" but not "Current Assets" or "Parent Company Loan".
///
/// Rule sets are only built through [`Self::new`], [`Self::from_config`] or
/// `Default`, so every keyword is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierRules {
    income: Vec<String>,
    expenses: Vec<String>,
    assets: Vec<String>,
    liabilities: Vec<String>,
    equity: Vec<String>,
}

impl ClassifierRules {
    /// Builds a rule set from caller-supplied keyword lists.
    ///
    /// Keywords are trimmed and lowercased; blank keywords are dropped since an
    /// empty substring would match every account.
    #[must_use]
    pub fn new<S: AsRef<str>>(
        income: &[S],
        expenses: &[S],
        assets: &[S],
        liabilities: &[S],
        equity: &[S],
    ) -> Self {
        Self {
            income: normalize_keywords(income),
            expenses: normalize_keywords(expenses),
            assets: normalize_keywords(assets),
            liabilities: normalize_keywords(liabilities),
            equity: normalize_keywords(equity),
        }
    }

    /// Builds a rule set from configuration, keeping defaults for unset lists.
    #[must_use]
    pub fn from_config(config: &ChartConfig) -> Self {
        let defaults = Self::default();
        let pick = |configured: &Option<Vec<String>>, fallback: Vec<String>| {
            configured
                .as_deref()
                .map_or(fallback, normalize_keywords)
        };

        Self {
            income: pick(&config.income, defaults.income),
            expenses: pick(&config.expenses, defaults.expenses),
            assets: pick(&config.assets, defaults.assets),
            liabilities: pick(&config.liabilities, defaults.liabilities),
            equity: pick(&config.equity, defaults.equity),
        }
    }

    /// Returns the keywords for a bucket (empty for `Uncategorized`).
    #[must_use]
    pub fn keywords(&self, bucket: StatementBucket) -> &[String] {
        match bucket {
            StatementBucket::Income => &self.income,
            StatementBucket::Expenses => &self.expenses,
            StatementBucket::Assets => &self.assets,
            StatementBucket::Liabilities => &self.liabilities,
            StatementBucket::Equity => &self.equity,
            StatementBucket::Uncategorized => &[],
        }
    }

    /// Classifies an account name.
    #[must_use]
    pub fn classify(&self, name: &str) -> StatementBucket {
        let needle = name.trim().to_lowercase();

        StatementBucket::ALL
            .into_iter()
            .find(|bucket| {
                self.keywords(*bucket)
                    .iter()
                    .any(|keyword| contains_at_word_start(&needle, keyword))
            })
            .unwrap_or(StatementBucket::Uncategorized)
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_INCOME,
            DEFAULT_EXPENSES,
            DEFAULT_ASSETS,
            DEFAULT_LIABILITIES,
            DEFAULT_EQUITY,
        )
    }
}

/// Classifies an account name against a rule set.
#[must_use]
pub fn classify(name: &str, rules: &ClassifierRules) -> StatementBucket {
    rules.classify(name)
}

fn contains_at_word_start(name: &str, keyword: &str) -> bool {
    name.match_indices(keyword).any(|(at, _)| {
        name[..at]
            .chars()
            .next_back()
            .is_none_or(|previous| !previous.is_alphanumeric())
    })
}

fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}
