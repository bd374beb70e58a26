//! Report generation service.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;

use super::error::ReportError;
use super::types::{
    AccountBalance, BalanceSheet, BalanceSheetTotals, LedgerRow, ProfitAndLoss, RowIssue,
    StatementLine, TrialBalance, TrialBalanceTotals,
};
use crate::chart::{ClassifierRules, StatementBucket};

/// Bucket name for blank account names.
pub const UNSPECIFIED_ACCOUNT: &str = "(Unspecified)";

/// Label of the synthetic equity line carrying a positive result.
pub const CURRENT_YEAR_PROFIT: &str = "Current Year Profit";

/// Label of the synthetic equity line carrying a negative result.
pub const CURRENT_YEAR_LOSS: &str = "Current Year Loss";

/// Service for deriving financial reports from ledger rows.
pub struct ReportService;

impl ReportService {
    /// Decodes a JSON array of ledger rows.
    ///
    /// Non-object items are skipped; fields inside objects are read leniently.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidPayload` if the payload is not an array.
    pub fn rows_from_json(payload: &Value) -> Result<Vec<LedgerRow>, ReportError> {
        let items = payload
            .as_array()
            .ok_or_else(|| ReportError::InvalidPayload("expected an array of rows".to_string()))?;

        Ok(items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect())
    }

    /// Folds ledger rows into per-account debit and credit totals.
    ///
    /// Accounts are keyed case-insensitively on the trimmed name and displayed
    /// with the first spelling seen. A row side that is absent or empty posts
    /// nothing; a whitespace-only name posts to `(Unspecified)`. Rows naming
    /// no account at all are skipped.
    #[must_use]
    pub fn trial_balance(rows: &[LedgerRow]) -> TrialBalance {
        let mut balances: HashMap<String, AccountBalance> = HashMap::new();

        for row in rows {
            if let Some(account) = posting_account(row.debit_account.as_deref()) {
                Self::entry(&mut balances, account).debit_total += row.amount;
            }
            if let Some(account) = posting_account(row.credit_account.as_deref()) {
                Self::entry(&mut balances, account).credit_total += row.amount;
            }
        }

        let mut accounts: Vec<AccountBalance> = balances.into_values().collect();
        accounts.sort_by(|a, b| a.account.cmp(&b.account));

        let total_debit: Decimal = accounts.iter().map(|a| a.debit_total).sum();
        let total_credit: Decimal = accounts.iter().map(|a| a.credit_total).sum();

        TrialBalance {
            accounts,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }

    /// Derives the profit and loss view from ledger rows.
    #[must_use]
    pub fn profit_and_loss(rows: &[LedgerRow], rules: &ClassifierRules) -> ProfitAndLoss {
        Self::profit_and_loss_from(&Self::trial_balance(rows), rules)
    }

    /// Derives the profit and loss view from a computed trial balance.
    ///
    /// Only income and expense accounts with a non-zero balance appear. The
    /// sign of `net_profit` is preserved; labelling it is left to the caller.
    #[must_use]
    pub fn profit_and_loss_from(trial_balance: &TrialBalance, rules: &ClassifierRules) -> ProfitAndLoss {
        let mut income = Vec::new();
        let mut expenses = Vec::new();

        for balance in &trial_balance.accounts {
            match rules.classify(&balance.account) {
                StatementBucket::Income => {
                    push_line(&mut income, balance, StatementBucket::Income);
                }
                StatementBucket::Expenses => {
                    push_line(&mut expenses, balance, StatementBucket::Expenses);
                }
                _ => {}
            }
        }

        let total_income = section_total(&income);
        let total_expenses = section_total(&expenses);

        ProfitAndLoss {
            income,
            expenses,
            total_income,
            total_expenses,
            net_profit: total_income - total_expenses,
        }
    }

    /// Derives the balance sheet view from ledger rows.
    #[must_use]
    pub fn balance_sheet(rows: &[LedgerRow], rules: &ClassifierRules) -> BalanceSheet {
        Self::balance_sheet_from(&Self::trial_balance(rows), rules)
    }

    /// Derives the balance sheet view from a computed trial balance.
    ///
    /// The period result is folded into equity as a synthetic line labelled
    /// by its sign. Whether assets equal liabilities plus equity is reported in
    /// `is_balanced`, never enforced.
    #[must_use]
    pub fn balance_sheet_from(trial_balance: &TrialBalance, rules: &ClassifierRules) -> BalanceSheet {
        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();

        for balance in &trial_balance.accounts {
            match rules.classify(&balance.account) {
                StatementBucket::Assets => push_line(&mut assets, balance, StatementBucket::Assets),
                StatementBucket::Liabilities => {
                    push_line(&mut liabilities, balance, StatementBucket::Liabilities);
                }
                StatementBucket::Equity => push_line(&mut equity, balance, StatementBucket::Equity),
                _ => {}
            }
        }

        let net_profit = Self::profit_and_loss_from(trial_balance, rules).net_profit;
        if !net_profit.is_zero() {
            let label = if net_profit.is_sign_positive() {
                CURRENT_YEAR_PROFIT
            } else {
                CURRENT_YEAR_LOSS
            };
            equity.push(StatementLine {
                account: label.to_string(),
                amount: net_profit.abs(),
                balance: net_profit,
            });
        }

        let total_assets = section_total(&assets);
        let total_liabilities = section_total(&liabilities);
        let total_equity = section_total(&equity);
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheet {
            assets,
            liabilities,
            equity,
            totals: BalanceSheetTotals {
                assets: total_assets,
                liabilities: total_liabilities,
                equity: total_equity,
                liabilities_and_equity,
            },
            is_balanced: total_assets == liabilities_and_equity,
        }
    }

    /// Reports rows that break the double-entry shape rules.
    ///
    /// The trial balance stays lenient; this is for surfacing warnings.
    #[must_use]
    pub fn validate_rows(rows: &[LedgerRow]) -> Vec<RowIssue> {
        let mut issues = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let debit = posting_account(row.debit_account.as_deref());
            let credit = posting_account(row.credit_account.as_deref());

            match (debit, credit) {
                (None, None) => issues.push(RowIssue::NoAccounts {
                    index,
                    id: row.id.clone(),
                }),
                (Some(debit), Some(credit)) if debit.to_lowercase() == credit.to_lowercase() => {
                    issues.push(RowIssue::SameAccount {
                        index,
                        id: row.id.clone(),
                        account: debit.to_string(),
                    });
                }
                _ => {}
            }

            if row.amount.is_sign_negative() && !row.amount.is_zero() {
                issues.push(RowIssue::NegativeAmount {
                    index,
                    id: row.id.clone(),
                    amount: row.amount,
                });
            }
        }

        issues
    }

    fn entry<'a>(
        balances: &'a mut HashMap<String, AccountBalance>,
        account: &str,
    ) -> &'a mut AccountBalance {
        balances
            .entry(account.to_lowercase())
            .or_insert_with(|| AccountBalance {
                account: account.to_string(),
                debit_total: Decimal::ZERO,
                credit_total: Decimal::ZERO,
            })
    }
}

/// Resolves the account a row side posts to.
fn posting_account(raw: Option<&str>) -> Option<&str> {
    match raw {
        None | Some("") => None,
        Some(name) => {
            let trimmed = name.trim();
            Some(if trimmed.is_empty() {
                UNSPECIFIED_ACCOUNT
            } else {
                trimmed
            })
        }
    }
}

fn push_line(section: &mut Vec<StatementLine>, balance: &AccountBalance, bucket: StatementBucket) {
    let net = balance.net();
    if net.is_zero() {
        return;
    }

    section.push(StatementLine {
        account: balance.account.clone(),
        amount: net.abs(),
        balance: if bucket.is_debit_normal() { net } else { -net },
    });
}

fn section_total(section: &[StatementLine]) -> Decimal {
    section.iter().map(|line| line.balance).sum()
}
