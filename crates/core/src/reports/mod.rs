//! Financial report derivation.
//!
//! This module provides pure business logic for deriving financial reports
//! from double-entry ledger rows:
//! - Trial Balance
//! - Profit and Loss
//! - Balance Sheet
//! - Row shape checks

pub mod book;
pub mod error;
pub mod service;
pub mod types;


pub use book::{LedgerBook, LedgerSource};
pub use error::ReportError;
pub use service::{CURRENT_YEAR_LOSS, CURRENT_YEAR_PROFIT, ReportService, UNSPECIFIED_ACCOUNT};
pub use types::*;
