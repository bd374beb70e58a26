//! Core business logic for Tallybook.
//!
//! This crate contains pure client logic with ZERO transport or storage
//! dependencies. Collaborators (ledger store, posting endpoints, reconciliation
//! service) are reached through traits implemented elsewhere.
//!
//! # Modules
//!
//! - `chart` - Account name classification into statement buckets
//! - `reports` - Trial balance, profit and loss, balance sheet
//! - `thread` - Response normalization, timeline and session state
//! - `posting` - Preview/confirm protocol with integrity checks
//! - `reconciliation` - Bank reconciliation suggestion consumer

pub mod chart;
pub mod posting;
pub mod reconciliation;
pub mod reports;
pub mod thread;
