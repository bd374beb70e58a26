//! Chart of accounts classification.
//!
//! Maps free-text account names to statement buckets by keyword membership:
//! - `types` - The statement bucket enumeration
//! - `rules` - Ordered keyword rule sets and the classifier itself

pub mod rules;
pub mod types;


pub use rules::{ClassifierRules, classify};
pub use types::StatementBucket;
