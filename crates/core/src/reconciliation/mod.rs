//! Bank reconciliation suggestion consumer.

pub mod error;
pub mod inbox;
pub mod types;


pub use error::ReconciliationError;
pub use inbox::{ReconciliationGateway, ReconciliationInbox};
pub use types::*;
