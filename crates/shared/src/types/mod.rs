//! Common types used across the application.

pub mod amount;
pub mod id;

pub use amount::{
    coerce_amount, coerce_id, coerce_text, from_minor_units, lenient_amount, lenient_id,
    lenient_text,
};
pub use id::*;
