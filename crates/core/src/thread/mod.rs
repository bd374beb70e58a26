//! Conversation thread: response normalization, timeline, and session state.
//!
//! Orchestrator responses arrive in several loosely typed shapes. The
//! normalizer classifies each one into exactly one [`ThreadEntry`] and appends
//! it to the session timeline.

pub mod adapter;
pub mod normalizer;
pub mod session;
pub mod timeline;
pub mod types;


pub use adapter::{RawResponse, normalize_document_fields};
pub use normalizer::{Normalized, Normalizer};
pub use session::Session;
pub use timeline::{Timeline, TimelineEntry};
pub use types::*;
