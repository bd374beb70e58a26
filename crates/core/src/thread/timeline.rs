//! Append-only thread timeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::ThreadEntry;

/// A timeline item with its arrival metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Position in the timeline.
    pub index: usize,
    /// When the response was normalized.
    pub received_at: DateTime<Utc>,
    /// Sequence number drawn when the request behind it was issued.
    pub issue_seq: u64,
    /// The normalized entry.
    pub entry: ThreadEntry,
}

/// Ordered list of normalized responses.
///
/// Entries are only ever appended; nothing is edited in place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: ThreadEntry, issue_seq: u64) -> usize {
        let index = self.entries.len();
        self.entries.push(TimelineEntry {
            index,
            received_at: Utc::now(),
            issue_seq,
            entry,
        });
        index
    }

    /// Returns the entry at a position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    /// Iterates entries in arrival order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
