//! Per-conversation session state.

use std::collections::BTreeMap;

use tallybook_shared::types::SessionId;

use super::normalizer::Normalized;
use super::timeline::Timeline;
use super::types::{SaveStatus, SessionStatus};
use crate::posting::{ActivePreview, PostingPhase, PreviewTracker};

/// One conversation: its timeline, status, and posting state.
///
/// Sessions are created, appended to, and reset or dropped. Every operation
/// takes the session explicitly; nothing is global.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    timeline: Timeline,
    status: SessionStatus,
    last_response_type: Option<String>,
    last_prompt: Option<String>,
    save_status: BTreeMap<usize, SaveStatus>,
    previews: PreviewTracker,
}

impl Session {
    /// Starts a new session with a fresh ID.
    #[must_use]
    pub fn start() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Starts a session with a known ID.
    #[must_use]
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            timeline: Timeline::new(),
            status: SessionStatus::Idle,
            last_response_type: None,
            last_prompt: None,
            save_status: BTreeMap::new(),
            previews: PreviewTracker::default(),
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the timeline.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the type of the last legacy response with valid results.
    #[must_use]
    pub fn last_response_type(&self) -> Option<&str> {
        self.last_response_type.as_deref()
    }

    /// Returns the last natural-language prompt sent for preview.
    #[must_use]
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    /// Returns the save status recorded for a timeline entry.
    #[must_use]
    pub fn save_status(&self, index: usize) -> Option<&SaveStatus> {
        self.save_status.get(&index)
    }

    /// Returns every recorded save status, keyed by timeline index.
    #[must_use]
    pub const fn save_statuses(&self) -> &BTreeMap<usize, SaveStatus> {
        &self.save_status
    }

    /// Returns the preview currently eligible for confirmation.
    #[must_use]
    pub fn active_preview(&self) -> Option<&ActivePreview> {
        self.previews.active()
    }

    /// Returns where the session is in the preview/confirm protocol.
    #[must_use]
    pub const fn phase(&self) -> PostingPhase {
        self.previews.phase()
    }

    /// Clears the timeline and all posting state, keeping the session ID.
    pub fn reset(&mut self) {
        *self = Self::with_id(self.id);
    }

    pub(crate) fn append(&mut self, normalized: Normalized, issue_seq: Option<u64>) -> usize {
        let Normalized {
            entry,
            status,
            response_type,
        } = normalized;
        self.status = status;
        if response_type.is_some() {
            self.last_response_type = response_type;
        }
        let seq = issue_seq.unwrap_or_else(|| self.previews.issue());
        let index = self.timeline.len();
        self.previews.settle(seq, index, &entry);
        self.timeline.push(entry, seq)
    }

    pub(crate) fn remember_prompt(&mut self, prompt: &str) {
        self.last_prompt = Some(prompt.to_string());
    }

    pub(crate) fn annotate(&mut self, index: usize, status: SaveStatus) {
        self.save_status.insert(index, status);
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub(crate) const fn previews(&self) -> &PreviewTracker {
        &self.previews
    }

    pub(crate) fn previews_mut(&mut self) -> &mut PreviewTracker {
        &mut self.previews
    }
}
