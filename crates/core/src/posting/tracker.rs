//! Active preview tracking.
//!
//! Each preview request draws a sequence number when it is issued. The active
//! preview is the one from the newest settled issue; a response to an older
//! issue that arrives late is kept in the timeline but never becomes active.

use std::collections::HashMap;

use serde::Serialize;

use super::error::IntegrityFailure;
use super::types::PostingPhase;
use crate::thread::ThreadEntry;

/// The preview currently eligible for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePreview {
    /// Opaque preview token.
    pub preview_id: String,
    /// Content-integrity digest.
    pub hash: String,
    /// Timeline index of the preview entry.
    pub entry_index: usize,
    /// Sequence number of the request that produced it.
    pub issue_seq: u64,
    /// Number of journal lines, for patch bounds checks.
    pub journal_len: usize,
}

impl ActivePreview {
    fn pair(&self) -> (String, String) {
        (self.preview_id.clone(), self.hash.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retired {
    Consumed,
    Superseded,
}

/// Sequence numbers, the active preview, and retired pairs for one session.
#[derive(Debug, Clone, Default)]
pub struct PreviewTracker {
    next_seq: u64,
    floor: u64,
    active: Option<ActivePreview>,
    retired: HashMap<(String, String), Retired>,
    phase: PostingPhase,
}

impl PreviewTracker {
    /// Returns the active preview.
    #[must_use]
    pub const fn active(&self) -> Option<&ActivePreview> {
        self.active.as_ref()
    }

    /// Returns the protocol phase.
    #[must_use]
    pub const fn phase(&self) -> PostingPhase {
        self.phase
    }

    /// Draws the next sequence number.
    pub(crate) fn issue(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Draws a sequence number for an outgoing draft.
    pub(crate) fn begin(&mut self) -> u64 {
        self.phase = PostingPhase::Drafted;
        self.issue()
    }

    /// Draws a sequence number for a patch and retires the active preview at
    /// once, so neither it nor any older in-flight preview can be confirmed.
    pub(crate) fn begin_patch(&mut self) -> u64 {
        let seq = self.begin();
        self.retire_active(Retired::Superseded);
        self.floor = seq;
        seq
    }

    /// Records the outcome of an issued request.
    ///
    /// Returns true if the entry became the active preview.
    pub(crate) fn settle(&mut self, issue_seq: u64, entry_index: usize, entry: &ThreadEntry) -> bool {
        let snapshot = entry.as_preview().and_then(|preview| {
            let (preview_id, hash) = preview.snapshot()?;
            Some(ActivePreview {
                preview_id: preview_id.to_string(),
                hash: hash.to_string(),
                entry_index,
                issue_seq,
                journal_len: preview.journal.len(),
            })
        });

        if issue_seq < self.floor {
            if let Some(stale) = snapshot {
                self.retired.entry(stale.pair()).or_insert(Retired::Superseded);
            }
            return false;
        }

        self.floor = issue_seq;
        if let Some(previous) = self.active.take()
            && snapshot
                .as_ref()
                .is_none_or(|candidate| candidate.pair() != previous.pair())
        {
            self.retired.insert(previous.pair(), Retired::Superseded);
        }
        self.phase = match entry {
            ThreadEntry::Preview(_) => PostingPhase::Previewed,
            ThreadEntry::Followup { .. } => PostingPhase::FollowupNeeded,
            ThreadEntry::Legacy { .. } => PostingPhase::Idle,
            ThreadEntry::Error { .. } | ThreadEntry::Raw { .. } => PostingPhase::Failed,
        };

        match snapshot {
            Some(candidate) if !self.retired.contains_key(&candidate.pair()) => {
                self.active = Some(candidate);
                true
            }
            _ => false,
        }
    }

    /// Records that an issued request failed in transport.
    pub(crate) fn fail(&mut self, issue_seq: u64) {
        if issue_seq >= self.floor {
            self.phase = PostingPhase::Failed;
        }
    }

    /// Checks a pair against the active preview without sending anything.
    ///
    /// # Errors
    ///
    /// Returns the reason the pair cannot be confirmed.
    pub fn check(&self, preview_id: &str, hash: &str) -> Result<&ActivePreview, IntegrityFailure> {
        let pair = (preview_id.to_string(), hash.to_string());
        match self.retired.get(&pair) {
            Some(Retired::Consumed) => {
                return Err(IntegrityFailure::Consumed {
                    preview_id: preview_id.to_string(),
                });
            }
            Some(Retired::Superseded) => {
                return Err(IntegrityFailure::Superseded {
                    preview_id: preview_id.to_string(),
                });
            }
            None => {}
        }
        let active = self.active.as_ref().ok_or(IntegrityFailure::NoActivePreview)?;
        if active.preview_id != preview_id || active.hash != hash {
            return Err(IntegrityFailure::Mismatch {
                preview_id: preview_id.to_string(),
            });
        }
        Ok(active)
    }

    /// True if the pair has already been posted.
    #[must_use]
    pub fn is_consumed(&self, preview_id: &str, hash: &str) -> bool {
        self.retired
            .get(&(preview_id.to_string(), hash.to_string()))
            .is_some_and(|reason| *reason == Retired::Consumed)
    }

    /// Marks the active preview as confirmed.
    pub(crate) fn consume(&mut self) {
        self.retire_active(Retired::Consumed);
        self.phase = PostingPhase::Confirmed;
    }

    /// Retires the pair of a timeline entry whose post the server refused on
    /// integrity grounds.
    ///
    /// Only the refused entry is retired; a newer active preview stays
    /// confirmable. Returns true if the refused entry was the active preview.
    pub(crate) fn invalidate(&mut self, entry_index: usize, pair: Option<(&str, &str)>) -> bool {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.entry_index == entry_index)
        {
            self.retire_active(Retired::Superseded);
            self.phase = PostingPhase::Failed;
            return true;
        }
        if let Some((preview_id, hash)) = pair {
            self.retired
                .entry((preview_id.to_string(), hash.to_string()))
                .or_insert(Retired::Superseded);
        }
        false
    }

    /// Retires a pair that was confirmed outside the preview flow.
    pub(crate) fn consume_pair(&mut self, preview_id: &str, hash: &str) {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.preview_id == preview_id && active.hash == hash)
        {
            self.active = None;
        }
        self.retired
            .insert((preview_id.to_string(), hash.to_string()), Retired::Consumed);
        self.phase = PostingPhase::Confirmed;
    }

    fn retire_active(&mut self, reason: Retired) {
        if let Some(active) = self.active.take() {
            self.retired.insert(active.pair(), reason);
        }
    }
}
