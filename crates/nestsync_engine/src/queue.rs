//! The deduplicated pending-mutation queue.

use nestsync_model::{MutationType, QueuedMutation};
use serde_json::Value;

/// What became of a queue entry after a failed push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The entry stays queued for the next drain pass.
    Retained,
    /// The entry hit the retry ceiling and was dropped (permanent failure).
    Dropped,
}

/// In-memory, deduplicated, ordered collection of pending mutations.
///
/// The queue holds **at most one entry per [`MutationType`]**: enqueuing a
/// type that is already queued replaces the existing entry in place
/// (last-writer-wins per type) and resets its retry count. The queue tracks
/// "latest known value to push for this type", not a log of edits - if one
/// type tag covers several independently-editable records, only the most
/// recently enqueued record's edit survives a coalesce.
///
/// The queue is a plain value type; the controller owns it behind a lock and
/// mirrors it to the persistent store after every mutation. Two drain passes
/// never mutate it concurrently.
#[derive(Debug, Clone)]
pub struct MutationQueue {
    entries: Vec<QueuedMutation>,
    retry_ceiling: u32,
}

impl MutationQueue {
    /// Creates an empty queue with the given retry ceiling.
    #[must_use]
    pub fn new(retry_ceiling: u32) -> Self {
        Self {
            entries: Vec::new(),
            retry_ceiling,
        }
    }

    /// Restores a queue from a persisted snapshot.
    #[must_use]
    pub fn from_entries(entries: Vec<QueuedMutation>, retry_ceiling: u32) -> Self {
        Self {
            entries,
            retry_ceiling,
        }
    }

    /// Inserts or replaces the entry for `ty`. Always succeeds.
    ///
    /// A replaced slot keeps its position in drain order; only the id,
    /// payload, timestamp, and retry count change.
    pub fn enqueue(&mut self, ty: MutationType, payload: Value) -> QueuedMutation {
        let mutation = QueuedMutation::new(ty, payload);
        match self.entries.iter_mut().find(|e| e.mutation_type == ty) {
            Some(slot) => *slot = mutation.clone(),
            None => self.entries.push(mutation.clone()),
        }
        mutation
    }

    /// Returns the current queue contents in insertion order.
    ///
    /// Oldest type-slot first; no stricter ordering is needed because each
    /// type targets an independent remote collection.
    #[must_use]
    pub fn drain_candidates(&self) -> Vec<QueuedMutation> {
        self.entries.clone()
    }

    /// Removes the entry with `id` after a successful push.
    ///
    /// Returns false if the entry is gone - e.g. a newer edit of the same
    /// type replaced it (under a fresh id) while the push was in flight, in
    /// which case the newer entry must stay queued.
    pub fn mark_succeeded(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Records a failed push attempt for the entry with `id`.
    ///
    /// Increments the retry count; once it reaches the ceiling the entry is
    /// dropped and the drop is reported as a permanent failure. Returns
    /// `None` if the entry was already replaced or removed.
    pub fn mark_failed(&mut self, id: &str) -> Option<FailureOutcome> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        self.entries[idx].retry_count += 1;
        if self.entries[idx].retry_count >= self.retry_ceiling {
            self.entries.remove(idx);
            Some(FailureOutcome::Dropped)
        } else {
            Some(FailureOutcome::Retained)
        }
    }

    /// Number of pending mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The entries as persisted in the queue snapshot slot.
    #[must_use]
    pub fn entries(&self) -> &[QueuedMutation] {
        &self.entries
    }
}
