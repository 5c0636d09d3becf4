//! Mutation types and queued mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide tie-breaker so ids minted within the same millisecond stay
// distinct.
static NEXT_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// The closed set of syncable state slots.
///
/// Each variant maps to one remote target collection. The mutation queue
/// holds at most one pending entry per variant; adding a variant here is how
/// a new domain entity becomes syncable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// Room layout and decoration state.
    Room,
    /// Usage statistics.
    Stats,
    /// User settings.
    Settings,
    /// Mascot state.
    Mascot,
    /// Collection progress.
    Collection,
}

impl MutationType {
    /// All mutation types, in their canonical order.
    pub const ALL: [MutationType; 5] = [
        MutationType::Room,
        MutationType::Stats,
        MutationType::Settings,
        MutationType::Mascot,
        MutationType::Collection,
    ];

    /// Returns the snake_case tag for this type.
    ///
    /// Matches the serde representation; used in mutation ids and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationType::Room => "room",
            MutationType::Stats => "stats",
            MutationType::Settings => "settings",
            MutationType::Mascot => "mascot",
            MutationType::Collection => "collection",
        }
    }
}

impl std::fmt::Display for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending state push for one [`MutationType`].
///
/// The payload carries the full new state for that slot, not a diff.
/// `retry_count` is advanced only by the drain step; it resets to zero when
/// a newer edit of the same type replaces the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    /// Queue bookkeeping token, unique within the queue.
    pub id: String,
    /// Which state slot this mutation targets.
    pub mutation_type: MutationType,
    /// Full new state for the slot.
    pub payload: serde_json::Value,
    /// When the mutation was enqueued.
    pub enqueued_at: DateTime<Utc>,
    /// Failed push attempts so far.
    pub retry_count: u32,
}

impl QueuedMutation {
    /// Creates a new mutation timestamped now, with no retries recorded.
    ///
    /// The id is the enqueue timestamp in milliseconds, a process-wide
    /// counter, and the type tag. Every id is unique, even for back-to-back
    /// edits within one millisecond: the queue's in-flight bookkeeping
    /// distinguishes an entry from its replacement by id alone, so a
    /// collision would let a stale acknowledgment remove the newer edit.
    pub fn new(mutation_type: MutationType, payload: serde_json::Value) -> Self {
        let enqueued_at = Utc::now();
        let seq = NEXT_ID_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!(
                "{}-{}-{}",
                enqueued_at.timestamp_millis(),
                seq,
                mutation_type
            ),
            mutation_type,
            payload,
            enqueued_at,
            retry_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_match_serde() {
        for ty in MutationType::ALL {
            let encoded = serde_json::to_string(&ty).unwrap();
            assert_eq!(encoded, format!("\"{ty}\""));
        }
    }

    #[test]
    fn all_covers_every_variant() {
        assert_eq!(MutationType::ALL.len(), 5);
        let mut tags: Vec<_> = MutationType::ALL.iter().map(|t| t.as_str()).collect();
        tags.dedup();
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn new_mutation_starts_unretried() {
        let m = QueuedMutation::new(MutationType::Stats, json!({"focus_minutes": 25}));
        assert_eq!(m.retry_count, 0);
        assert_eq!(m.mutation_type, MutationType::Stats);
        assert!(m.id.ends_with("-stats"));
    }

    #[test]
    fn back_to_back_ids_of_one_type_are_distinct() {
        // Both mutations land within the same millisecond; a shared id
        // would let an acknowledgment for the first remove the second.
        let a = QueuedMutation::new(MutationType::Stats, json!({"sessions": 1}));
        let b = QueuedMutation::new(MutationType::Stats, json!({"sessions": 2}));
        assert_ne!(a.id, b.id);

        let ids: Vec<String> = (0..100)
            .map(|_| QueuedMutation::new(MutationType::Room, json!(null)).id)
            .collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn mutation_round_trips_through_json() {
        let m = QueuedMutation::new(MutationType::Mascot, json!({"mood": "sleepy"}));
        let bytes = serde_json::to_vec(&m).unwrap();
        let back: QueuedMutation = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, m);
    }
}
