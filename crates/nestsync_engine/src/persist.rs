//! Persistence glue for the two engine slots.
//!
//! The engine mirrors the pending queue and the last-successful-sync
//! timestamp into the slot store after every queue mutation, so both survive
//! process restarts. An absent slot is a valid initial state. Store failures
//! here are non-fatal by contract: the controller logs them and keeps
//! operating in memory, retrying on the next mutation.

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use nestsync_model::QueuedMutation;
use nestsync_store::StoreBackend;

/// Slot holding the serialized pending-mutation queue.
pub const QUEUE_KEY: &str = "sync.queue";

/// Slot holding the last-successful-sync timestamp (RFC 3339).
pub const LAST_SYNCED_KEY: &str = "sync.last_synced_at";

/// Writes the queue snapshot slot.
pub fn save_queue<S: StoreBackend>(store: &S, entries: &[QueuedMutation]) -> EngineResult<()> {
    let bytes = serde_json::to_vec(entries)?;
    store.set(QUEUE_KEY, &bytes)?;
    Ok(())
}

/// Reads the queue snapshot slot; an absent slot is an empty queue.
pub fn load_queue<S: StoreBackend>(store: &S) -> EngineResult<Vec<QueuedMutation>> {
    match store.get(QUEUE_KEY)? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(Vec::new()),
    }
}

/// Writes the last-successful-sync timestamp slot.
pub fn save_last_synced<S: StoreBackend>(store: &S, at: DateTime<Utc>) -> EngineResult<()> {
    let bytes = serde_json::to_vec(&at)?;
    store.set(LAST_SYNCED_KEY, &bytes)?;
    Ok(())
}

/// Reads the last-successful-sync timestamp slot, if ever written.
pub fn load_last_synced<S: StoreBackend>(store: &S) -> EngineResult<Option<DateTime<Utc>>> {
    match store.get(LAST_SYNCED_KEY)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestsync_model::MutationType;
    use nestsync_store::InMemoryStore;
    use serde_json::json;

    #[test]
    fn queue_round_trip() {
        let store = InMemoryStore::new();
        let entries = vec![
            QueuedMutation::new(MutationType::Room, json!({"wallpaper": "forest"})),
            QueuedMutation::new(MutationType::Stats, json!({"sessions": 4})),
        ];

        save_queue(&store, &entries).unwrap();
        assert_eq!(load_queue(&store).unwrap(), entries);
    }

    #[test]
    fn absent_slots_are_initial_state() {
        let store = InMemoryStore::new();
        assert!(load_queue(&store).unwrap().is_empty());
        assert!(load_last_synced(&store).unwrap().is_none());
    }

    #[test]
    fn timestamp_round_trip_is_rfc3339() {
        let store = InMemoryStore::new();
        let at = Utc::now();
        save_last_synced(&store, at).unwrap();
        assert_eq!(load_last_synced(&store).unwrap(), Some(at));

        let raw = store.get(LAST_SYNCED_KEY).unwrap().unwrap();
        let text = String::from_utf8(raw).unwrap();
        // A JSON string holding an ISO-8601/RFC 3339 timestamp.
        assert!(text.starts_with('"') && text.contains('T') && text.ends_with('"'));
    }

    #[test]
    fn corrupt_queue_slot_is_an_error_not_a_panic() {
        let store = InMemoryStore::new();
        store.set(QUEUE_KEY, b"not json").unwrap();
        assert!(load_queue(&store).is_err());
    }
}
