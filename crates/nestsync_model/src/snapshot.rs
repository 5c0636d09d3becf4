//! Full app-state snapshots for bulk push/pull.

use crate::mutation::MutationType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A full snapshot of syncable app state, one optional slot per
/// [`MutationType`].
///
/// Bulk push sends the whole snapshot and supersedes anything in the
/// incremental queue; bulk pull returns one for the caller to merge into
/// local state. Slots the device has never populated stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Room layout and decoration state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Value>,
    /// Usage statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    /// User settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    /// Mascot state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mascot: Option<Value>,
    /// Collection progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Value>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `ty`, if populated.
    pub fn get(&self, ty: MutationType) -> Option<&Value> {
        match ty {
            MutationType::Room => self.room.as_ref(),
            MutationType::Stats => self.stats.as_ref(),
            MutationType::Settings => self.settings.as_ref(),
            MutationType::Mascot => self.mascot.as_ref(),
            MutationType::Collection => self.collection.as_ref(),
        }
    }

    /// Sets the slot for `ty`.
    pub fn set(&mut self, ty: MutationType, value: Value) {
        match ty {
            MutationType::Room => self.room = Some(value),
            MutationType::Stats => self.stats = Some(value),
            MutationType::Settings => self.settings = Some(value),
            MutationType::Mascot => self.mascot = Some(value),
            MutationType::Collection => self.collection = Some(value),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, ty: MutationType, value: Value) -> Self {
        self.set(ty, value);
        self
    }

    /// Returns true if no slot is populated.
    pub fn is_empty(&self) -> bool {
        MutationType::ALL.iter().all(|ty| self.get(*ty).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_snapshot_has_no_slots() {
        let snapshot = StateSnapshot::new();
        assert!(snapshot.is_empty());
        for ty in MutationType::ALL {
            assert!(snapshot.get(ty).is_none());
        }
    }

    #[test]
    fn set_and_get_by_type() {
        let mut snapshot = StateSnapshot::new();
        snapshot.set(MutationType::Room, json!({"wallpaper": "forest"}));
        assert_eq!(
            snapshot.get(MutationType::Room),
            Some(&json!({"wallpaper": "forest"}))
        );
        assert!(snapshot.get(MutationType::Stats).is_none());
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn empty_slots_are_omitted_from_json() {
        let snapshot = StateSnapshot::new().with(MutationType::Settings, json!({"theme": "dark"}));
        let encoded = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(encoded, r#"{"settings":{"theme":"dark"}}"#);

        let back: StateSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, snapshot);
    }
}
