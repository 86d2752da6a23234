use std::collections::HashMap;

use crate::storage::NotificationRecord;

/// In-memory mirror of the record store: `slot_id -> fired_for_talk`.
///
/// Its key set always equals the store's key set.
#[derive(Debug, Default)]
pub struct VolatileIndex {
    entries: HashMap<String, bool>,
}

impl VolatileIndex {
    /// Build from a full store scan.
    pub fn warm_up<'a>(records: impl IntoIterator<Item = &'a NotificationRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|r| (r.slot_id.clone(), r.fired_for_talk))
            .collect();
        Self { entries }
    }

    pub fn insert_scheduled(&mut self, slot_id: &str) {
        self.entries.insert(slot_id.to_string(), false);
    }

    pub fn mark_fired_for_talk(&mut self, slot_id: &str) {
        self.entries.insert(slot_id.to_string(), true);
    }

    pub fn remove(&mut self, slot_id: &str) -> bool {
        self.entries.remove(slot_id).is_some()
    }

    /// Tracked and the pre-event alarm has not fired yet.
    pub fn is_scheduled(&self, slot_id: &str) -> bool {
        self.entries.get(slot_id) == Some(&false)
    }

    /// Tracked in any state.
    pub fn is_available(&self, slot_id: &str) -> bool {
        self.entries.contains_key(slot_id)
    }

    pub fn fired_for_talk(&self, slot_id: &str) -> Option<bool> {
        self.entries.get(slot_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slot_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
