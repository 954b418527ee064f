//! Per-test registry of created resource ids.
//!
//! An id enters the store the moment its creation is confirmed and leaves it
//! only when the store is cleared at teardown. Snapshots are sorted so teardown
//! order within one type is reproducible.

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use crate::model::ResourceType;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntityStore {
    ids: BTreeMap<ResourceType, BTreeSet<String>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks `id`. Returns `false` if it was already tracked.
    pub fn add(&mut self, resource: ResourceType, id: impl Into<String>) -> bool {
        let id = id.into();
        trace!(resource = %resource, id = %id, "Tracking entity");
        self.ids.entry(resource).or_default().insert(id)
    }

    pub fn extend<I, S>(&mut self, resource: ResourceType, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.add(resource, id);
        }
    }

    /// Snapshot taken at call time; later changes to the store do not affect it.
    pub fn ids_of(&self, resource: ResourceType) -> Vec<String> {
        self.ids
            .get(&resource)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, resource: ResourceType, id: &str) -> bool {
        self.ids.get(&resource).is_some_and(|ids| ids.contains(id))
    }

    /// Types with at least one tracked id.
    pub fn tracked_types(&self) -> Vec<ResourceType> {
        self.ids
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(resource, _)| *resource)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_per_type() {
        let mut store = EntityStore::new();
        assert!(store.add(ResourceType::Product, "p1"));
        assert!(!store.add(ResourceType::Product, "p1"));
        assert!(store.add(ResourceType::Customer, "p1"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let mut store = EntityStore::new();
        store.extend(ResourceType::Product, ["b", "a"]);
        let snapshot = store.ids_of(ResourceType::Product);
        store.add(ResourceType::Product, "c");

        assert_eq!(snapshot, vec!["a", "b"]);
        assert_eq!(store.ids_of(ResourceType::Product).len(), 3);
        assert!(store.ids_of(ResourceType::Order).is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = EntityStore::new();
        store.add(ResourceType::Order, "o1");
        store.clear();
        store.clear();
        assert!(store.is_empty());
        assert!(store.tracked_types().is_empty());
        assert!(!store.contains(ResourceType::Order, "o1"));
    }
}
