//! Generic keyed entity collection with stable insertion order.
//!
//! Every store keeps its entities in an [`EntityStore`]: a map from id to
//! entity that also preserves the order entities were first inserted, since
//! that order drives list rendering. Appends de-duplicate by key so that
//! paginated fetches never reintroduce an id already present from an earlier
//! page.

use std::collections::HashMap;
use std::hash::Hash;

/// An entity addressable by a stable key.
pub trait Keyed {
    /// Key type, usually a newtype id from `tiffin-core`.
    type Key: Eq + Hash + Clone;

    /// The entity's key.
    fn key(&self) -> Self::Key;
}

/// Keyed collection preserving insertion order.
#[derive(Debug, Clone)]
pub struct EntityStore<T: Keyed> {
    order: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> EntityStore<T> {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.order
    }

    /// Look up an entity by key.
    #[must_use]
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).and_then(|&pos| self.order.get(pos))
    }

    /// Look up an entity mutably by key.
    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.index
            .get(key)
            .copied()
            .and_then(|pos| self.order.get_mut(pos))
    }

    /// Whether an entity with this key exists.
    #[must_use]
    pub fn contains(&self, key: &T::Key) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace by key. A replacement keeps its original position.
    pub fn upsert(&mut self, item: T) {
        let key = item.key();
        if let Some(&pos) = self.index.get(&key) {
            if let Some(slot) = self.order.get_mut(pos) {
                *slot = item;
            }
        } else {
            self.index.insert(key, self.order.len());
            self.order.push(item);
        }
    }

    /// Append entities, skipping any whose key is already present.
    ///
    /// Duplicates within `items` are also collapsed to the first occurrence.
    /// Returns the number of entities actually appended.
    pub fn append_dedup(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        let mut appended = 0;
        for item in items {
            let key = item.key();
            if self.index.contains_key(&key) {
                continue;
            }
            self.index.insert(key, self.order.len());
            self.order.push(item);
            appended += 1;
        }
        appended
    }

    /// Replace the entire collection, collapsing duplicate keys to the first
    /// occurrence.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.order.clear();
        self.index.clear();
        self.append_dedup(items);
    }

    /// Insert at the front (most-recent-first lists). An existing entity
    /// with the same key is removed first.
    pub fn prepend(&mut self, item: T) {
        let key = item.key();
        if self.index.contains_key(&key) {
            self.remove(&key);
        }
        self.order.insert(0, item);
        self.reindex();
    }

    /// Remove by key, preserving the order of the remaining entities.
    /// Absent keys are a no-op.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let pos = self.index.remove(key)?;
        let removed = self.order.remove(pos);
        self.reindex();
        Some(removed)
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index = self
            .order
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.key(), pos))
            .collect();
    }
}

impl<T: Keyed + Clone> EntityStore<T> {
    /// Owned copy of the entities in insertion order, for snapshots.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        value: u32,
    }

    impl Keyed for Item {
        type Key = &'static str;

        fn key(&self) -> Self::Key {
            self.id
        }
    }

    fn item(id: &'static str, value: u32) -> Item {
        Item { id, value }
    }

    fn ids<T: Keyed<Key = &'static str>>(store: &EntityStore<T>) -> Vec<&'static str> {
        store.as_slice().iter().map(Keyed::key).collect()
    }

    #[test]
    fn test_upsert_preserves_position() {
        let mut store = EntityStore::new();
        store.upsert(item("a", 1));
        store.upsert(item("b", 2));
        store.upsert(item("a", 9));

        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.get(&"a").map(|i| i.value), Some(9));
    }

    #[test]
    fn test_append_dedup_skips_existing_keys() {
        let mut store = EntityStore::new();
        store.replace_all([item("a", 1), item("b", 2)]);
        let appended = store.append_dedup([item("b", 8), item("c", 3)]);

        assert_eq!(appended, 1);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        // The earlier page's entity wins.
        assert_eq!(store.get(&"b").map(|i| i.value), Some(2));
    }

    #[test]
    fn test_append_dedup_collapses_batch_duplicates() {
        let mut store = EntityStore::new();
        let appended = store.append_dedup([item("a", 1), item("a", 2), item("b", 3)]);
        assert_eq!(appended, 2);
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_keeps_order_and_lookups() {
        let mut store = EntityStore::new();
        store.replace_all([item("a", 1), item("b", 2), item("c", 3)]);

        assert!(store.remove(&"b").is_some());
        assert!(store.remove(&"b").is_none());
        assert_eq!(ids(&store), vec!["a", "c"]);
        assert_eq!(store.get(&"c").map(|i| i.value), Some(3));
    }

    #[test]
    fn test_prepend_moves_existing_to_front() {
        let mut store = EntityStore::new();
        store.replace_all([item("a", 1), item("b", 2)]);
        store.prepend(item("c", 3));
        store.prepend(item("b", 9));

        assert_eq!(ids(&store), vec!["b", "c", "a"]);
        assert_eq!(store.get(&"b").map(|i| i.value), Some(9));
    }
}
