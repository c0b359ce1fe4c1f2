//! Generic reactive entity collection: a `DashMap`-backed store with a
//! `watch`-channel snapshot for subscribers. Generalizes the teacher's
//! `EntityCollection<T>` to this crate's `Device`/`Room` types.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

pub struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { by_key: DashMap::new(), version, snapshot }
    }

    /// Insert or replace the entity at `key`. Returns `true` if this was a
    /// new key.
    pub fn upsert(&self, key: impl Into<String>, entity: T) -> bool {
        let key = key.into();
        let is_new = !self.by_key.contains_key(&key);
        self.by_key.insert(key, Arc::new(entity));
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    pub fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub fn clear(&self) {
        self.by_key.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_key.iter().map(|entry| Arc::clone(entry.value())).collect();
        let _ = self.snapshot.send(Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_vs_replace() {
        let c = EntityCollection::new();
        assert!(c.upsert("a", 1));
        assert!(!c.upsert("a", 2));
        assert_eq!(*c.get("a").unwrap(), 2);
    }

    #[test]
    fn snapshot_reflects_current_entries() {
        let c = EntityCollection::new();
        c.upsert("a", 1);
        c.upsert("b", 2);
        assert_eq!(c.snapshot().len(), 2);
        c.remove("a");
        assert_eq!(c.snapshot().len(), 1);
    }

    #[test]
    fn clear_empties_the_collection() {
        let c = EntityCollection::new();
        c.upsert("a", 1);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.snapshot().len(), 0);
    }
}
