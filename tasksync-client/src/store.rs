//! Local task cache.
//!
//! Entries live under a stable surrogate key; the externally visible task id is
//! an attribute of the entry. Reconciliation swaps an ephemeral id for the
//! canonical one under the same surrogate key and records the alias, so the
//! same logical record is never stored under both ids.

use crate::errors::{ClientError, ClientResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tasksync_core::{TaskId, TaskRecord};
use uuid::Uuid;

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, id: &TaskId) -> ClientResult<Option<TaskRecord>>;

    /// Decoupled snapshot of every cached record.
    async fn get_all(&self) -> ClientResult<Vec<TaskRecord>>;

    /// Upsert `record` under `id`; the stored copy carries `id`.
    async fn set(&self, id: &TaskId, record: &TaskRecord) -> ClientResult<()>;

    /// Bulk upsert keyed by each record's own id. Other entries are untouched.
    async fn set_many(&self, records: &[TaskRecord]) -> ClientResult<()>;

    /// Returns whether an entry existed. Absent ids are a no-op. Aliases that
    /// point at `id` go with it.
    async fn remove(&self, id: &TaskId) -> ClientResult<bool>;

    /// Make the cache hold exactly `records`, dropping aliases of evicted ids.
    async fn replace_all(&self, records: &[TaskRecord]) -> ClientResult<()>;

    /// Atomically re-key the entry held under `ephemeral` to `canonical.id`,
    /// store `canonical` as its content, and remember the alias.
    async fn remap(&self, ephemeral: &TaskId, canonical: &TaskRecord) -> ClientResult<()>;

    /// Follow the alias table; ids without an alias resolve to themselves.
    async fn resolve(&self, id: &TaskId) -> ClientResult<TaskId>;
}

#[derive(Default)]
struct MemoryState {
    keys: HashMap<TaskId, Uuid>,
    entries: HashMap<Uuid, TaskRecord>,
    aliases: HashMap<TaskId, TaskId>,
    // Surrogate keys in insertion order so snapshots are stable.
    order: Vec<Uuid>,
}

impl MemoryState {
    fn upsert(&mut self, record: TaskRecord) {
        match self.keys.get(&record.id) {
            Some(key) => {
                self.entries.insert(*key, record);
            }
            None => {
                let key = Uuid::new_v4();
                self.keys.insert(record.id.clone(), key);
                self.entries.insert(key, record);
                self.order.push(key);
            }
        }
    }

    fn forget_aliases_to(&mut self, canonical: &TaskId) {
        self.aliases.retain(|_, target| target != canonical);
    }

    fn remove(&mut self, id: &TaskId) -> bool {
        match self.keys.remove(id) {
            Some(key) => {
                self.entries.remove(&key);
                self.order.retain(|k| *k != key);
                true
            }
            None => false,
        }
    }
}

/// Process-local [`LocalStore`], used for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ClientResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ClientError::LockError("memory store".into()))
    }

    pub fn len(&self) -> ClientResult<usize> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> ClientResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, id: &TaskId) -> ClientResult<Option<TaskRecord>> {
        let state = self.lock()?;
        Ok(state
            .keys
            .get(id)
            .and_then(|key| state.entries.get(key))
            .cloned())
    }

    async fn get_all(&self) -> ClientResult<Vec<TaskRecord>> {
        let state = self.lock()?;
        Ok(state
            .order
            .iter()
            .filter_map(|key| state.entries.get(key))
            .cloned()
            .collect())
    }

    async fn set(&self, id: &TaskId, record: &TaskRecord) -> ClientResult<()> {
        self.lock()?.upsert(record.clone().with_id(id.clone()));
        Ok(())
    }

    async fn set_many(&self, records: &[TaskRecord]) -> ClientResult<()> {
        let mut state = self.lock()?;
        for record in records {
            state.upsert(record.clone());
        }
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> ClientResult<bool> {
        let mut state = self.lock()?;
        state.forget_aliases_to(id);
        Ok(state.remove(id))
    }

    async fn replace_all(&self, records: &[TaskRecord]) -> ClientResult<()> {
        let mut state = self.lock()?;
        let stale: Vec<TaskId> = state
            .keys
            .keys()
            .filter(|id| !records.iter().any(|record| &record.id == *id))
            .cloned()
            .collect();
        for id in &stale {
            state.forget_aliases_to(id);
            state.remove(id);
        }
        for record in records {
            state.upsert(record.clone());
        }
        Ok(())
    }

    async fn remap(&self, ephemeral: &TaskId, canonical: &TaskRecord) -> ClientResult<()> {
        let mut state = self.lock()?;
        match state.keys.remove(ephemeral) {
            Some(key) => {
                if canonical.id != *ephemeral {
                    state.remove(&canonical.id);
                }
                state.keys.insert(canonical.id.clone(), key);
                state.entries.insert(key, canonical.clone());
            }
            None => state.upsert(canonical.clone()),
        }
        state.aliases.insert(ephemeral.clone(), canonical.id.clone());
        Ok(())
    }

    async fn resolve(&self, id: &TaskId) -> ClientResult<TaskId> {
        let state = self.lock()?;
        Ok(state.aliases.get(id).cloned().unwrap_or_else(|| id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, description: &str) -> TaskRecord {
        TaskRecord::new(description).with_id(id)
    }

    #[tokio::test]
    async fn test_set_is_last_write_wins() {
        let store = MemoryStore::new();
        let id = TaskId::from("1");

        store.set(&id, &task("ignored", "first")).await.unwrap();
        store.set(&id, &task("ignored", "second")).await.unwrap();

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.description, "second");
        assert_eq!(stored.id, id);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_many_leaves_other_entries() {
        let store = MemoryStore::new();
        store.set_many(&[task("1", "a"), task("2", "b")]).await.unwrap();
        store.set_many(&[task("2", "b2"), task("3", "c")]).await.unwrap();

        let all = store.get_all().await.unwrap();
        let descriptions: Vec<&str> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["a", "b2", "c"]);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = MemoryStore::new();
        assert!(!store.remove(&TaskId::from("missing")).await.unwrap());

        store.set_many(&[task("1", "a")]).await.unwrap();
        assert!(store.remove(&TaskId::from("1")).await.unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_is_decoupled() {
        let store = MemoryStore::new();
        store.set_many(&[task("1", "a")]).await.unwrap();

        let snapshot = store.get_all().await.unwrap();
        store.set_many(&[task("1", "changed")]).await.unwrap();

        assert_eq!(snapshot[0].description, "a");
    }

    #[tokio::test]
    async fn test_replace_all() {
        let store = MemoryStore::new();
        store.set_many(&[task("1", "a"), task("2", "b")]).await.unwrap();
        store.replace_all(&[task("2", "b2"), task("3", "c")]).await.unwrap();

        assert!(store.get(&TaskId::from("1")).await.unwrap().is_none());
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remap_replaces_ephemeral_entry() {
        let store = MemoryStore::new();
        let tmp = TaskId::ephemeral();
        store.set(&tmp, &task("", "Buy milk")).await.unwrap();

        store.remap(&tmp, &task("srv42", "Buy milk")).await.unwrap();

        assert!(store.get(&tmp).await.unwrap().is_none());
        assert_eq!(
            store.get(&TaskId::from("srv42")).await.unwrap().unwrap().description,
            "Buy milk"
        );
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.resolve(&tmp).await.unwrap(), TaskId::from("srv42"));
        assert_eq!(
            store.resolve(&TaskId::from("other")).await.unwrap(),
            TaskId::from("other")
        );
    }

    #[tokio::test]
    async fn test_remap_collapses_existing_canonical_entry() {
        let store = MemoryStore::new();
        let tmp = TaskId::ephemeral();
        store.set(&tmp, &task("", "local")).await.unwrap();
        store.set_many(&[task("srv1", "fetched")]).await.unwrap();

        store.remap(&tmp, &task("srv1", "confirmed")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "confirmed");
    }

    #[tokio::test]
    async fn test_removing_canonical_entry_drops_its_aliases() {
        let store = MemoryStore::new();
        let tmp = TaskId::ephemeral();
        let kept = TaskId::ephemeral();
        store.set(&tmp, &task("", "gone")).await.unwrap();
        store.set(&kept, &task("", "kept")).await.unwrap();
        store.remap(&tmp, &task("srv1", "gone")).await.unwrap();
        store.remap(&kept, &task("srv2", "kept")).await.unwrap();

        store.remove(&TaskId::from("srv1")).await.unwrap();
        assert_eq!(store.resolve(&tmp).await.unwrap(), tmp);

        store.replace_all(&[task("srv3", "fresh")]).await.unwrap();
        assert_eq!(store.resolve(&kept).await.unwrap(), kept);
    }
}
