//! Offline-first sync coordinator.
//!
//! Every operation checks connectivity immediately before choosing a branch.
//! Online, it goes through the [`RemoteService`] and writes the server's answer
//! through to the [`LocalStore`]. Offline, it works on the cache alone, stamps
//! ephemeral ids on new records and remembers what still has to reach the
//! server in a [`SyncState`]. [`Provider::sync`] later pushes the cache
//! snapshot, merges confirmed records back and reports what failed.
//!
//! Operations are serialized per provider: each one holds the state lock for
//! its whole duration, so a mutation never interleaves with an in-flight sync.

use crate::config::ClientConfig;
use crate::connectivity::Connectivity;
use crate::database::SqliteStore;
use crate::errors::{ClientError, ClientResult};
use crate::remote::{HttpRemote, RemoteService};
use crate::store::LocalStore;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tasksync_core::{SyncEntry, SyncStatus, TaskId, TaskRecord};
use tokio::sync::Mutex;

/// What still has to reach the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pending: BTreeSet<TaskId>,
    tombstones: BTreeSet<TaskId>,
}

impl SyncState {
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty() || !self.tombstones.is_empty()
    }

    pub fn pending(&self) -> &BTreeSet<TaskId> {
        &self.pending
    }

    /// Canonical ids deleted offline whose deletion the server has not seen.
    pub fn tombstones(&self) -> &BTreeSet<TaskId> {
        &self.tombstones
    }

    pub fn status_of(&self, id: &TaskId) -> SyncStatus {
        if self.tombstones.contains(id) {
            SyncStatus::Deleted
        } else if self.pending.contains(id) {
            SyncStatus::Pending
        } else {
            SyncStatus::Synced
        }
    }

    fn mark_pending(&mut self, id: TaskId) {
        self.tombstones.remove(&id);
        self.pending.insert(id);
    }

    fn mark_deleted(&mut self, id: TaskId) {
        self.pending.remove(&id);
        // The server never saw an ephemeral record, so there is nothing to delete there.
        if !id.is_ephemeral() {
            self.tombstones.insert(id);
        }
    }

    fn confirm(&mut self, id: &TaskId) {
        self.pending.remove(id);
    }

    fn forget(&mut self, id: &TaskId) {
        self.pending.remove(id);
        self.tombstones.remove(id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

/// An offline-created record now known under its canonical id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub local_id: TaskId,
    pub task: TaskRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// `None` when the server rejected an entry without naming the record.
    pub id: Option<TaskId>,
    pub operation: SyncOperation,
    pub reason: String,
}

/// Partial-sync report returned by [`Provider::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// `false` when the call was a no-op (offline or nothing pending).
    pub performed: bool,
    pub created: Vec<Reconciled>,
    pub updated: Vec<TaskRecord>,
    pub deleted: Vec<TaskId>,
    pub failed: Vec<FailedItem>,
}

impl SyncOutcome {
    fn skipped() -> Self {
        Self::default()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn confirmed_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

pub struct Provider {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteService>,
    connectivity: Arc<dyn Connectivity>,
    state: Mutex<SyncState>,
}

impl Provider {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteService>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// SQLite cache at `config.database_url` (migrated) and the HTTP remote.
    pub async fn from_config(
        config: &ClientConfig,
        connectivity: Arc<dyn Connectivity>,
    ) -> ClientResult<Self> {
        config.validate()?;

        let store = SqliteStore::new(&config.database_url, config.max_connections).await?;
        store.run_migrations().await?;
        let remote = HttpRemote::from_config(config)?;

        tracing::info!(
            database_url = %config.database_url,
            server_url = %config.server_url,
            "Task provider ready"
        );
        Ok(Self::new(Arc::new(store), Arc::new(remote), connectivity))
    }

    pub fn store(&self) -> Arc<dyn LocalStore> {
        self.store.clone()
    }

    pub async fn sync_state(&self) -> SyncState {
        self.state.lock().await.clone()
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.is_dirty()
    }

    pub async fn get_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let state = self.state.lock().await;

        if !self.connectivity.is_online() {
            let tasks = self.store.get_all().await?;
            tracing::info!(count = tasks.len(), "Offline: serving tasks from cache");
            return Ok(tasks);
        }

        let fetched = self.remote.get_tasks().await.map_err(log_remote("get_tasks"))?;
        let merged = self.merge_with_pending(fetched, &state).await?;
        self.store.replace_all(&merged).await?;

        tracing::info!(count = merged.len(), "Refreshed task cache from server");
        Ok(merged)
    }

    pub async fn create_task(&self, task: TaskRecord) -> ClientResult<TaskRecord> {
        let mut state = self.state.lock().await;

        if self.connectivity.is_online() {
            let created = self
                .remote
                .create_task(&task)
                .await
                .map_err(log_remote("create_task"))?;
            self.store.set(&created.id, &created).await?;
            tracing::info!(task_id = %created.id, "Created task on server");
            return Ok(created);
        }

        let id = TaskId::ephemeral();
        let record = task.with_id(id.clone());
        self.store.set(&id, &record).await?;
        state.mark_pending(id);

        tracing::info!(task_id = %record.id, "Offline: created task locally");
        Ok(record)
    }

    pub async fn update_task(&self, id: &TaskId, task: TaskRecord) -> ClientResult<TaskRecord> {
        let mut state = self.state.lock().await;
        let id = self.store.resolve(id).await?;

        if self.connectivity.is_online() {
            let record = task.with_id(id.clone());
            let confirmed = if id.is_ephemeral() {
                // Never reached the server: promote it instead of updating.
                let created = self
                    .remote
                    .create_task(&record)
                    .await
                    .map_err(log_remote("create_task"))?;
                self.store.remap(&id, &created).await?;
                created
            } else {
                let updated = self
                    .remote
                    .update_task(&id, &record)
                    .await
                    .map_err(log_remote("update_task"))?;
                self.store.set(&updated.id, &updated).await?;
                updated
            };
            state.confirm(&id);
            tracing::info!(task_id = %confirmed.id, "Updated task on server");
            return Ok(confirmed);
        }

        let record = task.with_id(id.clone());
        self.store.set(&id, &record).await?;
        state.mark_pending(id);

        tracing::info!(task_id = %record.id, "Offline: updated task locally");
        Ok(record)
    }

    pub async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        let id = self.store.resolve(id).await?;

        if self.connectivity.is_online() {
            if !id.is_ephemeral() {
                self.remote
                    .delete_task(&id)
                    .await
                    .map_err(log_remote("delete_task"))?;
            }
            self.store.remove(&id).await?;
            state.forget(&id);
            tracing::info!(task_id = %id, "Deleted task");
            return Ok(());
        }

        self.store.remove(&id).await?;
        state.mark_deleted(id.clone());
        tracing::info!(task_id = %id, "Offline: deleted task locally");
        Ok(())
    }

    /// Push local changes and merge the server's answer back into the cache.
    ///
    /// A no-op unless online with pending work. Transport failures propagate
    /// and leave the pending set untouched; per-record rejections are listed in
    /// [`SyncOutcome::failed`] and stay pending for the next call.
    pub async fn sync(&self) -> ClientResult<SyncOutcome> {
        let mut state = self.state.lock().await;

        if !self.connectivity.is_online() {
            tracing::debug!("Offline: sync skipped");
            return Ok(SyncOutcome::skipped());
        }
        if !state.is_dirty() {
            tracing::debug!("Nothing pending: sync skipped");
            return Ok(SyncOutcome::skipped());
        }

        tracing::info!(
            pending = state.pending.len(),
            deletions = state.tombstones.len(),
            "Starting sync"
        );
        let mut outcome = SyncOutcome {
            performed: true,
            ..SyncOutcome::default()
        };

        self.push_deletions(&mut state, &mut outcome).await?;

        let snapshot = self.store.get_all().await?;
        let ephemeral_ids: Vec<TaskId> = snapshot
            .iter()
            .filter(|task| task.id.is_ephemeral())
            .map(|task| task.id.clone())
            .collect();

        let report = self.remote.sync(&snapshot).await.map_err(log_remote("sync"))?;

        let local_ids = correlate_created(&report.created, &ephemeral_ids);
        for (entry, local_id) in report.created.iter().zip(local_ids) {
            match (entry.success, entry.task()) {
                (true, Some(task)) => {
                    match &local_id {
                        Some(local_id) => {
                            self.store.remap(local_id, task).await?;
                            state.confirm(local_id);
                        }
                        None => self.store.set(&task.id, task).await?,
                    }
                    state.confirm(&task.id);
                    outcome.created.push(Reconciled {
                        local_id: local_id.unwrap_or_else(|| task.id.clone()),
                        task: task.clone(),
                    });
                }
                _ => {
                    let id = local_id.or_else(|| entry.task().map(|task| task.id.clone()));
                    self.requeue(&mut state, id.as_ref()).await?;
                    outcome.failed.push(FailedItem {
                        id,
                        operation: SyncOperation::Create,
                        reason: "rejected by server".into(),
                    });
                }
            }
        }

        let mut confirmed = Vec::new();
        for entry in &report.updated {
            match (entry.success, entry.task()) {
                (true, Some(task)) => {
                    state.confirm(&task.id);
                    confirmed.push(task.clone());
                }
                _ => {
                    let id = entry
                        .task()
                        .map(|task| task.id.clone())
                        .or_else(|| entry.local_id.clone());
                    self.requeue(&mut state, id.as_ref()).await?;
                    outcome.failed.push(FailedItem {
                        id,
                        operation: SyncOperation::Update,
                        reason: "rejected by server".into(),
                    });
                }
            }
        }
        self.store.set_many(&confirmed).await?;
        outcome.updated = confirmed;

        if outcome.is_partial() {
            tracing::warn!(
                confirmed = outcome.confirmed_count(),
                failed = outcome.failed.len(),
                "Sync finished with rejected items"
            );
        } else {
            tracing::info!(confirmed = outcome.confirmed_count(), "Sync finished");
        }
        Ok(outcome)
    }

    async fn push_deletions(
        &self,
        state: &mut SyncState,
        outcome: &mut SyncOutcome,
    ) -> ClientResult<()> {
        let tombstones: Vec<TaskId> = state.tombstones.iter().cloned().collect();

        for id in tombstones {
            match self.remote.delete_task(&id).await {
                Ok(()) => {}
                // Already gone on the server side.
                Err(err) if err.is_not_found() => {}
                Err(err @ ClientError::RemoteStatus { .. }) => {
                    tracing::warn!(task_id = %id, error = %err, "Server rejected deletion");
                    outcome.failed.push(FailedItem {
                        id: Some(id),
                        operation: SyncOperation::Delete,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(log_remote("delete_task")(err)),
            }
            state.tombstones.remove(&id);
            outcome.deleted.push(id);
        }
        Ok(())
    }

    /// A rejected record goes back to pending if it is still cached.
    async fn requeue(&self, state: &mut SyncState, id: Option<&TaskId>) -> ClientResult<()> {
        if let Some(id) = id {
            if self.store.get(id).await?.is_some() {
                state.mark_pending(id.clone());
            }
        }
        Ok(())
    }

    /// Server list with tombstoned ids dropped and pending local versions kept.
    async fn merge_with_pending(
        &self,
        fetched: Vec<TaskRecord>,
        state: &SyncState,
    ) -> ClientResult<Vec<TaskRecord>> {
        let local_pending: Vec<TaskRecord> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|task| state.pending.contains(&task.id))
            .collect();

        let mut merged: Vec<TaskRecord> = fetched
            .into_iter()
            .filter(|task| !state.tombstones.contains(&task.id))
            .map(|task| {
                local_pending
                    .iter()
                    .find(|local| local.id == task.id)
                    .cloned()
                    .unwrap_or(task)
            })
            .collect();

        for local in local_pending {
            if !merged.iter().any(|task| task.id == local.id) {
                merged.push(local);
            }
        }
        Ok(merged)
    }
}

/// Pair each created entry with the ephemeral id it answers for.
///
/// Echoed `local_id`s are taken as-is. Entries without one take the remaining
/// ephemeral ids of the snapshot in order, skipping every id already echoed.
fn correlate_created(entries: &[SyncEntry], ephemeral_ids: &[TaskId]) -> Vec<Option<TaskId>> {
    let echoed: HashSet<&TaskId> = entries
        .iter()
        .filter_map(|entry| entry.local_id.as_ref())
        .collect();
    let mut unclaimed = ephemeral_ids.iter().filter(|id| !echoed.contains(id));

    entries
        .iter()
        .map(|entry| match &entry.local_id {
            Some(local_id) => Some(local_id.clone()),
            None => unclaimed.next().cloned(),
        })
        .collect()
}

fn log_remote(operation: &'static str) -> impl Fn(ClientError) -> ClientError {
    move |err| {
        tracing::error!(operation, error = %err, "Remote task service call failed");
        err
    }
}
