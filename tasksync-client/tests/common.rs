use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tasksync_client::{
    ClientError, ClientResult, ConnectivityFlag, MemoryStore, Provider, RemoteService,
};
use tasksync_core::{SyncEntry, SyncReport, TaskId, TaskRecord};

/// A call as observed by [`MockRemote`].
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    GetTasks,
    Create(TaskRecord),
    Update(TaskId, TaskRecord),
    Delete(TaskId),
    Sync(Vec<TaskRecord>),
}

#[derive(Default)]
struct MockState {
    tasks: Vec<TaskRecord>,
    calls: Vec<RemoteCall>,
    next_id: u32,
    sync_report: Option<SyncReport>,
    delete_status: Option<u16>,
    unavailable: bool,
}

impl MockState {
    fn assign_id(&mut self, task: &TaskRecord) -> TaskRecord {
        self.next_id += 1;
        let created = task.clone().with_id(format!("srv{}", self.next_id));
        self.tasks.push(created.clone());
        created
    }

    fn store(&mut self, task: TaskRecord) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }
}

/// In-process stand-in for the task server.
///
/// Assigns ids `srv1`, `srv2`, ... (continuing after any seeded tasks) and records every call. `sync` answers with
/// the scripted report when one is set, otherwise it creates every ephemeral
/// record and confirms every other one, in snapshot order and without echoing
/// local ids.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Self {
        let remote = Self::default();
        {
            let mut state = remote.state.lock().unwrap();
            state.next_id = tasks.len() as u32;
            state.tasks = tasks;
        }
        remote
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sync_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RemoteCall::Sync(_)))
            .count()
    }

    pub fn server_tasks(&self) -> Vec<TaskRecord> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn script_sync(&self, report: SyncReport) {
        self.state.lock().unwrap().sync_report = Some(report);
    }

    pub fn fail_deletes_with(&self, status: u16) {
        self.state.lock().unwrap().delete_status = Some(status);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    fn record(&self, call: RemoteCall) -> ClientResult<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unavailable {
            return Err(ClientError::RemoteStatus {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteService for MockRemote {
    async fn get_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let state = self.record(RemoteCall::GetTasks)?;
        Ok(state.tasks.clone())
    }

    async fn create_task(&self, task: &TaskRecord) -> ClientResult<TaskRecord> {
        let mut state = self.record(RemoteCall::Create(task.clone()))?;
        Ok(state.assign_id(task))
    }

    async fn update_task(&self, id: &TaskId, task: &TaskRecord) -> ClientResult<TaskRecord> {
        let mut state = self.record(RemoteCall::Update(id.clone(), task.clone()))?;
        let updated = task.clone().with_id(id.clone());
        state.store(updated.clone());
        Ok(updated)
    }

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        let mut state = self.record(RemoteCall::Delete(id.clone()))?;
        if let Some(status) = state.delete_status {
            return Err(ClientError::RemoteStatus {
                status,
                body: String::new(),
            });
        }
        state.tasks.retain(|task| &task.id != id);
        Ok(())
    }

    async fn sync(&self, snapshot: &[TaskRecord]) -> ClientResult<SyncReport> {
        let mut state = self.record(RemoteCall::Sync(snapshot.to_vec()))?;
        if let Some(report) = state.sync_report.clone() {
            return Ok(report);
        }

        let mut report = SyncReport::default();
        for task in snapshot {
            if task.id.is_ephemeral() {
                let created = state.assign_id(task);
                report.created.push(SyncEntry::confirmed(created));
            } else {
                state.store(task.clone());
                report.updated.push(SyncEntry::confirmed(task.clone()));
            }
        }
        Ok(report)
    }
}

/// A provider wired to an in-memory cache, a [`MockRemote`] and a switchable
/// network flag.
#[allow(dead_code)]
pub struct Harness {
    pub provider: Provider,
    pub store: Arc<MemoryStore>,
    pub remote: Arc<MockRemote>,
    pub network: ConnectivityFlag,
}

#[allow(dead_code)]
pub fn harness(online: bool) -> Harness {
    harness_with(MockRemote::default(), online)
}

#[allow(dead_code)]
pub fn harness_with(remote: MockRemote, online: bool) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(remote);
    let network = ConnectivityFlag::new(online);
    let provider = Provider::new(store.clone(), remote.clone(), Arc::new(network.clone()));

    Harness {
        provider,
        store,
        remote,
        network,
    }
}

#[allow(dead_code)]
pub fn task(id: &str, description: &str) -> TaskRecord {
    TaskRecord::new(description).with_id(id)
}
