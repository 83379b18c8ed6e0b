//! Wire shapes for the bulk reconciliation call.
//!
//! The client pushes its whole cache snapshot (a JSON array of [`TaskRecord`])
//! and the server answers with a [`SyncReport`] partitioned into the records it
//! created and the records it updated.

use crate::models::{TaskId, TaskRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    #[serde(default)]
    pub created: Vec<SyncEntry>,
    #[serde(default)]
    pub updated: Vec<SyncEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<SyncPayload>,
    /// Ephemeral id this entry answers for, when the server echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub task: TaskRecord,
}

impl SyncEntry {
    pub fn confirmed(task: TaskRecord) -> Self {
        Self {
            success: true,
            payload: Some(SyncPayload { task }),
            local_id: None,
        }
    }

    pub fn rejected(task: Option<TaskRecord>) -> Self {
        Self {
            success: false,
            payload: task.map(|task| SyncPayload { task }),
            local_id: None,
        }
    }

    pub fn for_local(mut self, local_id: TaskId) -> Self {
        self.local_id = Some(local_id);
        self
    }

    pub fn task(&self) -> Option<&TaskRecord> {
        self.payload.as_ref().map(|payload| &payload.task)
    }
}

impl SyncReport {
    pub fn confirmed_count(&self) -> usize {
        self.created
            .iter()
            .chain(self.updated.iter())
            .filter(|entry| entry.success)
            .count()
    }

    pub fn rejected_count(&self) -> usize {
        self.created.len() + self.updated.len() - self.confirmed_count()
    }
}
