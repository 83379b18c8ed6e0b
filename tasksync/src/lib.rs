//! TaskSync - Offline-first task synchronization
//!
//! This crate provides a unified API for the TaskSync client.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tasksync::{ClientConfig, ConnectivityFlag, Provider, TaskRecord};
//!
//! let online = ConnectivityFlag::new(true);
//! let provider = Provider::from_config(&ClientConfig::from_env()?, Arc::new(online.clone())).await?;
//! provider.create_task(TaskRecord::new("Buy milk")).await?;
//! provider.sync().await?;
//! ```

// Re-export client types
pub use tasksync_client::{
    ClientConfig, ClientError, ClientResult, Connectivity, ConnectivityFlag, EventBus, EventKind,
    FailedItem, HttpRemote, LocalStore, MemoryStore, ModelEvent, Provider, Reconciled,
    RemoteService, SqliteStore, Subscription, SyncOperation, SyncOutcome, SyncState, TasksModel,
};
pub use tasksync_client::logging::init_tracing;

// Re-export core types that external applications may need
pub use tasksync_core::filters;
pub use tasksync_core::sorting;
pub use tasksync_core::stats;
pub use tasksync_core::{
    Color, FilterCount, FilterType, RepeatingDays, SortType, SyncEntry, SyncError, SyncPayload,
    SyncReport, SyncResult, SyncStatus, TaskId, TaskRecord,
};
