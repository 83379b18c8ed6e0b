pub mod config;
pub mod connectivity;
pub mod database;
pub mod errors;
pub mod events;
pub mod logging;
pub mod provider;
pub mod queries;
pub mod remote;
pub mod store;
pub mod tasks_model;

pub use config::ClientConfig;
pub use connectivity::{Connectivity, ConnectivityFlag};
pub use database::SqliteStore;
pub use errors::{ClientError, ClientResult};
pub use events::{EventBus, EventKind, ModelEvent, Subscription};
pub use provider::{FailedItem, Provider, Reconciled, SyncOperation, SyncOutcome, SyncState};
pub use remote::{HttpRemote, RemoteService};
pub use store::{LocalStore, MemoryStore};
pub use tasks_model::TasksModel;
