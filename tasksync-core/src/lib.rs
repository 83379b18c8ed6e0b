pub mod errors;
pub mod filters;
pub mod models;
pub mod protocol;
pub mod sorting;
pub mod stats;

pub use errors::{SyncError, SyncResult};
pub use filters::{FilterCount, FilterType};
pub use models::{Color, RepeatingDays, SyncStatus, TaskId, TaskRecord};
pub use protocol::{SyncEntry, SyncPayload, SyncReport};
pub use sorting::SortType;
