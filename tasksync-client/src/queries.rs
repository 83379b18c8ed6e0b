use sqlx::{sqlite::SqliteRow, Row};
use tasksync_core::TaskRecord;

use crate::errors::ClientResult;

/// SQL text for the local task cache
pub struct Queries;

impl Queries {
    pub const GET_TASK: &'static str = "SELECT content FROM tasks WHERE id = ?1";

    pub const GET_ALL_TASKS: &'static str = "SELECT content FROM tasks ORDER BY rowid";

    pub const GET_ALL_IDS: &'static str = "SELECT id FROM tasks";

    pub const GET_LOCAL_KEY: &'static str = "SELECT local_key FROM tasks WHERE id = ?1";

    pub const UPSERT_TASK: &'static str = r#"
        INSERT INTO tasks (local_key, id, content)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            content = excluded.content,
            updated_at = CURRENT_TIMESTAMP
    "#;

    pub const DELETE_TASK: &'static str = "DELETE FROM tasks WHERE id = ?1";

    // Re-key under the same surrogate key
    pub const REKEY_TASK: &'static str = r#"
        UPDATE tasks
        SET id = ?2, content = ?3, updated_at = CURRENT_TIMESTAMP
        WHERE local_key = ?1
    "#;

    pub const DELETE_OTHER_HOLDER: &'static str =
        "DELETE FROM tasks WHERE id = ?1 AND local_key != ?2";

    pub const UPSERT_ALIAS: &'static str = r#"
        INSERT INTO id_aliases (ephemeral_id, canonical_id)
        VALUES (?1, ?2)
        ON CONFLICT(ephemeral_id) DO UPDATE SET
            canonical_id = excluded.canonical_id,
            remapped_at = CURRENT_TIMESTAMP
    "#;

    pub const RESOLVE_ALIAS: &'static str =
        "SELECT canonical_id FROM id_aliases WHERE ephemeral_id = ?1";

    pub const DELETE_ALIASES_TO: &'static str = "DELETE FROM id_aliases WHERE canonical_id = ?1";
}

/// Helpers for turning rows back into records
pub struct DbHelpers;

impl DbHelpers {
    pub fn row_to_task(row: &SqliteRow) -> ClientResult<TaskRecord> {
        let content: String = row.try_get("content")?;
        Ok(TaskRecord::from_json(&content)?)
    }
}
