use crate::errors::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Prefix carried by every locally fabricated id. Server ids never start with it.
pub const EPHEMERAL_PREFIX: &str = "local-";

/// Externally visible task identifier.
///
/// Either canonical (assigned by the remote service) or ephemeral (fabricated
/// while offline and replaced during reconciliation).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fabricate a fresh ephemeral id.
    pub fn ephemeral() -> Self {
        Self(format!("{}{}", EPHEMERAL_PREFIX, Uuid::new_v4()))
    }

    pub fn is_ephemeral(&self) -> bool {
        self.0.starts_with(EPHEMERAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    #[default]
    Black,
    Yellow,
    Blue,
    Green,
    Pink,
}

impl Color {
    pub fn parse(value: &str) -> SyncResult<Self> {
        Self::from_str(value).map_err(|_| SyncError::UnknownVariant {
            kind: "color",
            value: value.to_string(),
        })
    }
}

/// Weekly repetition flags, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RepeatingDays {
    pub mo: bool,
    pub tu: bool,
    pub we: bool,
    pub th: bool,
    pub fr: bool,
    pub sa: bool,
    pub su: bool,
}

impl RepeatingDays {
    pub fn as_array(&self) -> [bool; 7] {
        [self.mo, self.tu, self.we, self.th, self.fr, self.sa, self.su]
    }

    pub fn is_repeating(&self) -> bool {
        self.as_array().iter().any(|day| *day)
    }
}

/// The task entity.
///
/// Its serde form is the flat projection used both as the cache content and as
/// the wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repeating_days: RepeatingDays,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl TaskRecord {
    /// A draft with an empty id; the remote service or the provider stamps one.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(""),
            description: description.into(),
            due_date: None,
            repeating_days: RepeatingDays::default(),
            color: Color::default(),
            is_favorite: false,
            is_archived: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_repeating_days(mut self, repeating_days: RepeatingDays) -> Self {
        self.repeating_days = repeating_days;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = is_archived;
        self
    }

    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Per-record synchronization status as tracked by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyncStatus {
    /// Matches the last state confirmed by the server.
    Synced,
    /// Created or modified locally, not yet confirmed.
    Pending,
    /// Deleted locally, deletion not yet confirmed.
    Deleted,
}
