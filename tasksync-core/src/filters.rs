//! Task filter predicates.
//!
//! Every predicate that depends on the calendar takes `now` explicitly; the
//! calendar day is evaluated in `now`'s time zone.

use crate::errors::{SyncError, SyncResult};
use crate::models::TaskRecord;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterType {
    #[default]
    All,
    Overdue,
    Today,
    Favorites,
    Repeating,
    Archive,
}

impl FilterType {
    pub fn parse(value: &str) -> SyncResult<Self> {
        Self::from_str(value).map_err(|_| SyncError::UnknownVariant {
            kind: "filter",
            value: value.to_string(),
        })
    }

    pub fn matches<Tz: TimeZone>(&self, task: &TaskRecord, now: &DateTime<Tz>) -> bool {
        match self {
            FilterType::All => !task.is_archived,
            FilterType::Archive => task.is_archived,
            FilterType::Favorites => task.is_favorite,
            FilterType::Overdue => task
                .due_date
                .as_ref()
                .is_some_and(|due| is_overdue(due, now)),
            FilterType::Repeating => task.repeating_days.is_repeating(),
            FilterType::Today => {
                !task.is_archived
                    && task
                        .due_date
                        .as_ref()
                        .is_some_and(|due| is_same_day(due, now))
            }
        }
    }
}

/// Badge data: how many tasks a filter would show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCount {
    pub filter: FilterType,
    pub count: usize,
}

pub fn is_same_day<Tz: TimeZone>(date: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    date.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

/// Strictly in the past and not on today's calendar day.
pub fn is_overdue<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    *due < now.with_timezone(&Utc) && !is_same_day(due, now)
}

pub fn tasks_by_filter<Tz: TimeZone>(
    tasks: &[TaskRecord],
    filter: FilterType,
    now: &DateTime<Tz>,
) -> Vec<TaskRecord> {
    tasks
        .iter()
        .filter(|task| filter.matches(task, now))
        .cloned()
        .collect()
}

pub fn filter_counts<Tz: TimeZone>(tasks: &[TaskRecord], now: &DateTime<Tz>) -> Vec<FilterCount> {
    FilterType::iter()
        .map(|filter| FilterCount {
            filter,
            count: tasks.iter().filter(|task| filter.matches(task, now)).count(),
        })
        .collect()
}
