//! Completion statistics over a date range.
//!
//! Callers pass the archived (done) tasks; dates are bucketed by calendar day
//! in the supplied time zone and both range ends are inclusive.

use crate::models::{Color, TaskRecord};
use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCount {
    pub color: Color,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: usize,
    pub by_color: Vec<ColorCount>,
    pub by_day: Vec<DayCount>,
}

impl CompletionStats {
    pub fn compute<Tz: TimeZone>(tasks: &[TaskRecord], from: NaiveDate, to: NaiveDate, tz: &Tz) -> Self {
        let in_range = tasks_in_range(tasks, from, to, tz);
        Self {
            from,
            to,
            total: in_range.len(),
            by_color: color_counts(&in_range),
            by_day: daily_counts(&in_range, from, to, tz),
        }
    }
}

fn due_day<Tz: TimeZone>(task: &TaskRecord, tz: &Tz) -> Option<NaiveDate> {
    task.due_date
        .as_ref()
        .map(|due| due.with_timezone(tz).date_naive())
}

pub fn tasks_in_range<Tz: TimeZone>(
    tasks: &[TaskRecord],
    from: NaiveDate,
    to: NaiveDate,
    tz: &Tz,
) -> Vec<TaskRecord> {
    tasks
        .iter()
        .filter(|task| due_day(task, tz).is_some_and(|day| day >= from && day <= to))
        .cloned()
        .collect()
}

/// One entry per colour that occurs, in palette order.
pub fn color_counts(tasks: &[TaskRecord]) -> Vec<ColorCount> {
    Color::iter()
        .map(|color| ColorCount {
            color,
            count: tasks.iter().filter(|task| task.color == color).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

/// One entry per calendar day in `[from, to]`, zero days included.
pub fn daily_counts<Tz: TimeZone>(
    tasks: &[TaskRecord],
    from: NaiveDate,
    to: NaiveDate,
    tz: &Tz,
) -> Vec<DayCount> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .map(|date| DayCount {
            date,
            count: tasks
                .iter()
                .filter(|task| due_day(task, tz) == Some(date))
                .count(),
        })
        .collect()
}
