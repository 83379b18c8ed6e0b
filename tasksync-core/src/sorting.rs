use crate::models::TaskRecord;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Tasks shown when the board first renders.
pub const FIRST_PAGE_SIZE: usize = 8;
/// Tasks added by each "load more".
pub const LOAD_MORE_STEP: usize = 8;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortType {
    #[default]
    Default,
    DateUp,
    DateDown,
}

/// Stable sort. Undated tasks come first ascending and last descending.
pub fn sort_tasks(tasks: &[TaskRecord], sort: SortType) -> Vec<TaskRecord> {
    let mut sorted = tasks.to_vec();
    match sort {
        SortType::Default => {}
        SortType::DateUp => sorted.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        SortType::DateDown => sorted.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
    }
    sorted
}

/// Sorted slice `[from, to)`, clamped to the list length.
pub fn sorted_page(tasks: &[TaskRecord], sort: SortType, from: usize, to: usize) -> Vec<TaskRecord> {
    let sorted = sort_tasks(tasks, sort);
    let end = to.min(sorted.len());
    let start = from.min(end);
    sorted[start..end].to_vec()
}

/// Exclusive end index after `loads` presses of "load more".
pub fn page_end(loads: usize) -> usize {
    FIRST_PAGE_SIZE + loads * LOAD_MORE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tasks() -> Vec<TaskRecord> {
        let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap();
        vec![
            TaskRecord::new("b").with_id("b").with_due_date(day(3)),
            TaskRecord::new("none").with_id("none"),
            TaskRecord::new("a").with_id("a").with_due_date(day(1)),
            TaskRecord::new("c").with_id("c").with_due_date(day(5)),
        ]
    }

    fn ids(tasks: &[TaskRecord]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_default_keeps_insertion_order() {
        assert_eq!(ids(&sort_tasks(&tasks(), SortType::Default)), vec!["b", "none", "a", "c"]);
    }

    #[test]
    fn test_date_sorts() {
        assert_eq!(ids(&sort_tasks(&tasks(), SortType::DateUp)), vec!["none", "a", "b", "c"]);
        assert_eq!(ids(&sort_tasks(&tasks(), SortType::DateDown)), vec!["c", "b", "a", "none"]);
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(ids(&sorted_page(&tasks(), SortType::DateUp, 1, 3)), vec!["a", "b"]);
        assert!(sorted_page(&tasks(), SortType::Default, 8, 16).is_empty());
        assert_eq!(sorted_page(&tasks(), SortType::Default, 0, page_end(0)).len(), 4);
        assert_eq!(page_end(2), 24);
    }

    #[test]
    fn test_sort_type_names() {
        assert_eq!(SortType::DateUp.to_string(), "date-up");
        assert_eq!("date-down".parse::<SortType>().unwrap(), SortType::DateDown);
    }
}
