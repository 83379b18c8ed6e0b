use crate::events::{EventBus, ModelEvent};
use chrono::{DateTime, Local, TimeZone};
use tasksync_core::filters::{filter_counts, tasks_by_filter};
use tasksync_core::{FilterCount, FilterType, TaskId, TaskRecord};

/// In-memory task list plus the active filter.
///
/// Every mutation replaces the list and emits [`ModelEvent::DataChanged`];
/// filter changes emit [`ModelEvent::FilterChanged`].
#[derive(Default)]
pub struct TasksModel {
    tasks: Vec<TaskRecord>,
    active_filter: FilterType,
    events: EventBus,
}

impl TasksModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Tasks passing the active filter, evaluated against the local clock.
    pub fn get_tasks(&self) -> Vec<TaskRecord> {
        self.get_tasks_at(&Local::now())
    }

    pub fn get_tasks_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<TaskRecord> {
        tasks_by_filter(&self.tasks, self.active_filter, now)
    }

    pub fn get_unfiltered_tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn get_archived_tasks(&self) -> Vec<TaskRecord> {
        self.tasks.iter().filter(|task| task.is_archived).cloned().collect()
    }

    pub fn active_filter(&self) -> FilterType {
        self.active_filter
    }

    pub fn filter_counts_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<FilterCount> {
        filter_counts(&self.tasks, now)
    }

    pub fn filter_counts(&self) -> Vec<FilterCount> {
        self.filter_counts_at(&Local::now())
    }

    pub fn set_tasks(&mut self, tasks: Vec<TaskRecord>) {
        self.tasks = tasks;
        self.data_changed();
    }

    /// New tasks go to the top of the list.
    pub fn add_task(&mut self, task: TaskRecord) {
        let mut tasks = Vec::with_capacity(self.tasks.len() + 1);
        tasks.push(task);
        tasks.extend(self.tasks.iter().cloned());
        self.tasks = tasks;
        self.data_changed();
    }

    /// Replace the task stored under `id`. `false` if there is none.
    pub fn update_task(&mut self, id: &TaskId, task: TaskRecord) -> bool {
        let Some(index) = self.tasks.iter().position(|it| &it.id == id) else {
            return false;
        };

        let mut tasks = self.tasks.clone();
        tasks[index] = task;
        self.tasks = tasks;
        self.data_changed();
        true
    }

    pub fn remove_task(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        let tasks: Vec<TaskRecord> = self.tasks.iter().filter(|it| &it.id != id).cloned().collect();
        if tasks.len() == before {
            return false;
        }

        self.tasks = tasks;
        self.data_changed();
        true
    }

    pub fn set_filter(&mut self, filter: FilterType) {
        self.active_filter = filter;
        self.events.emit(&ModelEvent::FilterChanged { filter });
    }

    pub fn reset_filter(&mut self) {
        self.set_filter(FilterType::All);
    }

    fn data_changed(&self) {
        self.events.emit(&ModelEvent::DataChanged {
            task_count: self.tasks.len(),
        });
    }
}
