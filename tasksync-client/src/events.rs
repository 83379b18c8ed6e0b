//! Change notifications for the task model.
//!
//! Subscribers register a closure, optionally restricted to one [`EventKind`],
//! and get back a [`Subscription`] handle that can later be passed to
//! [`EventBus::unsubscribe`]. Callbacks run synchronously on the thread that
//! emits the event, after the bus lock has been released, so a callback may
//! subscribe or unsubscribe without deadlocking.
//!
//! ```rust
//! use tasksync_client::events::{EventBus, EventKind, ModelEvent};
//!
//! let bus = EventBus::new();
//! let subscription = bus
//!     .subscribe_to(EventKind::FilterChanged, |event| {
//!         if let ModelEvent::FilterChanged { filter } = event {
//!             println!("filter is now {}", filter);
//!         }
//!     })
//!     .unwrap();
//!
//! assert!(bus.unsubscribe(subscription).unwrap());
//! ```

use crate::errors::{ClientError, ClientResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tasksync_core::FilterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DataChanged,
    FilterChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// The task list was replaced or edited.
    DataChanged { task_count: usize },
    /// A different filter became active.
    FilterChanged { filter: FilterType },
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::DataChanged { .. } => EventKind::DataChanged,
            ModelEvent::FilterChanged { .. } => EventKind::FilterChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback = Arc<dyn Fn(&ModelEvent) + Send + Sync>;

struct CallbackEntry {
    id: u64,
    event_filter: Option<EventKind>,
    callback: Callback,
}

pub struct EventBus {
    callbacks: Mutex<Vec<CallbackEntry>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Receive every event.
    pub fn subscribe<F>(&self, callback: F) -> ClientResult<Subscription>
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(callback))
    }

    /// Receive only events of `kind`.
    pub fn subscribe_to<F>(&self, kind: EventKind, callback: F) -> ClientResult<Subscription>
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(callback))
    }

    /// Returns `false` if the handle was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> ClientResult<bool> {
        let mut callbacks = self
            .callbacks
            .lock()
            .map_err(|_| ClientError::LockError("callbacks".into()))?;
        let before = callbacks.len();
        callbacks.retain(|entry| entry.id != subscription.0);
        Ok(callbacks.len() != before)
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Deliver `event` to every matching subscriber. Returns how many ran.
    pub fn emit(&self, event: &ModelEvent) -> usize {
        let targets: Vec<Callback> = match self.callbacks.lock() {
            Ok(callbacks) => callbacks
                .iter()
                .filter(|entry| entry.event_filter.map_or(true, |kind| kind == event.kind()))
                .map(|entry| entry.callback.clone())
                .collect(),
            Err(_) => {
                tracing::error!("Failed to acquire callback lock for event emission");
                return 0;
            }
        };

        for callback in &targets {
            callback(event);
        }
        targets.len()
    }

    fn register(&self, event_filter: Option<EventKind>, callback: Callback) -> ClientResult<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut callbacks = self
            .callbacks
            .lock()
            .map_err(|_| ClientError::LockError("callbacks".into()))?;
        callbacks.push(CallbackEntry {
            id,
            event_filter,
            callback,
        });
        Ok(Subscription(id))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_emit() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        bus.subscribe(move |event| seen_clone.lock().unwrap().push(event.clone()))
            .unwrap();

        assert_eq!(bus.emit(&ModelEvent::DataChanged { task_count: 3 }), 1);
        assert_eq!(
            bus.emit(&ModelEvent::FilterChanged {
                filter: FilterType::Archive
            }),
            1
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ModelEvent::DataChanged { task_count: 3 });
    }

    #[test]
    fn test_kind_filtering() {
        let bus = EventBus::new();
        let data = Arc::new(AtomicUsize::new(0));
        let filter = Arc::new(AtomicUsize::new(0));
        let data_clone = data.clone();
        let filter_clone = filter.clone();

        bus.subscribe_to(EventKind::DataChanged, move |_| {
            data_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        bus.subscribe_to(EventKind::FilterChanged, move |_| {
            filter_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        bus.emit(&ModelEvent::DataChanged { task_count: 0 });
        bus.emit(&ModelEvent::DataChanged { task_count: 1 });
        bus.emit(&ModelEvent::FilterChanged {
            filter: FilterType::Today,
        });

        assert_eq!(data.load(Ordering::SeqCst), 2);
        assert_eq!(filter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let subscription = bus
            .subscribe(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert!(bus.unsubscribe(subscription).unwrap());
        assert!(!bus.unsubscribe(subscription).unwrap());
        assert_eq!(bus.emit(&ModelEvent::DataChanged { task_count: 0 }), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let handle = Arc::new(Mutex::new(None::<Subscription>));
        let bus_clone = bus.clone();
        let handle_clone = handle.clone();

        let subscription = bus
            .subscribe(move |_| {
                if let Some(sub) = *handle_clone.lock().unwrap() {
                    bus_clone.unsubscribe(sub).unwrap();
                }
            })
            .unwrap();
        *handle.lock().unwrap() = Some(subscription);

        bus.emit(&ModelEvent::DataChanged { task_count: 0 });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
