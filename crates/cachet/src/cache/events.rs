//! Lifecycle event hooks.
//!
//! Each cache instance carries an optional callback per lifecycle event:
//! hit, miss, added, removed, and count-changed. Callbacks are invoked
//! synchronously in mutation order, after the storage lock has been
//! released, so a callback may freely call back into the cache.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::key::CacheKey;

/// Payload for key-scoped lifecycle events (hit, miss, added, removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventData {
    /// Id of the cache instance that fired the event.
    pub id: String,
    /// Canonical key the event refers to.
    pub key: String,
}

/// Payload for the count-changed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEventData {
    /// Id of the cache instance that fired the event.
    pub id: String,
    /// Number of entries currently stored.
    pub count: usize,
}

/// Callback invoked with a key-scoped event payload.
pub type EventCallback = Arc<dyn Fn(EventData) + Send + Sync>;

/// Callback invoked when the entry count changes.
pub type CountEventCallback = Arc<dyn Fn(CountEventData) + Send + Sync>;

/// The optional lifecycle callbacks of one cache instance.
#[derive(Clone, Default)]
pub struct EventHooks {
    pub(crate) on_hit: Option<EventCallback>,
    pub(crate) on_miss: Option<EventCallback>,
    pub(crate) on_added: Option<EventCallback>,
    pub(crate) on_removed: Option<EventCallback>,
    pub(crate) on_count_changed: Option<CountEventCallback>,
}

impl EventHooks {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called every time a lookup finds a live entry.
    pub fn on_hit<F>(mut self, callback: F) -> Self
    where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        self.on_hit = Some(Arc::new(callback));
        self
    }

    /// Called every time a lookup finds nothing.
    pub fn on_miss<F>(mut self, callback: F) -> Self
    where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        self.on_miss = Some(Arc::new(callback));
        self
    }

    /// Called every time an entry is stored or replaced.
    pub fn on_added<F>(mut self, callback: F) -> Self
    where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        self.on_added = Some(Arc::new(callback));
        self
    }

    /// Called every time an entry is removed, including expiry eviction.
    pub fn on_removed<F>(mut self, callback: F) -> Self
    where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        self.on_removed = Some(Arc::new(callback));
        self
    }

    /// Called after additions and removals with the current entry count.
    pub fn on_count_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(CountEventData) + Send + Sync + 'static,
    {
        self.on_count_changed = Some(Arc::new(callback));
        self
    }

    /// Dispatch a batch of events collected during one operation.
    pub(crate) fn dispatch(&self, id: &str, events: Vec<CacheEvent>) {
        for event in events {
            match event {
                CacheEvent::Hit(key) => Self::emit(&self.on_hit, id, key),
                CacheEvent::Miss(key) => Self::emit(&self.on_miss, id, key),
                CacheEvent::Added(key) => Self::emit(&self.on_added, id, key),
                CacheEvent::Removed(key) => Self::emit(&self.on_removed, id, key),
                CacheEvent::CountChanged(count) => {
                    if let Some(callback) = &self.on_count_changed {
                        callback(CountEventData { id: id.to_string(), count });
                    }
                }
            }
        }
    }

    fn emit(callback: &Option<EventCallback>, id: &str, key: CacheKey) {
        if let Some(callback) = callback {
            callback(EventData { id: id.to_string(), key: key.into_string() });
        }
    }
}

impl fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("on_hit", &self.on_hit.is_some())
            .field("on_miss", &self.on_miss.is_some())
            .field("on_added", &self.on_added.is_some())
            .field("on_removed", &self.on_removed.is_some())
            .field("on_count_changed", &self.on_count_changed.is_some())
            .finish()
    }
}

/// An event recorded under the storage lock, dispatched after release.
#[derive(Debug)]
pub(crate) enum CacheEvent {
    Hit(CacheKey),
    Miss(CacheKey),
    Added(CacheKey),
    Removed(CacheKey),
    CountChanged(usize),
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::events.
    use std::sync::Mutex;

    use super::*;

    /// Validates `EventHooks::dispatch` behavior for the ordered dispatch
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms callbacks fire in the order events were recorded.
    /// - Confirms payloads carry the instance id and canonical key.
    #[test]
    fn test_dispatch_preserves_order_and_payloads() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let added = Arc::clone(&seen);
        let counted = Arc::clone(&seen);
        let hooks = EventHooks::new()
            .on_added(move |event| {
                added.lock().unwrap().push(format!("added:{}:{}", event.id, event.key));
            })
            .on_count_changed(move |event| {
                counted.lock().unwrap().push(format!("count:{}:{}", event.id, event.count));
            });

        hooks.dispatch(
            "c1",
            vec![
                CacheEvent::Added(CacheKey::normalize("the key")),
                CacheEvent::CountChanged(1),
            ],
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["added:c1:the_key", "count:c1:1"]);
    }

    /// Validates `EventHooks::dispatch` behavior for the unset hook scenario.
    ///
    /// Assertions:
    /// - Ensures dispatching with no callbacks installed is a no-op.
    #[test]
    fn test_dispatch_without_hooks_is_noop() {
        let hooks = EventHooks::new();
        hooks.dispatch("c1", vec![CacheEvent::Hit(CacheKey::normalize("k"))]);
    }

    /// Validates `EventHooks::fmt` behavior for the debug scenario.
    ///
    /// Assertions:
    /// - Confirms the debug output reports which hooks are installed.
    #[test]
    fn test_debug_reports_installed_hooks() {
        let hooks = EventHooks::new().on_hit(|_| {});
        let rendered = format!("{hooks:?}");
        assert!(rendered.contains("on_hit: true"));
        assert!(rendered.contains("on_miss: false"));
    }
}
