//! Core cache instance: keyed storage, TTL expiry, value isolation,
//! lifecycle events, and read-through population.
//!
//! All store operations are synchronous and atomic under the storage lock;
//! the only suspension points are producer invocations (in
//! [`Cache::get_and_set`]) and refresh timers, neither of which holds the
//! lock. Event callbacks run after the lock is released.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::config::{CacheConfig, GetAndSetOptions, InstanceOptions};
use super::events::{CacheEvent, EventHooks};
use super::key::CacheKey;
use super::refresh::{self, Producer, RefreshSchedule, RefreshTask};
use super::stats::{CacheStats, MetricsCollector};
use crate::clock::{Clock, SystemClock};
use crate::error::{BoxError, CacheError, CacheResult};
use crate::value::CacheValue;

/// Time-to-live substituted when a resolved ttl of zero asks for "never
/// expires". Far enough in the future to outlive any realistic process.
const NEVER_EXPIRES: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Entry stored in the cache.
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    /// Position in insertion order, preserved across overwrites.
    insertion_order: u64,
    /// Active background refresh arming, if any.
    refresh: Option<RefreshTask>,
}

/// Internal storage for cache entries.
#[derive(Debug)]
pub(crate) struct CacheStorage<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    insertion_counter: u64,
}

impl<V> CacheStorage<V> {
    fn new() -> Self {
        Self { entries: HashMap::new(), insertion_counter: 0 }
    }
}

/// A keyed in-memory cache instance with TTL expiry.
///
/// Keys are normalized to a canonical `[A-Za-z0-9_]` form on every public
/// operation. Entries expire lazily: an expired entry is evicted by the next
/// lookup that touches it, and the instance-level sweep exposed through
/// [`Cache::keys`] and [`Cache::get_expiry`] lets a registry force that
/// eviction periodically.
///
/// Cloning a `Cache` is cheap and shares the underlying storage.
///
/// # Type Parameters
/// - `V`: Value type (must implement [`CacheValue`])
/// - `C`: Clock used for expiry arithmetic (defaults to [`SystemClock`])
///
/// # Example
/// ```
/// use cachet::{Cache, CacheConfig};
/// use std::time::Duration;
///
/// let cache: Cache<i32> = Cache::new(CacheConfig::with_ttl(Duration::from_secs(60)));
/// cache.set("answer", 42);
/// assert_eq!(cache.get("answer"), Some(42));
/// ```
pub struct Cache<V, C = SystemClock>
where
    V: CacheValue,
    C: Clock + Clone,
{
    storage: Arc<RwLock<CacheStorage<V>>>,
    id: Arc<str>,
    options: InstanceOptions,
    hooks: EventHooks,
    metrics: MetricsCollector,
    clock: C,
}

impl<V> Cache<V, SystemClock>
where
    V: CacheValue,
{
    /// Create a new cache instance using the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<V, C> Cache<V, C>
where
    V: CacheValue,
    C: Clock + Clone,
{
    /// Create a new cache instance with a custom clock (useful for testing).
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        let CacheConfig { id, ttl, clone_values, store_empty_values, hooks } = config;
        let id: Arc<str> = id.unwrap_or_else(|| Uuid::new_v4().to_string()).into();
        let options = InstanceOptions {
            ttl: ttl.unwrap_or(Duration::ZERO),
            clone_values: clone_values.unwrap_or(true),
            store_empty_values: store_empty_values.unwrap_or(false),
        };

        debug!(id = %id, ?options, "created cache instance");

        Self {
            storage: Arc::new(RwLock::new(CacheStorage::new())),
            id,
            options,
            hooks,
            metrics: MetricsCollector::new(),
            clock,
        }
    }

    /// The id of this instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resolved options this instance was created with.
    pub fn options(&self) -> InstanceOptions {
        self.options
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key was never stored or its entry has expired;
    /// an expired entry is evicted on the way (firing the removed and
    /// count-changed hooks). Counts a hit or a miss and fires the matching
    /// hook. With value isolation enabled the returned value is a deep copy.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_by_key(&CacheKey::normalize(key))
    }

    pub(crate) fn get_by_key(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut events = Vec::new();
        let value = {
            let mut storage = self.storage.write();
            let expired = matches!(storage.entries.get(key), Some(entry) if entry.expires_at <= now);
            if expired {
                Self::evict(&mut storage, key, &mut events);
                None
            } else {
                storage.entries.get(key).map(|entry| self.isolate(&entry.value))
            }
        };

        let outcome = if value.is_some() {
            self.metrics.record_hit();
            events.push(CacheEvent::Hit(key.clone()));
            "hit"
        } else {
            self.metrics.record_miss();
            events.push(CacheEvent::Miss(key.clone()));
            "miss"
        };

        debug!(operation = "get", id = %self.id, key = key.as_str(), outcome);
        self.dispatch(events);
        value
    }

    /// Get the expiry instant of a cached entry.
    ///
    /// Applies the same lazy eviction as [`Cache::get`] but does not count a
    /// hit or a miss. Entries stored with a zero ttl report an instant far
    /// enough in the future to be treated as "never expires".
    pub fn get_expiry(&self, key: &str) -> Option<Instant> {
        let key = CacheKey::normalize(key);
        let now = self.clock.now();
        let mut events = Vec::new();
        let expiry = {
            let mut storage = self.storage.write();
            let expired = matches!(storage.entries.get(&key), Some(entry) if entry.expires_at <= now);
            if expired {
                Self::evict(&mut storage, &key, &mut events);
                None
            } else {
                storage.entries.get(&key).map(|entry| entry.expires_at)
            }
        };

        debug!(operation = "get_expiry", id = %self.id, key = key.as_str(), found = expiry.is_some());
        self.dispatch(events);
        expiry
    }

    /// Store a value under a key with the instance's default ttl.
    ///
    /// A logically-null value is treated as a removal unless the instance
    /// stores empty values. Replacing an entry cancels its background
    /// refresh. Fires the added hook, then the count-changed hook.
    pub fn set(&self, key: &str, value: V) {
        self.set_by_key(&CacheKey::normalize(key), &value, None);
    }

    /// Store a value with an explicit time-to-live.
    ///
    /// A ttl of zero means the entry never expires.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        self.set_by_key(&CacheKey::normalize(key), &value, Some(ttl));
    }

    /// Store a value; returns whether an entry was actually written (false
    /// when an empty value turned into a removal).
    pub(crate) fn set_by_key(&self, key: &CacheKey, value: &V, ttl: Option<Duration>) -> bool {
        if value.is_logically_null() && !self.options.store_empty_values {
            debug!(operation = "set", id = %self.id, key = key.as_str(), outcome = "empty value, removing");
            self.remove_by_key(key);
            return false;
        }

        let expires_at = self.expiry_for(ttl);
        let stored = self.isolate(value);
        let mut events = Vec::new();
        {
            let mut storage = self.storage.write();
            let insertion_order = match storage.entries.remove(key) {
                Some(prior) => {
                    if let Some(task) = prior.refresh {
                        task.cancel();
                    }
                    prior.insertion_order
                }
                None => {
                    let next = storage.insertion_counter;
                    storage.insertion_counter += 1;
                    next
                }
            };
            storage.entries.insert(
                key.clone(),
                CacheEntry { value: stored, expires_at, insertion_order, refresh: None },
            );
            events.push(CacheEvent::Added(key.clone()));
            events.push(CacheEvent::CountChanged(storage.entries.len()));
        }

        debug!(operation = "set", id = %self.id, key = key.as_str(), outcome = "stored");
        self.dispatch(events);
        true
    }

    /// Remove an entry, cancelling its background refresh.
    ///
    /// The removed and count-changed hooks fire whether or not the key was
    /// present.
    pub fn remove(&self, key: &str) {
        self.remove_by_key(&CacheKey::normalize(key));
    }

    pub(crate) fn remove_by_key(&self, key: &CacheKey) {
        let mut events = Vec::new();
        {
            let mut storage = self.storage.write();
            if let Some(entry) = storage.entries.remove(key) {
                if let Some(task) = entry.refresh {
                    task.cancel();
                }
            }
            // Removal events fire even for absent keys.
            events.push(CacheEvent::Removed(key.clone()));
            events.push(CacheEvent::CountChanged(storage.entries.len()));
        }

        debug!(operation = "remove", id = %self.id, key = key.as_str());
        self.dispatch(events);
    }

    /// Remove every entry, cancel every refresh task, and reset the hit and
    /// miss counters. Does not fire per-key hooks.
    pub fn clear(&self) {
        let mut storage = self.storage.write();
        for (_, entry) in storage.entries.drain() {
            if let Some(task) = entry.refresh {
                task.cancel();
            }
        }
        storage.insertion_counter = 0;
        drop(storage);

        self.metrics.reset();
        debug!(operation = "clear", id = %self.id);
    }

    /// All currently stored canonical keys, in insertion order.
    ///
    /// Expired entries are **not** evicted (or filtered) here, so a returned
    /// key is not guaranteed to still be live; pairing this with
    /// [`Cache::get_expiry`] per key forces eviction of the expired ones.
    pub fn keys(&self) -> Vec<String> {
        let storage = self.storage.read();
        let mut ordered: Vec<_> = storage
            .entries
            .iter()
            .map(|(key, entry)| (entry.insertion_order, key.clone()))
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered.into_iter().map(|(_, key)| key.into_string()).collect()
    }

    /// Number of stored entries (live or not yet lazily evicted).
    pub fn len(&self) -> usize {
        self.storage.read().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.read().entries.is_empty()
    }

    /// Usage statistics since creation or the last clear.
    pub fn stats(&self) -> CacheStats {
        let count = self.storage.read().entries.len();
        self.metrics.snapshot(count)
    }

    /// Get a cached value, or produce and store it on a miss.
    ///
    /// Equivalent to [`Cache::get_and_set_with`] with default options.
    pub async fn get_and_set<F, Fut>(&self, key: &str, producer: F) -> CacheResult<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, BoxError>> + Send + 'static,
    {
        self.get_and_set_with(key, producer, GetAndSetOptions::default()).await
    }

    /// Get a cached value, or produce and store it on a miss, optionally
    /// keeping it fresh in the background.
    ///
    /// A hit returns the cached value without invoking the producer and
    /// without touching any existing refresh arming. A miss invokes the
    /// producer exactly once for this call; concurrent overlapping calls for
    /// the same key are **not** deduplicated and will each invoke their own
    /// producer. On success the result is stored (an empty result is a
    /// removal, like [`Cache::set`]) and, when `refresh_interval` is set and
    /// the entry was written, a background refresh task is armed for the key.
    ///
    /// # Errors
    ///
    /// Producer failures during this initial population propagate as
    /// [`CacheError::Producer`]; nothing is stored and no refresh is armed.
    pub async fn get_and_set_with<F, Fut>(
        &self,
        key: &str,
        producer: F,
        options: GetAndSetOptions,
    ) -> CacheResult<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, BoxError>> + Send + 'static,
    {
        let key = CacheKey::normalize(key);

        if let Some(value) = self.get_by_key(&key) {
            debug!(operation = "get_and_set", id = %self.id, key = key.as_str(), outcome = "hit");
            return Ok(value);
        }

        debug!(operation = "get_and_set", id = %self.id, key = key.as_str(), outcome = "miss, invoking producer");
        let value = producer().await.map_err(CacheError::Producer)?;

        let stored = self.set_by_key(&key, &value, options.ttl);
        if stored {
            if let Some(schedule) = RefreshSchedule::from_options(&options) {
                let producer: Producer<V> = Arc::new(move || producer().boxed());
                self.arm_refresh(key, producer, schedule);
            }
        }

        Ok(value)
    }

    /// Arm the background refresh loop for a key that was just stored.
    fn arm_refresh(&self, key: CacheKey, producer: Producer<V>, schedule: RefreshSchedule) {
        let token = CancellationToken::new();
        let handle = tokio::spawn(refresh::run(
            self.downgrade(),
            key.clone(),
            producer,
            schedule,
            token.clone(),
        ));
        let task = RefreshTask::new(token, handle);

        let mut storage = self.storage.write();
        if let Some(entry) = storage.entries.get_mut(&key) {
            debug!(operation = "refresh", id = %self.id, key = key.as_str(), outcome = "armed");
            if let Some(prior) = entry.refresh.replace(task) {
                prior.cancel();
            }
        } else {
            // The entry vanished between the store and this arming.
            task.cancel();
        }
    }

    /// Store the result of a refresh cycle.
    ///
    /// Returns false when this arming has been cancelled or its entry no
    /// longer exists, which terminates the refresh loop. The token check
    /// happens under the storage lock, so a removal that cancelled the token
    /// can never be overwritten by an in-flight cycle.
    pub(crate) fn store_refreshed(
        &self,
        key: &CacheKey,
        value: &V,
        token: &CancellationToken,
        ttl: Option<Duration>,
    ) -> bool {
        if value.is_logically_null() && !self.options.store_empty_values {
            debug!(operation = "refresh", id = %self.id, key = key.as_str(), outcome = "empty value, removing");
            self.remove_by_key(key);
            return false;
        }

        let expires_at = self.expiry_for(ttl);
        let stored = self.isolate(value);
        let mut events = Vec::new();
        let replaced = {
            let mut storage = self.storage.write();
            if token.is_cancelled() {
                false
            } else if let Some(entry) = storage.entries.get_mut(key) {
                entry.value = stored;
                entry.expires_at = expires_at;
                events.push(CacheEvent::Added(key.clone()));
                events.push(CacheEvent::CountChanged(storage.entries.len()));
                true
            } else {
                false
            }
        };

        let outcome = if replaced { "refreshed" } else { "stale arming, dropped" };
        debug!(operation = "refresh", id = %self.id, key = key.as_str(), outcome);
        self.dispatch(events);
        replaced
    }

    pub(crate) fn downgrade(&self) -> WeakCache<V, C> {
        WeakCache {
            storage: Arc::downgrade(&self.storage),
            id: Arc::clone(&self.id),
            options: self.options,
            hooks: self.hooks.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }

    fn expiry_for(&self, ttl: Option<Duration>) -> Instant {
        let ttl = ttl.unwrap_or(self.options.ttl);
        let ttl = if ttl.is_zero() { NEVER_EXPIRES } else { ttl };
        self.clock.now() + ttl
    }

    fn isolate(&self, value: &V) -> V {
        if self.options.clone_values {
            value.deep_copy()
        } else {
            value.clone()
        }
    }

    /// Remove an expired entry found by a lookup.
    fn evict(storage: &mut CacheStorage<V>, key: &CacheKey, events: &mut Vec<CacheEvent>) {
        if let Some(entry) = storage.entries.remove(key) {
            if let Some(task) = entry.refresh {
                task.cancel();
            }
            events.push(CacheEvent::Removed(key.clone()));
            events.push(CacheEvent::CountChanged(storage.entries.len()));
        }
    }

    fn dispatch(&self, events: Vec<CacheEvent>) {
        if events.is_empty() {
            return;
        }
        self.hooks.dispatch(&self.id, events);
    }
}

impl<V, C> Clone for Cache<V, C>
where
    V: CacheValue,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            id: Arc::clone(&self.id),
            options: self.options,
            hooks: self.hooks.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// Weak handle held by background refresh tasks.
///
/// Upgrading fails once every strong handle to the cache storage is gone,
/// which terminates the task instead of keeping an abandoned instance alive.
pub(crate) struct WeakCache<V, C>
where
    V: CacheValue,
    C: Clock + Clone,
{
    storage: Weak<RwLock<CacheStorage<V>>>,
    id: Arc<str>,
    options: InstanceOptions,
    hooks: EventHooks,
    metrics: MetricsCollector,
    clock: C,
}

impl<V, C> WeakCache<V, C>
where
    V: CacheValue,
    C: Clock + Clone,
{
    pub(crate) fn upgrade(&self) -> Option<Cache<V, C>> {
        self.storage.upgrade().map(|storage| Cache {
            storage,
            id: Arc::clone(&self.id),
            options: self.options,
            hooks: self.hooks.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        })
    }
}
