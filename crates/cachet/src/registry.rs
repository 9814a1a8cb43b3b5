//! Instance registry: process-wide defaults, instance tracking, and the
//! global expiry sweeper.
//!
//! A [`Registry`] owns an explicit collection of live cache instances and
//! the default options applied to instances created through it. There is no
//! ambient global state: callers construct a registry, hand it a
//! [`RegistryConfig`], and share it wherever instances need to be created or
//! looked up.
//!
//! The registry can also run a **sweeper**: a recurring task that walks
//! every instance's keys and queries each key's expiry, which forces lazy
//! eviction of expired entries that no caller would otherwise touch.
//!
//! # Examples
//!
//! ```
//! use cachet::{Cache, CacheConfig, Registry, RegistryConfig};
//! use std::time::Duration;
//!
//! let registry = Registry::with_defaults(
//!     RegistryConfig::builder().default_ttl(Duration::from_secs(60)).build(),
//! );
//!
//! let sessions: Cache<String> =
//!     registry.create(CacheConfig::builder().id("sessions").build());
//! assert_eq!(sessions.options().ttl, Duration::from_secs(60));
//!
//! let found: Option<Cache<String>> = registry.instance("sessions");
//! assert!(found.is_some());
//! ```

use std::any::Any;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{Cache, CacheConfig, CacheStats};
use crate::clock::Clock;
use crate::value::CacheValue;

/// The registry-facing surface of a cache instance, independent of its
/// value type.
///
/// This is the interface the sweeper works against: enumerating keys and
/// querying expiry per key is exactly the combination that forces lazy
/// eviction without touching hit/miss statistics.
pub trait CacheHandle: Send + Sync {
    /// The id of the instance.
    fn id(&self) -> &str;

    /// All stored canonical keys in insertion order, expired ones included.
    fn keys(&self) -> Vec<String>;

    /// The expiry of a key, evicting it when already expired.
    fn get_expiry(&self, key: &str) -> Option<Instant>;

    /// Usage statistics for the instance.
    fn stats(&self) -> CacheStats;

    /// Remove all entries and reset statistics.
    fn clear(&self);

    /// Type-erased self, for recovering the concrete `Cache<V>`.
    fn as_any(&self) -> &dyn Any;
}

impl<V, C> CacheHandle for Cache<V, C>
where
    V: CacheValue,
    C: Clock + Clone,
{
    fn id(&self) -> &str {
        Cache::id(self)
    }

    fn keys(&self) -> Vec<String> {
        Cache::keys(self)
    }

    fn get_expiry(&self, key: &str) -> Option<Instant> {
        Cache::get_expiry(self, key)
    }

    fn stats(&self) -> CacheStats {
        Cache::stats(self)
    }

    fn clear(&self) {
        Cache::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Default options a registry applies to instances created through it.
///
/// Explicit options on the [`CacheConfig`] passed to [`Registry::create`]
/// always win; these fill in whatever was left unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Default time-to-live; zero means entries never expire.
    pub default_ttl: Duration,
    /// Whether values are deep-copied on both store boundaries.
    pub clone_values: bool,
    /// Whether logically-null values are persisted.
    pub store_empty_values: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { default_ttl: Duration::ZERO, clone_values: true, store_empty_values: false }
    }
}

impl RegistryConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }
}

/// Builder for [`RegistryConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default time-to-live. Zero means entries never expire.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Set the default value isolation policy.
    pub fn clone_values(mut self, enabled: bool) -> Self {
        self.config.clone_values = enabled;
        self
    }

    /// Set the default empty-value policy.
    pub fn store_empty_values(mut self, enabled: bool) -> Self {
        self.config.store_empty_values = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RegistryConfig {
        self.config
    }
}

/// Statistics of one registered instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceStats {
    /// Instance id.
    pub id: String,
    /// Usage statistics snapshot.
    pub stats: CacheStats,
}

/// Handle to the running sweeper task.
#[derive(Debug)]
struct Sweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    fn cancel(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}

struct RegistryInner {
    defaults: RegistryConfig,
    instances: Mutex<Vec<Arc<dyn CacheHandle>>>,
    sweeper: Mutex<Option<Sweeper>>,
}

/// An owned collection of cache instances with shared defaults and an
/// optional global expiry sweeper.
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create a registry with library defaults.
    pub fn new() -> Self {
        Self::with_defaults(RegistryConfig::default())
    }

    /// Create a registry with explicit defaults.
    pub fn with_defaults(defaults: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                defaults,
                instances: Mutex::new(Vec::new()),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// The defaults applied to instances created through this registry.
    pub fn defaults(&self) -> &RegistryConfig {
        &self.inner.defaults
    }

    /// Create and register a new cache instance.
    ///
    /// Fields left unset on `config` fall back to the registry defaults.
    pub fn create<V: CacheValue>(&self, mut config: CacheConfig) -> Cache<V> {
        let defaults = &self.inner.defaults;
        config.ttl = config.ttl.or(Some(defaults.default_ttl));
        config.clone_values = config.clone_values.or(Some(defaults.clone_values));
        config.store_empty_values =
            config.store_empty_values.or(Some(defaults.store_empty_values));

        let cache = Cache::new(config);
        debug!(id = cache.id(), "registered cache instance");
        self.inner.instances.lock().push(Arc::new(cache.clone()));
        cache
    }

    /// Look up a registered instance by id.
    ///
    /// Returns `None` when no instance has the id, or when the instance with
    /// that id stores a different value type.
    pub fn instance<V: CacheValue>(&self, id: &str) -> Option<Cache<V>> {
        let instances = self.inner.instances.lock();
        instances
            .iter()
            .find(|handle| handle.id() == id)
            .and_then(|handle| handle.as_any().downcast_ref::<Cache<V>>().cloned())
    }

    /// Ids of all registered instances, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.inner.instances.lock().iter().map(|handle| handle.id().to_string()).collect()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.inner.instances.lock().len()
    }

    /// Whether no instances are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.instances.lock().is_empty()
    }

    /// Usage statistics for every registered instance.
    pub fn stats(&self) -> Vec<InstanceStats> {
        self.inner
            .instances
            .lock()
            .iter()
            .map(|handle| InstanceStats { id: handle.id().to_string(), stats: handle.stats() })
            .collect()
    }

    /// Clear every registered instance. Instances remain registered.
    pub fn clear_all(&self) {
        for handle in self.inner.instances.lock().iter() {
            handle.clear();
            debug!(id = handle.id(), "cleared cache instance");
        }
    }

    /// Start (or restart) the global expiry sweeper.
    ///
    /// Every `every`, the sweeper walks each registered instance's keys and
    /// queries their expiry, evicting entries that have expired since they
    /// were last touched. Calling this again replaces the running sweeper.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_sweeper(&self, every: Duration) {
        let token = CancellationToken::new();
        let handle =
            tokio::spawn(sweep_loop(Arc::downgrade(&self.inner), every, token.clone()));

        let mut sweeper = self.inner.sweeper.lock();
        if let Some(prior) = sweeper.take() {
            prior.cancel();
        }
        *sweeper = Some(Sweeper { token, handle });
        debug!(every_ms = every.as_millis() as u64, "expiry sweeper started");
    }

    /// Stop the global expiry sweeper, if one is running.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = self.inner.sweeper.lock().take() {
            sweeper.cancel();
            debug!("expiry sweeper stopped");
        }
    }

    /// Whether a sweeper task is currently installed.
    pub fn sweeper_running(&self) -> bool {
        self.inner.sweeper.lock().as_ref().map(|s| !s.handle.is_finished()).unwrap_or(false)
    }

    /// Stop the sweeper, clear every instance, and drop them all.
    pub fn dispose(&self) {
        self.stop_sweeper();
        let mut instances = self.inner.instances.lock();
        for handle in instances.iter() {
            handle.clear();
        }
        instances.clear();
        debug!("registry disposed");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Some(sweeper) = self.inner.sweeper.lock().take() {
            sweeper.cancel();
        }
    }
}

/// Body of the sweeper task. Holds only a weak handle to the registry so it
/// terminates once the registry is dropped.
async fn sweep_loop(registry: Weak<RegistryInner>, every: Duration, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("sweep loop cancelled");
                break;
            }
            _ = tokio::time::sleep(every) => {
                let Some(registry) = registry.upgrade() else { break };
                let instances: Vec<_> = registry.instances.lock().clone();
                let mut evicted = 0usize;
                for instance in &instances {
                    for key in instance.keys() {
                        if instance.get_expiry(&key).is_none() {
                            evicted += 1;
                        }
                    }
                }
                debug!(instances = instances.len(), evicted, "expiry sweep complete");
            }
        }
    }
}
