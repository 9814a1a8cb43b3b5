//! Cache instance configuration and builder patterns.
//!
//! [`CacheConfig`] mirrors the options a caller can supply when creating an
//! instance. Unset fields fall back to the library defaults, or, when the
//! instance is created through a registry, to that registry's defaults.

use std::time::Duration;

use super::events::EventHooks;

/// Options for creating a cache instance.
///
/// All fields are optional; `None` means "use the default". A time-to-live
/// of [`Duration::ZERO`] means entries never expire.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Instance id. Generated (UUID v4) when unset.
    pub id: Option<String>,

    /// Default time-to-live applied by `set`. Defaults to zero (never
    /// expires).
    pub ttl: Option<Duration>,

    /// Whether values are deep-copied on their way in and out of the store.
    /// Defaults to true.
    pub clone_values: Option<bool>,

    /// Whether logically-null values are persisted instead of treated as
    /// removals. Defaults to false.
    pub store_empty_values: Option<bool>,

    /// Lifecycle event callbacks.
    pub hooks: EventHooks,
}

impl CacheConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Quick preset for a TTL-expiring cache.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use cachet::CacheConfig;
    ///
    /// let config = CacheConfig::with_ttl(Duration::from_secs(300));
    /// ```
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl), ..Self::default() }
    }
}

/// Builder for [`CacheConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instance id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = Some(id.into());
        self
    }

    /// Set the default time-to-live. Zero means entries never expire.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    /// Enable or disable value isolation (deep copies on both store
    /// boundaries).
    pub fn clone_values(mut self, enabled: bool) -> Self {
        self.config.clone_values = Some(enabled);
        self
    }

    /// Allow logically-null values to be stored.
    pub fn store_empty_values(mut self, enabled: bool) -> Self {
        self.config.store_empty_values = Some(enabled);
        self
    }

    /// Install the full hook set at once.
    pub fn hooks(mut self, hooks: EventHooks) -> Self {
        self.config.hooks = hooks;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

/// The resolved options of a live cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceOptions {
    /// Default time-to-live; zero means entries never expire.
    pub ttl: Duration,
    /// Whether values are deep-copied on both store boundaries.
    pub clone_values: bool,
    /// Whether logically-null values are persisted.
    pub store_empty_values: bool,
}

/// Options for a single read-through lookup.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use cachet::GetAndSetOptions;
///
/// let options = GetAndSetOptions::new()
///     .ttl(Duration::from_secs(30))
///     .refresh_interval(Duration::from_secs(10))
///     .refresh_failure_interval(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetAndSetOptions {
    /// Time-to-live override for the stored entry. Zero means never expires.
    pub ttl: Option<Duration>,

    /// When set (and non-zero), arms a background task that re-invokes the
    /// producer on this interval to keep the entry fresh.
    pub refresh_interval: Option<Duration>,

    /// Interval used instead of `refresh_interval` after a refresh failure,
    /// until the next successful refresh.
    pub refresh_failure_interval: Option<Duration>,
}

impl GetAndSetOptions {
    /// Create options with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live override.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the background refresh interval.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Set the interval used while the producer is failing.
    pub fn refresh_failure_interval(mut self, interval: Duration) -> Self {
        self.refresh_failure_interval = Some(interval);
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::config.
    use super::*;

    /// Validates `CacheConfig::default` behavior for the unset fields
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures every option starts unset.
    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert!(config.id.is_none());
        assert!(config.ttl.is_none());
        assert!(config.clone_values.is_none());
        assert!(config.store_empty_values.is_none());
    }

    /// Validates `CacheConfig::builder` behavior for the full builder
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms every field set through the builder lands in the config.
    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::builder()
            .id("sessions")
            .ttl(Duration::from_secs(600))
            .clone_values(false)
            .store_empty_values(true)
            .build();

        assert_eq!(config.id.as_deref(), Some("sessions"));
        assert_eq!(config.ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.clone_values, Some(false));
        assert_eq!(config.store_empty_values, Some(true));
    }

    /// Validates `CacheConfig::with_ttl` behavior for the preset scenario.
    ///
    /// Assertions:
    /// - Confirms the preset sets only the ttl.
    #[test]
    fn test_cache_config_ttl_preset() {
        let config = CacheConfig::with_ttl(Duration::from_secs(60));
        assert_eq!(config.ttl, Some(Duration::from_secs(60)));
        assert!(config.id.is_none());
        assert!(config.clone_values.is_none());
    }

    /// Validates `GetAndSetOptions::new` behavior for the fluent setters
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms each setter records its value.
    #[test]
    fn test_get_and_set_options() {
        let options = GetAndSetOptions::new()
            .ttl(Duration::from_secs(30))
            .refresh_interval(Duration::from_millis(250))
            .refresh_failure_interval(Duration::from_millis(125));

        assert_eq!(options.ttl, Some(Duration::from_secs(30)));
        assert_eq!(options.refresh_interval, Some(Duration::from_millis(250)));
        assert_eq!(options.refresh_failure_interval, Some(Duration::from_millis(125)));
    }
}
