//! Cache instances: keyed storage with TTL expiry, value isolation,
//! lifecycle events, and background refresh.
//!
//! A [`Cache`] owns one key/value store. Lookups evict expired entries
//! lazily, every lookup counts as a hit or a miss, and optional callbacks
//! fire on hit, miss, added, removed, and count-changed. The async
//! [`Cache::get_and_set`] operation populates missing entries from a
//! producer and can arm a per-key background refresh with failure backoff.
//!
//! # Examples
//!
//! ```
//! use cachet::{Cache, CacheConfig, EventHooks};
//! use std::time::Duration;
//!
//! let config = CacheConfig::builder()
//!     .id("products")
//!     .ttl(Duration::from_secs(300))
//!     .hooks(EventHooks::new().on_miss(|event| {
//!         println!("miss on {} in {}", event.key, event.id);
//!     }))
//!     .build();
//!
//! let cache: Cache<u64> = Cache::new(config);
//! assert_eq!(cache.get("sku/123"), None); // prints "miss on sku_123 in products"
//! ```

mod config;
mod core;
mod events;
mod key;
mod refresh;
mod stats;

pub use self::config::{CacheConfig, CacheConfigBuilder, GetAndSetOptions, InstanceOptions};
pub use self::core::Cache;
pub use self::events::{CountEventCallback, CountEventData, EventCallback, EventData, EventHooks};
pub use self::key::CacheKey;
pub use self::stats::CacheStats;
