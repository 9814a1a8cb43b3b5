//! Keyed in-memory cache instances with TTL expiry, lifecycle events, and
//! background refresh.
//!
//! Each [`Cache`] is an independent key/value store. Keys are normalized to a
//! canonical `[A-Za-z0-9_]` form, entries expire lazily after a per-entry
//! time-to-live, and values can optionally be deep-copied on both sides of
//! the store boundary so callers never alias cached state. The async
//! [`Cache::get_and_set`] operation populates missing entries from a producer
//! and can keep them fresh with a per-key background refresh task that backs
//! off to a separate interval after producer failures.
//!
//! The [`Registry`] owns a set of live instances plus process-wide default
//! options, and can run a global sweeper that periodically forces expiry
//! eviction across every registered instance.
//!
//! # Examples
//!
//! ```
//! use cachet::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! let cache: Cache<String> = Cache::new(
//!     CacheConfig::builder().id("sessions").ttl(Duration::from_secs(60)).build(),
//! );
//!
//! cache.set("user:42", "alice".to_string());
//! assert_eq!(cache.get("user:42"), Some("alice".to_string()));
//! assert_eq!(cache.stats().hits, 1);
//! ```
//!
//! Read-through population with background refresh:
//!
//! ```no_run
//! use cachet::{Cache, CacheConfig, GetAndSetOptions};
//! use std::time::Duration;
//!
//! # async fn demo() -> cachet::CacheResult<()> {
//! let cache: Cache<String> = Cache::new(CacheConfig::default());
//!
//! let value = cache
//!     .get_and_set_with(
//!         "motd",
//!         || async { Ok("hello".to_string()) },
//!         GetAndSetOptions::new().refresh_interval(Duration::from_secs(30)),
//!     )
//!     .await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod cache;
pub mod clock;
pub mod error;
pub mod registry;
pub mod value;

// Re-export commonly used types for convenience
// ------------------------------
pub use cache::{
    Cache, CacheConfig, CacheConfigBuilder, CacheKey, CacheStats, CountEventData, EventData,
    EventHooks, GetAndSetOptions, InstanceOptions,
};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{BoxError, CacheError, CacheResult};
pub use registry::{CacheHandle, InstanceStats, Registry, RegistryConfig, RegistryConfigBuilder};
pub use value::CacheValue;
