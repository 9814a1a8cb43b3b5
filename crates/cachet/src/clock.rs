//! Time abstraction for testability.
//!
//! Expiry arithmetic goes through the [`Clock`] trait so caches can use real
//! system time in production and controlled mock time in tests, enabling
//! deterministic testing of TTL behavior without actual delays.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Trait for time operations to enable deterministic testing.
pub trait Clock: Send + Sync + 'static {
    /// Get the current instant (monotonic time).
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing.
///
/// Allows tests to control time progression without actual delays. Cloned
/// handles share the same elapsed time.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant.
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Advance the mock clock by milliseconds (convenience method).
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Get the current elapsed time.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for clock.
    use super::*;

    /// Validates `MockClock::new` behavior for the advance scenario.
    ///
    /// Assertions:
    /// - Confirms `clock.now()` equals `start` before advancing.
    /// - Confirms `clock.now()` moves forward by exactly the advanced amount.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), start + Duration::from_secs(5));

        clock.advance_millis(500);
        assert_eq!(clock.now(), start + Duration::from_millis(5500));
        assert_eq!(clock.elapsed(), Duration::from_millis(5500));
    }

    /// Validates `MockClock::clone` behavior for the shared elapsed scenario.
    ///
    /// Assertions:
    /// - Ensures advancing one handle is visible through the clone.
    #[test]
    fn test_mock_clock_clones_share_time() {
        let clock = MockClock::new();
        let other = clock.clone();

        clock.advance(Duration::from_secs(1));
        assert_eq!(other.elapsed(), Duration::from_secs(1));
    }

    /// Validates `SystemClock::now` behavior for the monotonic scenario.
    ///
    /// Assertions:
    /// - Ensures consecutive readings never move backwards.
    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
