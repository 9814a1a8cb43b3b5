//! Error types for cache operations.
//!
//! Absence of a key is never an error; lookups return `Option`. The only
//! fallible surface is read-through population, where a caller-supplied
//! producer can fail.

use thiserror::Error;

/// Boxed error type accepted from value producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The producer passed to a read-through lookup failed during initial
    /// population. Failures during background refresh are logged and never
    /// surface here.
    #[error("value producer failed: {0}")]
    Producer(#[source] BoxError),
}

/// Convenience alias for results of cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    //! Unit tests for error.
    use super::*;

    /// Validates `CacheError::Producer` behavior for the display and source
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the display output names the producer failure.
    /// - Ensures `std::error::Error::source` exposes the boxed cause.
    #[test]
    fn test_producer_error_display_and_source() {
        let cause: BoxError = "connection reset".into();
        let error = CacheError::Producer(cause);

        assert_eq!(error.to_string(), "value producer failed: connection reset");
        assert!(std::error::Error::source(&error).is_some());
    }
}
