//! Canonical cache keys.

use std::fmt;

/// The normalized form of a cache key used for storage lookup.
///
/// Normalization replaces every character outside `[A-Za-z0-9_]` with `_`.
/// Distinct raw keys can collide to the same canonical key (`"a.b"` and
/// `"a_b"`); that is accepted behavior, and callers are responsible for
/// avoiding ambiguous keys. Internal paths pass `CacheKey` around so a key is
/// normalized exactly once per operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Normalize a raw key into its canonical form.
    ///
    /// Normalization is total: empty and non-alphanumeric input produces a
    /// valid (possibly colliding) key rather than an error.
    pub fn normalize(raw: &str) -> Self {
        let canonical = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        Self(canonical)
    }

    /// The canonical key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::key.
    use super::*;

    /// Validates `CacheKey::normalize` behavior for the replacement scenario.
    ///
    /// Assertions:
    /// - Confirms alphanumerics and underscores pass through untouched.
    /// - Confirms every other character becomes `_`.
    #[test]
    fn test_normalize_replaces_disallowed_characters() {
        assert_eq!(CacheKey::normalize("plain_Key09").as_str(), "plain_Key09");
        assert_eq!(CacheKey::normalize("user:42/profile").as_str(), "user_42_profile");
        assert_eq!(CacheKey::normalize("a.b c-d").as_str(), "a_b_c_d");
        assert_eq!(CacheKey::normalize("héllo").as_str(), "h_llo");
    }

    /// Validates `CacheKey::normalize` behavior for the collision scenario.
    ///
    /// Assertions:
    /// - Confirms `"a.b"` and `"a_b"` normalize to the same canonical key.
    #[test]
    fn test_distinct_raw_keys_may_collide() {
        assert_eq!(CacheKey::normalize("a.b"), CacheKey::normalize("a_b"));
    }

    /// Validates `CacheKey::normalize` behavior for the total function
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the empty string is a valid key.
    /// - Confirms fully non-alphanumeric input is a valid key.
    #[test]
    fn test_normalization_is_total() {
        assert_eq!(CacheKey::normalize("").as_str(), "");
        assert_eq!(CacheKey::normalize("!!!").as_str(), "___");
    }

    /// Validates `CacheKey::normalize` behavior for the idempotence scenario.
    ///
    /// Assertions:
    /// - Confirms normalizing a canonical key is a no-op.
    #[test]
    fn test_normalization_is_idempotent() {
        let once = CacheKey::normalize("x.y.z");
        let twice = CacheKey::normalize(once.as_str());
        assert_eq!(once, twice);
    }
}
