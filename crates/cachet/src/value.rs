//! Capabilities required of cached values.
//!
//! Stored values implement [`CacheValue`], which layers two capabilities on
//! top of `Clone`:
//!
//! - **Logical-null detection** ([`CacheValue::is_logically_null`]): a value
//!   can report that it represents "nothing": `Option::None`,
//!   `serde_json::Value::Null`, or any domain-specific empty state. Unless an
//!   instance is configured to store empty values, setting a logically-null
//!   value is equivalent to removing the key.
//! - **Deep copying** ([`CacheValue::deep_copy`]): when an instance has value
//!   isolation enabled, every value crossing the store boundary goes through
//!   `deep_copy` instead of `Clone`, so shared-ownership values (`Arc` and
//!   friends) are re-allocated rather than aliased.
//!
//! Both methods have defaults (`false` and `Clone`) that are correct for
//! plain owned data, so most types opt in with an empty impl. Types with
//! interior mutability should override `deep_copy` to snapshot their state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Capability trait for values stored in a cache.
pub trait CacheValue: Clone + Send + Sync + 'static {
    /// Returns true when this value represents "nothing" and should be
    /// treated as a removal rather than stored (subject to instance
    /// configuration).
    fn is_logically_null(&self) -> bool {
        false
    }

    /// Produce a copy that shares no state with `self`.
    ///
    /// The default forwards to `Clone`, which is already a deep copy for
    /// plain owned data. Override for shared-ownership or interior-mutability
    /// types.
    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

macro_rules! impl_cache_value {
    ($($ty:ty),* $(,)?) => {
        $(impl CacheValue for $ty {})*
    };
}

impl_cache_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str,
);

impl<T: CacheValue> CacheValue for Option<T> {
    fn is_logically_null(&self) -> bool {
        self.is_none()
    }

    fn deep_copy(&self) -> Self {
        self.as_ref().map(CacheValue::deep_copy)
    }
}

impl<T: CacheValue> CacheValue for Vec<T> {
    fn deep_copy(&self) -> Self {
        self.iter().map(CacheValue::deep_copy).collect()
    }
}

impl<K, T> CacheValue for HashMap<K, T>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    T: CacheValue,
{
    fn deep_copy(&self) -> Self {
        self.iter().map(|(key, value)| (key.clone(), value.deep_copy())).collect()
    }
}

/// `Clone` on `Arc` shares the allocation; a deep copy re-allocates so the
/// cached value cannot be reached through the caller's handle.
impl<T: CacheValue> CacheValue for Arc<T> {
    fn is_logically_null(&self) -> bool {
        (**self).is_logically_null()
    }

    fn deep_copy(&self) -> Self {
        Arc::new((**self).deep_copy())
    }
}

impl CacheValue for serde_json::Value {
    fn is_logically_null(&self) -> bool {
        self.is_null()
    }
}
