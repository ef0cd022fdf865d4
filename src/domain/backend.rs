//! Cache backend contract

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::domain::error::CacheError;
use crate::domain::value::CacheValue;

/// Internal marker for "store without expiry", distinct from any valid TTL.
///
/// A caller-supplied timeout of `0` normalizes to this sentinel. It is never
/// sent over the wire as a TTL argument.
pub const NO_EXPIRY: i64 = -1;

/// Uniform cache contract over an external key-addressable store.
///
/// Implementations hold no mutable state beyond configuration and a shared
/// store handle, so one instance can be shared across concurrent callers as
/// long as the underlying client tolerates that. Timeouts are in seconds:
/// `None` substitutes the backend's default, `0` means never expire.
///
/// Store-level failures propagate unchanged; this layer adds no retries.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Looks up a key. Absent keys and corrupt payloads both read as `None`.
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Looks up several keys in one round-trip. The result has exactly one
    /// slot per requested key, in request order.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<CacheValue>>, CacheError>;

    /// Stores a value, returning the store's acknowledgement.
    async fn set(
        &self,
        key: &str,
        value: &CacheValue,
        timeout: Option<i64>,
    ) -> Result<bool, CacheError>;

    /// Stores several entries as one pipelined, non-transactional batch.
    /// Returns one acknowledgement per entry in submission order; a partial
    /// failure leaves the store in a mixed state with no rollback.
    async fn set_many(
        &self,
        entries: &[(&str, CacheValue)],
        timeout: Option<i64>,
    ) -> Result<Vec<bool>, CacheError>;

    /// Stores a value only if the key does not already exist. Returns false
    /// without touching the existing entry or its TTL when the key is
    /// present.
    async fn add(
        &self,
        key: &str,
        value: &CacheValue,
        timeout: Option<i64>,
    ) -> Result<bool, CacheError>;

    /// Deletes a key, returning the number of keys removed (0 or 1).
    async fn delete(&self, key: &str) -> Result<u64, CacheError>;

    /// Deletes several keys in one round-trip, returning the total removed.
    /// Empty input is a no-op and returns `None`, distinct from `Some(0)`
    /// for keys that were attempted but not present.
    async fn delete_many(&self, keys: &[&str]) -> Result<Option<u64>, CacheError>;

    /// Checks key existence without decoding the value.
    async fn has(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every entry in this backend's namespace, returning the count.
    async fn clear(&self) -> Result<u64, CacheError>;

    /// Atomically adds `delta` to the integer stored at `key`, returning the
    /// new value. Bypasses the codec: the store mutates the plain-integer
    /// payload in place, and its type-mismatch error surfaces unchanged.
    async fn increment(&self, key: &str, delta: i64) -> Result<i64, CacheError>;

    /// Atomically subtracts `delta` from the integer stored at `key`.
    async fn decrement(&self, key: &str, delta: i64) -> Result<i64, CacheError>;
}

/// Extension trait providing serde-typed get/set on any backend.
pub trait CacheBackendExt: CacheBackend {
    /// Gets a value and deserializes it. Legacy raw payloads have no typed
    /// representation and read as `None`.
    fn get_as<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, CacheError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get(key).await?.and_then(CacheValue::into_json) {
                Some(json) => {
                    let value: V = serde_json::from_value(json).map_err(|e| {
                        CacheError::serialization(format!(
                            "Failed to deserialize cache value: {}",
                            e
                        ))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Serializes a value and stores it under the tagged JSON encoding.
    fn set_as<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        timeout: Option<i64>,
    ) -> impl std::future::Future<Output = Result<bool, CacheError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let value = CacheValue::json(value)?;
            self.set(key, &value, timeout).await
        }
    }
}

// Blanket implementation for all backends
impl<T: CacheBackend + ?Sized> CacheBackendExt for T {}
