//! Cache Backend Module
//!
//! The mapping contract a memoized function stores its entries in. Every
//! operation is async so remote stores fit behind the same trait; the
//! in-memory [`MemoryCache`](crate::cache::MemoryCache) resolves immediately.

use async_trait::async_trait;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheKey};
use crate::error::Result;

#[async_trait]
pub trait CacheBackend<V>: Send + Sync {
    /// Whether an entry exists for `key`, expired or not.
    async fn has(&self, key: &CacheKey) -> Result<bool>;

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry<V>>>;

    /// Inserts or replaces the entry for `key`.
    async fn set(&self, key: CacheKey, entry: CacheEntry<V>) -> Result<()>;

    /// Removes the entry for `key`, returning whether one was present.
    async fn delete(&self, key: &CacheKey) -> Result<bool>;

    /// Removes the entry for `key` only if it is still `generation`.
    ///
    /// The default reads then deletes; backends that can should override it
    /// with an atomic compare-and-delete.
    async fn delete_generation(&self, key: &CacheKey, generation: u64) -> Result<bool> {
        let current = self.get(key).await?.map(|entry| entry.generation);
        if current == Some(generation) {
            self.delete(key).await
        } else {
            Ok(false)
        }
    }

    /// Removes every entry expired at `now` and returns the removed keys.
    ///
    /// Each removal must re-check expiry atomically so an entry replaced
    /// since the scan started is never dropped.
    async fn remove_expired(&self, now: Instant) -> Result<Vec<CacheKey>>;

    async fn len(&self) -> Result<usize>;

    /// Whether [`clear`](CacheBackend::clear) does anything for this backend.
    fn supports_clear(&self) -> bool {
        false
    }

    /// Discards every entry. Backends without the capability leave this as a no-op.
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}
