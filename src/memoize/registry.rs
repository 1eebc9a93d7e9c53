//! Cache Registry
//!
//! Process-wide side table from a memoized function's identity to the cache
//! backing it, so callers can invalidate a wrapper without holding its cache.
//!
//! Entries hold the cache weakly: the registry never keeps a cache alive.
//! A wrapper removes its own entry when its last clone is dropped, and
//! entries whose cache has already gone are pruned on every association.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::cache::CacheBackend;
use crate::error::Result;

/// Identity shared by a memoized function and all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WrapperId(u64);

impl WrapperId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        WrapperId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Type-erased handle on a registered cache.
trait Clearable: Send + Sync {
    fn is_alive(&self) -> bool;

    /// Returns the clear operation, or None if the cache is gone or has no
    /// clear capability.
    fn clear(&self) -> Option<BoxFuture<'static, Result<()>>>;
}

struct WeakBackend<V>(Weak<dyn CacheBackend<V>>);

impl<V: 'static> Clearable for WeakBackend<V> {
    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    fn clear(&self) -> Option<BoxFuture<'static, Result<()>>> {
        let cache = self.0.upgrade()?;
        if !cache.supports_clear() {
            return None;
        }
        Some(async move { cache.clear().await }.boxed())
    }
}

type Registry = HashMap<WrapperId, Box<dyn Clearable>>;

fn registry() -> MutexGuard<'static, Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Associates a wrapper identity with its cache.
pub(crate) fn associate<V: 'static>(id: WrapperId, cache: &Arc<dyn CacheBackend<V>>) {
    let mut map = registry();
    map.retain(|_, entry| entry.is_alive());
    map.insert(id, Box::new(WeakBackend(Arc::downgrade(cache))));
}

/// Drops the association for `id`, if any.
pub(crate) fn dissociate(id: WrapperId) {
    registry().remove(&id);
}

/// Whether `id` currently has a cache associated with it.
pub fn is_registered(id: WrapperId) -> bool {
    registry().get(&id).is_some_and(|entry| entry.is_alive())
}

/// Clears the cache associated with `id`.
///
/// Silently does nothing if there is no association or the cache cannot be
/// cleared. Backend failures are returned.
pub async fn clear(id: WrapperId) -> Result<()> {
    let pending = registry().get(&id).and_then(|entry| entry.clear());

    match pending {
        Some(clear) => {
            clear.await?;
            debug!(wrapper = ?id, "cleared memoized cache");
        }
        None => debug!(wrapper = ?id, "nothing to clear"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey, MemoryCache};

    #[tokio::test]
    async fn test_clear_registered_cache() {
        let cache: Arc<dyn CacheBackend<u8>> = Arc::new(MemoryCache::new());
        cache
            .set(CacheKey::Sentinel, CacheEntry::new(1, None))
            .await
            .unwrap();

        let id = WrapperId::next();
        associate(id, &cache);
        assert!(is_registered(id));

        clear(id).await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 0);

        dissociate(id);
        assert!(!is_registered(id));
    }

    #[tokio::test]
    async fn test_clear_unknown_is_noop() {
        clear(WrapperId::next()).await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_does_not_keep_cache_alive() {
        let cache: Arc<dyn CacheBackend<u8>> = Arc::new(MemoryCache::new());
        let id = WrapperId::next();
        associate(id, &cache);

        drop(cache);

        assert!(!is_registered(id));
        clear(id).await.unwrap();
        dissociate(id);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(WrapperId::next(), WrapperId::next());
    }
}
