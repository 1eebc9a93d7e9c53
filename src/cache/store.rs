//! Cache Store Module
//!
//! Default in-memory backend: a HashMap behind an async RwLock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::{CacheBackend, CacheEntry, CacheKey};
use crate::error::Result;

// == Memory Cache ==
/// In-process cache backend. Never fails.
#[derive(Debug)]
pub struct MemoryCache<V> {
    /// Key-entry storage
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V> MemoryCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> CacheBackend<V> for MemoryCache<V>
where
    V: Clone + Send + Sync,
{
    async fn has(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry<V>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: CacheKey, entry: CacheEntry<V>) -> Result<()> {
        self.entries.write().await.insert(key, entry);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn delete_generation(&self, key: &CacheKey, generation: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.generation == generation => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // == Remove Expired ==
    /// Scan and removal happen under one write lock, so a concurrently
    /// refreshed entry can't be caught half way.
    async fn remove_expired(&self, now: Instant) -> Result<Vec<CacheKey>> {
        let mut entries = self.entries.write().await;

        let expired_keys: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            entries.remove(key);
        }

        Ok(expired_keys)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    fn supports_clear(&self) -> bool {
        true
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
