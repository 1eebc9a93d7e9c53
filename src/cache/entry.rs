//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Allocates a process-unique entry generation.
pub fn next_generation() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

// == Cache Entry ==
/// A stored result together with its lifetime metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored result (for memoized calls, a shared in-flight computation)
    pub data: V,
    /// When the entry was created
    pub created_at: Instant,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Distinguishes this entry from any later entry stored under the same key
    pub generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional max age.
    ///
    /// A zero max age is treated as no expiry.
    pub fn new(data: V, max_age: Option<Duration>) -> Self {
        Self::with_generation(data, max_age, next_generation())
    }

    /// Creates an entry with a generation allocated up front.
    pub fn with_generation(data: V, max_age: Option<Duration>, generation: u64) -> Self {
        let now = Instant::now();
        let expires_at = max_age.filter(|age| !age.is_zero()).map(|age| now + age);

        Self {
            data,
            created_at: now,
            expires_at,
            generation,
        }
    }

    /// Time since the entry was stored.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a max age and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("test_value", None);

        assert_eq!(entry.data, "test_value");
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[tokio::test]
    async fn test_zero_max_age_never_expires() {
        let entry = CacheEntry::new(1, Some(Duration::ZERO));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value", Some(Duration::from_millis(100)));

        assert!(!entry.is_expired());
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(Duration::from_millis(50)));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_generations_are_unique() {
        let first = CacheEntry::new(1, None);
        let second = CacheEntry::new(1, None);
        assert_ne!(first.generation, second.generation);

        let fixed = CacheEntry::with_generation(1, None, 42);
        assert_eq!(fixed.generation, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_age() {
        let entry = CacheEntry::new((), None);
        tokio::time::advance(Duration::from_millis(30)).await;
        assert_eq!(entry.age(), Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry {
            data: "test",
            created_at: now,
            expires_at: Some(now),
            generation: next_generation(),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
    }
}
