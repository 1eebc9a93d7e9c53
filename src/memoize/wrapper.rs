//! Memoization Wrapper
//!
//! Orchestrates a memoized call: derive the key, consult the cache, invoke
//! the underlying function on a miss and store its result before it settles.
//!
//! Results are stored as shared futures, so every call that arrives while a
//! computation is still pending awaits that same computation. Lookup,
//! invocation and storage for one wrapper run under a single async mutex,
//! which keeps it to one in-flight invocation per key on a multi-threaded
//! runtime. The computation itself is awaited outside the lock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{
    next_generation, CacheBackend, CacheEntry, CacheKey, CacheStats, DefaultKeyDeriver,
    FnKeyDeriver, KeyDeriver, MemoryCache,
};
use crate::config::MemoConfig;
use crate::error::{CacheError, MemoError};
use crate::memoize::registry::{self, WrapperId};
use crate::tasks::spawn_sweeper;

/// A computation as stored in the cache.
pub type SharedResult<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Backend type a `Memoized<A, T, E>` stores its entries in.
pub type SharedBackend<T, E> = Arc<dyn CacheBackend<SharedResult<T, E>>>;

/// What the underlying function produced when it was invoked.
enum Invocation<T, E> {
    /// A synchronous function already returned
    Ready(Result<T, E>),
    /// An async function returned a computation that has not settled
    Pending(BoxFuture<'static, Result<T, E>>),
}

type Invoker<A, T, E> = Box<dyn Fn(A) -> Invocation<T, E> + Send + Sync>;

// == Memoize Options ==
/// Options for building a memoized function.
pub struct MemoizeOptions<A, T, E> {
    config: MemoConfig,
    key_deriver: Arc<dyn KeyDeriver<A>>,
    cache: Option<SharedBackend<T, E>>,
}

impl<A, T, E> MemoizeOptions<A, T, E>
where
    A: Serialize + 'static,
{
    /// Default options: structural keys, in-memory cache, no expiry, failures evicted.
    pub fn new() -> Self {
        Self::from_config(MemoConfig::default())
    }

    pub fn from_config(config: MemoConfig) -> Self {
        Self {
            config,
            key_deriver: Arc::new(DefaultKeyDeriver),
            cache: None,
        }
    }
}

impl<A, T, E> Default for MemoizeOptions<A, T, E>
where
    A: Serialize + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, E> MemoizeOptions<A, T, E> {
    /// Options keyed by a custom function, for arguments with no useful
    /// serialized form.
    pub fn keyed_by<F>(cache_key: F) -> Self
    where
        F: Fn(&A) -> CacheKey + Send + Sync + 'static,
        A: 'static,
    {
        Self {
            config: MemoConfig::default(),
            key_deriver: Arc::new(FnKeyDeriver(cache_key)),
            cache: None,
        }
    }

    /// Replaces key derivation with a custom function.
    pub fn cache_key<F>(mut self, cache_key: F) -> Self
    where
        F: Fn(&A) -> CacheKey + Send + Sync + 'static,
        A: 'static,
    {
        self.key_deriver = Arc::new(FnKeyDeriver(cache_key));
        self
    }

    pub fn key_deriver(mut self, key_deriver: Arc<dyn KeyDeriver<A>>) -> Self {
        self.key_deriver = key_deriver;
        self
    }

    /// Stores entries in `cache` instead of a fresh in-memory map.
    pub fn cache<B>(mut self, cache: Arc<B>) -> Self
    where
        B: CacheBackend<SharedResult<T, E>> + 'static,
    {
        self.cache = Some(cache as SharedBackend<T, E>);
        self
    }

    /// Entry lifetime. Zero means entries never expire.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = Some(max_age);
        self
    }

    /// Keep failed results cached until they expire or are cleared.
    pub fn cache_rejection(mut self, cache_rejection: bool) -> Self {
        self.config.cache_rejection = cache_rejection;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    pub fn config(mut self, config: MemoConfig) -> Self {
        self.config = config;
        self
    }
}

// == Memoized ==
/// A memoized function.
///
/// Cloning is cheap; clones share the cache, the statistics and the
/// identity used by [`clear`](crate::clear).
pub struct Memoized<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
}

struct Inner<A, T, E> {
    id: WrapperId,
    invoke: Invoker<A, T, E>,
    key_deriver: Arc<dyn KeyDeriver<A>>,
    cache: SharedBackend<T, E>,
    config: MemoConfig,
    /// Counters, doubling as the claim lock for lookup and storage
    stats: Arc<Mutex<CacheStats>>,
    sweeper: Option<JoinHandle<()>>,
}

impl<A, T, E> Drop for Inner<A, T, E> {
    fn drop(&mut self) {
        registry::dissociate(self.id);
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
    }
}

impl<A, T, E> Clone for Memoized<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Memoizes an async function with default options.
pub fn memoize<A, T, E, F, Fut>(f: F) -> Memoized<A, T, E>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    memoize_with(f, MemoizeOptions::new())
}

/// Memoizes an async function.
pub fn memoize_with<A, T, E, F, Fut>(f: F, options: MemoizeOptions<A, T, E>) -> Memoized<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Memoized::build(
        Box::new(move |args| Invocation::Pending(f(args).boxed())),
        options,
    )
}

/// Memoizes a synchronous function.
///
/// Calls are still async. A failure is returned before anything is stored,
/// so it is never cached, whatever `cache_rejection` says.
pub fn memoize_sync<A, T, E, F>(f: F, options: MemoizeOptions<A, T, E>) -> Memoized<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
{
    Memoized::build(Box::new(move |args| Invocation::Ready(f(args))), options)
}

impl<A, T, E> Memoized<A, T, E>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn build(invoke: Invoker<A, T, E>, options: MemoizeOptions<A, T, E>) -> Self {
        let MemoizeOptions {
            config,
            key_deriver,
            cache,
        } = options;

        let cache: SharedBackend<T, E> = match cache {
            Some(cache) => cache,
            None => Arc::new(MemoryCache::new()),
        };
        let stats = Arc::new(Mutex::new(CacheStats::new()));

        let sweeper = config.effective_sweep_interval().and_then(|interval| {
            if Handle::try_current().is_ok() {
                Some(spawn_sweeper(
                    Arc::downgrade(&cache),
                    Arc::clone(&stats),
                    interval,
                ))
            } else {
                debug!("no tokio runtime, expired entries are only removed on access");
                None
            }
        });

        let id = WrapperId::next();
        registry::associate(id, &cache);

        Self {
            inner: Arc::new(Inner {
                id,
                invoke,
                key_deriver,
                cache,
                config,
                stats,
                sweeper,
            }),
        }
    }

    // == Call ==
    /// Calls the memoized function.
    ///
    /// Returns the cached result when one is present and unexpired,
    /// otherwise invokes the underlying function and caches its result.
    pub async fn call(&self, args: A) -> Result<T, MemoError<E>> {
        let computation = self.lookup_or_invoke(args).await?;
        computation.await.map_err(MemoError::Underlying)
    }

    /// Like [`call`](Self::call), but hands back the shared computation
    /// instead of awaiting it.
    pub async fn call_shared(&self, args: A) -> Result<SharedResult<T, E>, MemoError<E>> {
        self.lookup_or_invoke(args).await
    }

    async fn lookup_or_invoke(&self, args: A) -> Result<SharedResult<T, E>, MemoError<E>> {
        let inner = &self.inner;
        let key = inner.key_deriver.derive_key(&args)?;

        let mut stats = inner.stats.lock().await;

        if let Some(entry) = inner.cache.get(&key).await? {
            if !entry.is_expired() {
                stats.record_hit();
                debug!(
                    key = %key,
                    age = ?entry.age(),
                    ttl_remaining = ?entry.ttl_remaining(),
                    "memo hit"
                );
                return Ok(entry.data);
            }

            if inner.cache.delete_generation(&key, entry.generation).await? {
                stats.record_evictions(1);
            }
            debug!(key = %key, "evicted expired entry");
        }

        stats.record_miss();
        debug!(key = %key, "memo miss, invoking");

        let generation = next_generation();
        let computation = match (inner.invoke)(args) {
            Invocation::Ready(Err(err)) => return Err(MemoError::Underlying(err)),
            Invocation::Ready(Ok(value)) => future::ready(Ok(value)).boxed().shared(),
            Invocation::Pending(pending) => {
                self.observe_failure(key.clone(), generation, pending)
            }
        };

        inner
            .cache
            .set(
                key,
                CacheEntry::with_generation(
                    computation.clone(),
                    inner.config.effective_max_age(),
                    generation,
                ),
            )
            .await?;

        Ok(computation)
    }

    /// Wraps a pending computation so a failure removes its cache entry
    /// before any caller sees the failure, unless failures are cached.
    ///
    /// Only the entry of `generation` is removed; if the key was cleared or
    /// refilled in the meantime the newer entry stays.
    fn observe_failure(
        &self,
        key: CacheKey,
        generation: u64,
        pending: BoxFuture<'static, Result<T, E>>,
    ) -> SharedResult<T, E> {
        if self.inner.config.cache_rejection {
            return pending.shared();
        }

        let cache = Arc::downgrade(&self.inner.cache);
        let stats = Arc::clone(&self.inner.stats);

        async move {
            let result = pending.await;

            if result.is_err() {
                if let Some(cache) = cache.upgrade() {
                    match cache.delete_generation(&key, generation).await {
                        Ok(true) => {
                            stats.lock().await.record_evictions(1);
                            debug!(key = %key, "evicted failed computation");
                        }
                        Ok(false) => debug!(key = %key, "failed computation already replaced"),
                        Err(err) => {
                            warn!(key = %key, error = %err, "failed to evict failed computation")
                        }
                    }
                }
            }

            result
        }
        .boxed()
        .shared()
    }
}

impl<A, T, E> Memoized<A, T, E> {
    /// Identity used by the cache registry; shared by all clones.
    pub fn id(&self) -> WrapperId {
        self.inner.id
    }

    /// The backend this function's results are stored in.
    pub fn cache(&self) -> &SharedBackend<T, E> {
        &self.inner.cache
    }

    pub fn config(&self) -> &MemoConfig {
        &self.inner.config
    }

    // == Stats ==
    /// Returns current usage statistics.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = self.inner.stats.lock().await.clone();
        stats.set_total_entries(self.inner.cache.len().await?);
        Ok(stats)
    }
}

/// Discards every cached result of `memoized`.
///
/// Does nothing if the cache has no clear capability.
pub async fn clear<A, T, E>(memoized: &Memoized<A, T, E>) -> Result<(), CacheError> {
    registry::clear(memoized.id()).await
}
