//! Memo Cache - transparent memoization for sync and async functions
//!
//! Repeated calls with equivalent arguments are served from a cache instead
//! of re-invoking the wrapped function. Entries can expire after a max age,
//! failed computations are evicted unless configured otherwise, and a
//! wrapper's cache can be invalidated with [`clear`].
//!
//! ```no_run
//! use memo_cache::{clear, memoize};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let lookup = memoize(|(id,): (u32,)| async move { Ok::<_, String>(id * 2) });
//!
//! assert_eq!(lookup.call((21,)).await?, 42);
//! assert_eq!(lookup.call((21,)).await?, 42); // served from the cache
//!
//! clear(&lookup).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod memoize;
pub mod tasks;

pub use cache::{CacheBackend, CacheEntry, CacheKey, CacheStats, KeyDeriver, MemoryCache};
pub use config::MemoConfig;
pub use error::{CacheError, MemoError};
pub use memoize::{
    clear, memoize, memoize_sync, memoize_with, MemoizeOptions, Memoized, SharedBackend,
    SharedResult, WrapperId,
};
