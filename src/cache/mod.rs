//! Cache Module
//!
//! Key derivation, entry storage and TTL expiration for memoized functions.

mod backend;
mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use backend::CacheBackend;
pub use entry::{next_generation, CacheEntry};
pub use key::{
    argument_list, key_for_arguments, CacheKey, DefaultKeyDeriver, FnKeyDeriver, KeyDeriver,
    DEFAULT_KEY,
};
pub use stats::CacheStats;
pub use store::MemoryCache;
