//! Memoize Module
//!
//! The memoizing wrapper and the registry used to invalidate it.

pub mod registry;
mod wrapper;

pub use registry::WrapperId;
pub use wrapper::{
    clear, memoize, memoize_sync, memoize_with, MemoizeOptions, Memoized, SharedBackend,
    SharedResult,
};
