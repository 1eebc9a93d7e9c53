//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a memoized
//! function is alive.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at a configured interval

mod sweeper;

pub use sweeper::spawn_sweeper;
