//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Failures raised by the caching machinery itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Arguments could not be turned into a cache key
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The cache backend failed to serve an operation
    #[error("Cache backend failure: {0}")]
    Backend(String),
}

// == Memo Error Enum ==
/// Error returned by a memoized call.
///
/// `Underlying` carries the wrapped function's own failure unchanged;
/// `Cache` means the call could not be served because key derivation or
/// the backend failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoError<E> {
    #[error("{0}")]
    Underlying(E),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl<E> MemoError<E> {
    /// Returns the wrapped function's failure, if that is what this is.
    pub fn underlying(&self) -> Option<&E> {
        match self {
            MemoError::Underlying(err) => Some(err),
            MemoError::Cache(_) => None,
        }
    }

    /// Consumes the error, returning the wrapped function's failure if any.
    pub fn into_underlying(self) -> Option<E> {
        match self {
            MemoError::Underlying(err) => Some(err),
            MemoError::Cache(_) => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underlying_is_displayed_unchanged() {
        let err: MemoError<String> = MemoError::Underlying("foo bar".to_string());
        assert_eq!(err.to_string(), "foo bar");
        assert_eq!(err.underlying().map(String::as_str), Some("foo bar"));
    }

    #[test]
    fn test_cache_error_converts() {
        let err: MemoError<String> = CacheError::Backend("down".to_string()).into();
        assert_eq!(err.to_string(), "Cache backend failure: down");
        assert!(err.into_underlying().is_none());
    }
}
