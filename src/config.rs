//! Configuration Module
//!
//! Handles loading memoization settings from environment variables.

use std::env;
use std::time::Duration;

/// Memoization settings shared by every wrapper built from them.
///
/// All values can be configured via environment variables with permissive
/// defaults: anything that fails to parse is treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoConfig {
    /// How long an entry stays valid; `None` means entries never expire
    pub max_age: Option<Duration>,
    /// Keep failed results cached instead of evicting them
    pub cache_rejection: bool,
    /// Background sweep frequency; defaults to `max_age` when unset
    pub sweep_interval: Option<Duration>,
}

impl MemoConfig {
    /// Creates a new MemoConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_MAX_AGE_MS` - Entry lifetime in milliseconds (default: no expiry)
    /// - `MEMO_CACHE_REJECTION` - `true`/`1` to cache failures (default: false)
    /// - `MEMO_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: max age)
    pub fn from_env() -> Self {
        Self {
            max_age: env::var("MEMO_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .and_then(positive_millis),
            cache_rejection: env::var("MEMO_CACHE_REJECTION")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            sweep_interval: env::var("MEMO_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .and_then(positive_millis),
        }
    }

    /// Returns the max age only when it is strictly positive.
    pub fn effective_max_age(&self) -> Option<Duration> {
        self.max_age.filter(|age| !age.is_zero())
    }

    /// Interval the background sweeper should run at, if one is needed at all.
    pub fn effective_sweep_interval(&self) -> Option<Duration> {
        let max_age = self.effective_max_age()?;
        Some(
            self.sweep_interval
                .filter(|interval| !interval.is_zero())
                .unwrap_or(max_age),
        )
    }
}

fn positive_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MemoConfig::default();
        assert_eq!(config.max_age, None);
        assert!(!config.cache_rejection);
        assert_eq!(config.sweep_interval, None);
        assert_eq!(config.effective_sweep_interval(), None);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env to avoid races between tests
        env::set_var("MEMO_MAX_AGE_MS", "250");
        env::set_var("MEMO_CACHE_REJECTION", "TRUE");
        env::remove_var("MEMO_SWEEP_INTERVAL_MS");

        let config = MemoConfig::from_env();
        assert_eq!(config.max_age, Some(Duration::from_millis(250)));
        assert!(config.cache_rejection);
        assert_eq!(
            config.effective_sweep_interval(),
            Some(Duration::from_millis(250))
        );

        env::set_var("MEMO_MAX_AGE_MS", "soon");
        env::set_var("MEMO_CACHE_REJECTION", "nope");
        env::set_var("MEMO_SWEEP_INTERVAL_MS", "10");

        let config = MemoConfig::from_env();
        assert_eq!(config.max_age, None);
        assert!(!config.cache_rejection);
        assert_eq!(config.effective_sweep_interval(), None);

        env::remove_var("MEMO_MAX_AGE_MS");
        env::remove_var("MEMO_CACHE_REJECTION");
        env::remove_var("MEMO_SWEEP_INTERVAL_MS");
    }

    #[test]
    fn test_zero_max_age_means_no_expiry() {
        let config = MemoConfig {
            max_age: Some(Duration::ZERO),
            ..MemoConfig::default()
        };
        assert_eq!(config.effective_max_age(), None);
        assert_eq!(config.effective_sweep_interval(), None);
    }

    #[test]
    fn test_explicit_sweep_interval() {
        let config = MemoConfig {
            max_age: Some(Duration::from_secs(10)),
            sweep_interval: Some(Duration::from_secs(1)),
            ..MemoConfig::default()
        };
        assert_eq!(config.effective_sweep_interval(), Some(Duration::from_secs(1)));
    }
}
