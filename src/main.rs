//! Memo Cache demo
//!
//! Memoizes a slow lookup and shows hits, expiry and invalidation.
//! Settings come from `MEMO_MAX_AGE_MS`, `MEMO_CACHE_REJECTION` and
//! `MEMO_SWEEP_INTERVAL_MS`; logging is controlled with `RUST_LOG`.

use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::{clear, memoize_with, MemoConfig, MemoizeOptions};

/// Simulated lookup latency.
const LOOKUP_DELAY: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MemoConfig::from_env();
    info!(
        "Configuration loaded: max_age={:?}, cache_rejection={}, sweep_interval={:?}",
        config.max_age, config.cache_rejection, config.sweep_interval
    );

    let lookup = memoize_with(
        |(user,): (String,)| async move {
            tokio::time::sleep(LOOKUP_DELAY).await;
            if user.is_empty() {
                return Err("empty user name".to_string());
            }
            Ok(format!("profile:{user}"))
        },
        MemoizeOptions::from_config(config.clone()),
    );

    for user in ["ada", "ada", "grace", "ada"] {
        let started = Instant::now();
        let profile = lookup
            .call((user.to_string(),))
            .await
            .with_context(|| format!("lookup for {user} failed"))?;
        info!("{} -> {} in {:?}", user, profile, started.elapsed());
    }

    if let Some(max_age) = config.effective_max_age() {
        info!("Waiting {:?} for entries to expire", max_age);
        tokio::time::sleep(max_age + Duration::from_millis(10)).await;

        let started = Instant::now();
        lookup.call(("ada".to_string(),)).await?;
        info!("ada after expiry in {:?}", started.elapsed());
    }

    clear(&lookup).await?;
    let started = Instant::now();
    lookup.call(("grace".to_string(),)).await?;
    info!("grace after clear in {:?}", started.elapsed());

    let stats = lookup.stats().await?;
    info!("Stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}
