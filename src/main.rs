//! Timed Sized Cache - demo runner
//!
//! Memoizes an expensive computation and shows hits, misses and expiry at work.

use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timed_sized_cache::{key_args, CacheConfig, Memoized};

/// Simulated cost of one uncached computation.
const COMPUTE_DELAY: Duration = Duration::from_millis(200);

fn even_squares(col: &[u64]) -> Vec<u64> {
    std::thread::sleep(COMPUTE_DELAY);
    col.iter().filter(|x| *x % 2 == 0).map(|x| x * x).collect()
}

async fn even_squares_async(col: &[u64]) -> Vec<u64> {
    tokio::time::sleep(COMPUTE_DELAY).await;
    col.iter().filter(|x| *x % 2 == 0).map(|x| x * x).collect()
}

/// Entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Run a memoized operation synchronously, then asynchronously
/// 4. Print cache statistics as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timed_sized_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: ttl={}s, capacity={} bytes",
        config.ttl.as_secs(),
        config.capacity_bytes
    );

    let col: Vec<u64> = (0..100_000).collect();

    let sync_op = Memoized::new("even_squares", config);
    for run in 1..=5 {
        let started = Instant::now();
        let result = sync_op.call(&key_args![col], || even_squares(&col))?;
        info!(
            "sync run {}: {} items in {:?}",
            run,
            result.len(),
            started.elapsed()
        );
    }

    let async_op = Memoized::new("even_squares_async", config);
    for run in 1..=5 {
        let started = Instant::now();
        let result = async_op
            .call_async(&key_args![col], || even_squares_async(&col))
            .await?;
        info!(
            "async run {}: {} items in {:?}",
            run,
            result.len(),
            started.elapsed()
        );
    }

    println!("{}", serde_json::to_string_pretty(&sync_op.stats())?);
    println!("{}", serde_json::to_string_pretty(&async_op.stats())?);

    Ok(())
}
