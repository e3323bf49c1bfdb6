//! Notice LRU demo
//!
//! Fires a burst of concurrent lookups for the same few keys through a shared
//! cache and reports how many upstream fetches actually ran.
//!
//! Configuration is read from the `LRU_*` environment variables; request
//! deduplication is always switched on for the demo.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notice_lru::{get_or_fetch, spawn_sweep_task, CacheOptions, LruCache, SharedLruCache};

/// Concurrent callers per key
const CALLERS_PER_KEY: usize = 8;

/// Simulated upstream latency
const FETCH_LATENCY: Duration = Duration::from_millis(200);

const KEYS: [&str; 3] = ["/api/user?id=1", "/api/user?id=2", "/api/orders"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notice_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = CacheOptions::from_env().with_use_notice(true);
    info!(
        "Configuration loaded: max_cache={}, cache_time={}s, storage={}, black_list={:?}",
        options.max_cache, options.cache_time, options.storage, options.black_list
    );

    let cache: SharedLruCache<String> = LruCache::new(options.clone()).into_shared();
    let sweep_interval = Duration::from_secs(options.cache_time.max(1));
    let sweep_handle = spawn_sweep_task(cache.clone(), sweep_interval);
    let fetches = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for key in KEYS {
        for caller in 0..CALLERS_PER_KEY {
            let cache = cache.clone();
            let fetches = fetches.clone();
            handles.push(tokio::spawn(async move {
                let value = get_or_fetch(&cache, key, || fetch_upstream(key, fetches)).await?;
                info!(key, caller, %value, "lookup finished");
                Ok::<_, anyhow::Error>(())
            }));
        }
    }

    for handle in handles {
        handle.await.context("lookup task panicked")??;
    }

    let total = KEYS.len() * CALLERS_PER_KEY;
    info!(
        "{} lookups served by {} upstream fetches",
        total,
        fetches.load(Ordering::SeqCst)
    );

    sweep_handle.abort();
    Ok(())
}

/// Stands in for a network request.
async fn fetch_upstream(key: &str, fetches: Arc<AtomicUsize>) -> Result<String, std::io::Error> {
    let n = fetches.fetch_add(1, Ordering::SeqCst) + 1;
    info!(key, fetch = n, "fetching from upstream");
    tokio::time::sleep(FETCH_LATENCY).await;
    Ok(format!("response for {key}"))
}
