//! Shared Cache Module
//!
//! One cache instance shared by many tasks, plus the producer protocol that
//! sits between a cache miss and the caller's own fetch.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{Lookup, LruCache};
use crate::error::CacheError;

/// A cache shared between tasks.
///
/// Construct one and hand clones to whoever needs it; there is no implicit
/// global instance.
pub type SharedLruCache<T> = Arc<Mutex<LruCache<T>>>;

impl<T> LruCache<T> {
    /// Wraps the cache for sharing between tasks.
    pub fn into_shared(self) -> SharedLruCache<T> {
        Arc::new(Mutex::new(self))
    }
}

// == Fetch Error ==
/// Failure of [`get_or_fetch`].
#[derive(Error, Debug)]
pub enum FetchError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// This caller waited on another producer, which declined
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// This caller was the producer and its own fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(E),
}

/// Returns the cached value for `key`, fetching it with `fetch` on a miss.
///
/// The lock is never held across `fetch` or while waiting on another
/// producer. When this call is the producer and `fetch` fails, queued waiters
/// are declined with the error's message before the error is returned.
///
/// If the returned future is dropped while fetching, the key stays pending
/// and its waiters are never settled.
pub async fn get_or_fetch<T, F, Fut, E>(
    cache: &SharedLruCache<T>,
    key: &str,
    fetch: F,
) -> Result<T, FetchError<E>>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug + fmt::Display,
{
    let lookup = cache.lock().await.get(key);

    match lookup {
        Lookup::Hit(value) => Ok(value),
        Lookup::Wait(waiter) => {
            debug!(key, "waiting on in-flight fetch");
            Ok(waiter.await?)
        }
        Lookup::Miss => match fetch().await {
            Ok(value) => {
                cache.lock().await.set(key, value.clone());
                Ok(value)
            }
            Err(e) => {
                cache
                    .lock()
                    .await
                    .decline_notification_with(key, e.to_string());
                Err(FetchError::Fetch(e))
            }
        },
    }
}
