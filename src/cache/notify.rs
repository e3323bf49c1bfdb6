//! Deduplication Broker Module
//!
//! Tracks keys whose value is presumed in flight and fans the eventual result
//! out to every caller that queued behind the producer.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::debug;

use crate::cache::CacheKey;
use crate::error::{CacheError, Result};

type Settlement<T> = oneshot::Sender<Result<T>>;

// == Deduplication Broker ==
/// Maps a pending key to the waiters queued behind its producer.
///
/// A key is either absent (no fetch known to be in flight) or pending. There
/// is no resolved resting state: settling drains the waiters and forgets the
/// key in one step.
#[derive(Debug)]
pub struct DeduplicationBroker<T> {
    pending: HashMap<CacheKey, Vec<Settlement<T>>>,
}

impl<T> Default for DeduplicationBroker<T> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<T> DeduplicationBroker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a fetch for `key` is presumed in flight.
    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Marks `key` as pending with no waiters yet.
    ///
    /// Tracking an already pending key keeps its current waiters.
    pub fn begin_tracking(&mut self, key: CacheKey) {
        debug!(key = %key, "tracking in-flight fetch");
        self.pending.entry(key).or_default();
    }

    /// Queues a waiter behind the producer of `key`.
    ///
    /// Returns `None` if `key` is not pending.
    pub fn await_value(&mut self, key: &CacheKey) -> Option<Waiter<T>> {
        let waiters = self.pending.get_mut(key)?;
        let (tx, rx) = oneshot::channel();
        waiters.push(tx);
        debug!(key = %key, waiters = waiters.len(), "queued waiter behind in-flight fetch");

        Some(Waiter {
            key: key.clone(),
            rx,
        })
    }

    /// Rejects every waiter of `key` in arrival order and stops tracking it.
    ///
    /// No-op returning `0` if `key` is not pending.
    pub fn reject(&mut self, key: &CacheKey, reason: Option<String>) -> usize {
        let Some(waiters) = self.pending.remove(key) else {
            return 0;
        };

        let count = waiters.len();
        for tx in waiters {
            // A waiter that was dropped simply misses the broadcast.
            let _ = tx.send(Err(CacheError::Declined {
                key: key.to_string(),
                reason: reason.clone(),
            }));
        }
        debug!(key = %key, waiters = count, "rejected waiters");
        count
    }

    /// Number of keys currently pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<T: Clone> DeduplicationBroker<T> {
    /// Resolves every waiter of `key` with `value` in arrival order and stops
    /// tracking it.
    ///
    /// No-op returning `0` if `key` is not pending.
    pub fn settle(&mut self, key: &CacheKey, value: &T) -> usize {
        let Some(waiters) = self.pending.remove(key) else {
            return 0;
        };

        let count = waiters.len();
        for tx in waiters {
            let _ = tx.send(Ok(value.clone()));
        }
        debug!(key = %key, waiters = count, "settled waiters");
        count
    }
}

// == Waiter ==
/// Handle for a caller queued behind an in-flight fetch.
///
/// Resolves with the producer's value, or with [`CacheError::Declined`] if the
/// producer declined or the broker was dropped before settling.
#[derive(Debug)]
pub struct Waiter<T> {
    key: CacheKey,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Waiter<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CacheError::Declined {
                key: this.key.to_string(),
                reason: Some("producer dropped".to_string()),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash_key;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_broker_lifecycle() {
        let mut broker: DeduplicationBroker<u32> = DeduplicationBroker::new();
        let key = hash_key("k");

        assert!(!broker.is_pending(&key));
        broker.begin_tracking(key.clone());
        assert!(broker.is_pending(&key));
        assert_eq!(broker.pending_count(), 1);

        assert_eq!(broker.settle(&key, &1), 0);
        assert!(!broker.is_pending(&key));
        assert_eq!(broker.pending_count(), 0);
    }

    #[test]
    fn test_await_requires_pending() {
        let mut broker: DeduplicationBroker<u32> = DeduplicationBroker::new();
        assert!(broker.await_value(&hash_key("k")).is_none());
    }

    #[test]
    fn test_settle_fans_out_to_all_waiters() {
        let mut broker = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());

        let mut first = task::spawn(broker.await_value(&key).unwrap());
        let mut second = task::spawn(broker.await_value(&key).unwrap());
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        assert_eq!(broker.settle(&key, &"value".to_string()), 2);

        assert!(first.is_woken());
        assert_eq!(assert_ready!(first.poll()).unwrap(), "value");
        assert_eq!(assert_ready!(second.poll()).unwrap(), "value");
        assert!(!broker.is_pending(&key));
    }

    #[tokio::test]
    async fn test_settle_completes_waiters_in_arrival_order() {
        use std::sync::{Arc, Mutex};

        let mut broker = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());

        let completed = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..3 {
            let waiter = broker.await_value(&key).unwrap();
            let completed = completed.clone();
            handles.push(tokio::spawn(async move {
                let value: u32 = waiter.await.unwrap();
                completed.lock().unwrap().push((id, value));
            }));
        }

        // Let every task register its waker before settling
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(completed.lock().unwrap().is_empty());

        assert_eq!(broker.settle(&key, &42), 3);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*completed.lock().unwrap(), vec![(0, 42), (1, 42), (2, 42)]);
    }

    #[test]
    fn test_reject_declines_all_waiters() {
        let mut broker: DeduplicationBroker<u32> = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());

        let mut first = task::spawn(broker.await_value(&key).unwrap());
        let mut second = task::spawn(broker.await_value(&key).unwrap());

        assert_eq!(broker.reject(&key, Some("boom".to_string())), 2);

        for waiter in [&mut first, &mut second] {
            match assert_ready!(waiter.poll()) {
                Err(CacheError::Declined { reason, .. }) => {
                    assert_eq!(reason.as_deref(), Some("boom"))
                }
                other => panic!("expected decline, got {other:?}"),
            }
        }
        assert!(!broker.is_pending(&key));
    }

    #[test]
    fn test_reject_not_pending_is_noop() {
        let mut broker: DeduplicationBroker<u32> = DeduplicationBroker::new();
        assert_eq!(broker.reject(&hash_key("k"), None), 0);
    }

    #[test]
    fn test_begin_tracking_twice_keeps_waiters() {
        let mut broker = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());
        let mut waiter = task::spawn(broker.await_value(&key).unwrap());

        broker.begin_tracking(key.clone());
        assert_eq!(broker.settle(&key, &5u8), 1);
        assert_eq!(assert_ready!(waiter.poll()).unwrap(), 5);
    }

    #[test]
    fn test_dropped_broker_declines_waiter() {
        let mut broker: DeduplicationBroker<u32> = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());
        let mut waiter = task::spawn(broker.await_value(&key).unwrap());

        drop(broker);

        let err = assert_ready!(waiter.poll()).unwrap_err();
        assert!(err.is_declined());
    }

    #[test]
    fn test_dropped_waiter_does_not_block_others() {
        let mut broker = DeduplicationBroker::new();
        let key = hash_key("k");
        broker.begin_tracking(key.clone());

        drop(broker.await_value(&key).unwrap());
        let mut kept = task::spawn(broker.await_value(&key).unwrap());

        assert_eq!(broker.settle(&key, &9u16), 2);
        assert_eq!(assert_ready!(kept.poll()).unwrap(), 9);
    }
}
