//! Call Coalescer
//!
//! Deduplicates concurrent loads of the same key and briefly caches
//! successful results.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{CacheError, Result};

/// Slot every waiter watches; `None` until the call completes.
type Outcome<V> = Option<Result<V>>;

struct CachedResult<V> {
    value: V,
    /// None when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl<V> CachedResult<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// How a [`CallCoalescer::do_call_with_source`] result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSource {
    /// A load ran, started by this caller or joined while in flight
    Executed,
    /// Served from the short-lived result cache without running a load
    Replayed,
}

struct FlightState<V> {
    calls: HashMap<String, watch::Receiver<Outcome<V>>>,
    results: HashMap<String, CachedResult<V>>,
}

enum Entered<V> {
    Cached(V),
    Waiting(watch::Receiver<Outcome<V>>),
}

// == Flight Guard ==
/// Owns the sending side of one in-flight call.
///
/// If the call dies without finishing, the record is cleared before the
/// channel closes, so released waiters never find a stale entry.
struct FlightGuard<V> {
    key: String,
    state: Arc<Mutex<FlightState<V>>>,
    tx: Option<watch::Sender<Outcome<V>>>,
}

impl<V: Clone> FlightGuard<V> {
    /// Retires the call, caches a success, then releases every waiter.
    fn finish(mut self, result: Result<V>, ttl: Duration) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        {
            let mut state = self.state.lock();
            state.calls.remove(&self.key);
            if let Ok(value) = &result {
                state.results.insert(
                    self.key.clone(),
                    CachedResult {
                        value: value.clone(),
                        expires_at: Instant::now().checked_add(ttl),
                    },
                );
            }
        }
        // No receivers left is fine
        let _ = tx.send(Some(result));
    }
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.state.lock().calls.remove(&self.key);
        }
    }
}

// == Call Coalescer ==
/// Singleflight with a short-lived result cache.
///
/// For any key at most one load runs at a time. Callers arriving while it
/// runs wait for it and receive the same value or error. Successes are
/// replayed for `ttl`; failures are never cached.
///
/// The load runs on its own task, so a waiter that gives up (timeout or
/// cancellation) does not abort it for the others.
pub struct CallCoalescer<V> {
    state: Arc<Mutex<FlightState<V>>>,
    ttl: Duration,
}

impl<V> CallCoalescer<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlightState {
                calls: HashMap::new(),
                results: HashMap::new(),
            })),
            ttl,
        }
    }

    // == Do ==
    /// Runs `load` for `key` unless an identical call is in flight or a
    /// fresh result is cached.
    pub async fn do_call<F>(&self, key: &str, load: F) -> Result<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        self.do_call_with_source(key, load)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`do_call`](Self::do_call), also reporting whether a load ran.
    pub async fn do_call_with_source<F>(&self, key: &str, load: F) -> Result<(V, CallSource)>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let mut rx = match self.enter(key, load) {
            Entered::Cached(value) => return Ok((value, CallSource::Replayed)),
            Entered::Waiting(rx) => rx,
        };

        let outcome = match rx.wait_for(|slot| slot.is_some()).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        outcome
            .unwrap_or_else(|| {
                Err(CacheError::Internal(format!(
                    "in-flight load for '{}' was abandoned",
                    key
                )))
            })
            .map(|value| (value, CallSource::Executed))
    }

    fn enter<F>(&self, key: &str, load: F) -> Entered<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let (tx, rx) = {
            let mut state = self.state.lock();

            if let Some(cached) = state.results.get(key) {
                if cached.is_fresh(Instant::now()) {
                    debug!(key, "coalescer result cache hit");
                    return Entered::Cached(cached.value.clone());
                }
            }

            if let Some(rx) = state.calls.get(key) {
                debug!(key, "joining in-flight load");
                return Entered::Waiting(rx.clone());
            }

            let (tx, rx) = watch::channel(None);
            state.calls.insert(key.to_string(), rx.clone());
            (tx, rx)
        };

        let guard = FlightGuard {
            key: key.to_string(),
            state: Arc::clone(&self.state),
            tx: Some(tx),
        };
        let ttl = self.ttl;
        tokio::spawn(async move {
            let result = load.await;
            guard.finish(result, ttl);
        });

        Entered::Waiting(rx)
    }

    // == Purge Expired ==
    /// Drops expired cached results. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.results.len();
        state.results.retain(|_, cached| cached.is_fresh(now));
        before - state.results.len()
    }

    /// Number of loads currently running.
    pub fn in_flight(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Number of cached results, expired or not.
    pub fn cached(&self) -> usize {
        self.state.lock().results.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn counted(
        counter: &Arc<AtomicUsize>,
        delay: Duration,
        result: Result<String>,
    ) -> impl Future<Output = Result<String>> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            sleep(delay).await;
            result
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_run_once() {
        let flight = Arc::new(CallCoalescer::new(Duration::from_secs(10)));
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let load = counted(&counter, Duration::from_millis(50), Ok("99.5".to_string()));
                tokio::spawn(async move { flight.do_call("alice", load).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "99.5");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_shared_but_not_cached() {
        let flight = Arc::new(CallCoalescer::<String>::new(Duration::from_secs(10)));
        let counter = Arc::new(AtomicUsize::new(0));
        let failure = Err(CacheError::Origin("db down".to_string()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let load = counted(&counter, Duration::from_millis(50), failure.clone());
                tokio::spawn(async move { flight.do_call("bob", load).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), failure);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(flight.cached(), 0);

        // The next caller retries instead of replaying the failure
        let retry = flight
            .do_call("bob", counted(&counter, Duration::ZERO, Ok("ok".to_string())))
            .await;
        assert_eq!(retry.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_is_replayed_within_ttl() {
        let flight = CallCoalescer::new(Duration::from_secs(10));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let value = flight
                .do_call("carol", counted(&counter, Duration::ZERO, Ok("v".to_string())))
                .await
                .unwrap();
            assert_eq!(value, "v");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_results_rerun_and_purge() {
        let flight = CallCoalescer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        flight
            .do_call("dave", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await
            .unwrap();
        sleep(Duration::from_millis(40)).await;

        assert_eq!(flight.purge_expired(), 1);
        assert_eq!(flight.cached(), 0);

        flight
            .do_call("dave", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_coalesce() {
        let flight = Arc::new(CallCoalescer::new(Duration::from_secs(10)));
        let counter = Arc::new(AtomicUsize::new(0));

        let a = flight.do_call("a", counted(&counter, Duration::from_millis(20), Ok("a".to_string())));
        let b = flight.do_call("b", counted(&counter, Duration::from_millis(20), Ok("b".to_string())));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_leader_does_not_abort_waiters() {
        let flight = Arc::new(CallCoalescer::new(Duration::from_secs(10)));
        let counter = Arc::new(AtomicUsize::new(0));

        let leader = {
            let flight = Arc::clone(&flight);
            let load = counted(&counter, Duration::from_millis(80), Ok("kept".to_string()));
            tokio::spawn(async move { flight.do_call("erin", load).await })
        };
        sleep(Duration::from_millis(10)).await;

        let waiter = {
            let flight = Arc::clone(&flight);
            let load = counted(&counter, Duration::ZERO, Ok("duplicate".to_string()));
            tokio::spawn(async move { flight.do_call("erin", load).await })
        };
        sleep(Duration::from_millis(10)).await;
        leader.abort();

        assert_eq!(waiter.await.unwrap().unwrap(), "kept");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unbounded_ttl_never_expires() {
        let flight = CallCoalescer::new(Duration::MAX);
        let counter = Arc::new(AtomicUsize::new(0));

        let value = flight
            .do_call("gina", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await;
        assert_eq!(value.unwrap(), "v");

        let (value, source) = flight
            .do_call_with_source("gina", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await
            .unwrap();
        assert_eq!(value, "v");
        assert_eq!(source, CallSource::Replayed);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(flight.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_source_distinguishes_load_from_replay() {
        let flight = CallCoalescer::new(Duration::from_secs(10));
        let counter = Arc::new(AtomicUsize::new(0));

        let (_, first) = flight
            .do_call_with_source("hank", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await
            .unwrap();
        let (_, second) = flight
            .do_call_with_source("hank", counted(&counter, Duration::ZERO, Ok("v".to_string())))
            .await
            .unwrap();

        assert_eq!(first, CallSource::Executed);
        assert_eq!(second, CallSource::Replayed);
    }

    async fn exploding_load() -> Result<String> {
        panic!("origin exploded")
    }

    #[tokio::test]
    async fn test_panicking_load_releases_waiters() {
        let flight = CallCoalescer::<String>::new(Duration::from_secs(10));

        let result = flight.do_call("frank", exploding_load()).await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
        assert_eq!(flight.in_flight(), 0);

        let retry = flight
            .do_call("frank", async { Ok::<_, CacheError>("fine".to_string()) })
            .await;
        assert_eq!(retry.unwrap(), "fine");
    }
}
