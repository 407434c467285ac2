use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::{FetchError, FetchOutcome};

type Shared<T> = watch::Receiver<Option<FetchOutcome<T>>>;

/// Shares one in-flight upstream call between concurrent callers of the same key.
pub(crate) struct InFlight<K, T> {
    calls: Mutex<HashMap<K, Shared<T>>>,
}

enum Role<T> {
    Leader(watch::Sender<Option<FetchOutcome<T>>>),
    Follower(Shared<T>),
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    T: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Run `fetch` unless a call for `key` is already running, in which case
    /// wait for that call's outcome instead.
    pub(crate) async fn run<F, Fut>(&self, key: K, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome<T>>,
    {
        let role = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            match calls.get(&key) {
                Some(receiver) => Role::Follower(receiver.clone()),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    calls.insert(key.clone(), receiver);
                    Role::Leader(sender)
                }
            }
        };

        match role {
            Role::Follower(mut receiver) => {
                debug!(%key, "joining in-flight request");
                let shared = receiver
                    .wait_for(Option::is_some)
                    .await
                    .map(|outcome| outcome.clone())
                    .ok()
                    .flatten();
                shared.unwrap_or_else(|| {
                    Err(FetchError::network_failure(
                        "shared upstream request was cancelled",
                    ))
                })
            }
            Role::Leader(sender) => {
                let _entry = EntryGuard {
                    calls: &self.calls,
                    key,
                };
                let outcome = fetch().await;
                let _ = sender.send(Some(outcome.clone()));
                outcome
            }
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Removes the in-flight entry when the leader finishes or is dropped.
struct EntryGuard<'a, K: Eq + Hash, T> {
    calls: &'a Mutex<HashMap<K, Shared<T>>>,
    key: K,
}

impl<K: Eq + Hash, T> Drop for EntryGuard<'_, K, T> {
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::gateway::{FetchErrorKind, Fetched};

    #[tokio::test]
    async fn concurrent_callers_share_one_call() {
        let inflight = Arc::new(InFlight::<String, u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Fetched::Data(7))
        };

        let (first, second) = tokio::join!(
            inflight.run(String::from("overview:AAPL"), || fetch(Arc::clone(&calls))),
            inflight.run(String::from("overview:AAPL"), || fetch(Arc::clone(&calls))),
        );

        assert_eq!(first, Ok(Fetched::Data(7)));
        assert_eq!(second, Ok(Fetched::Data(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(inflight.pending(), 0);
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let inflight = InFlight::<String, u32>::new();
        let calls = AtomicUsize::new(0);

        let (first, second) = tokio::join!(
            inflight.run(String::from("overview:AAPL"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::Data(1))
            }),
            inflight.run(String::from("overview:MSFT"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched::Data(2))
            }),
        );

        assert_eq!(first, Ok(Fetched::Data(1)));
        assert_eq!(second, Ok(Fetched::Data(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_leader_fails_followers_and_clears_entry() {
        let inflight = Arc::new(InFlight::<String, u32>::new());

        let leader = {
            let inflight = Arc::clone(&inflight);
            tokio::spawn(async move {
                inflight
                    .run(String::from("series:AAPL:1month"), || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(Fetched::Data(1))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let follower = {
            let inflight = Arc::clone(&inflight);
            tokio::spawn(async move {
                inflight
                    .run(String::from("series:AAPL:1month"), || async { Ok(Fetched::Data(2)) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let outcome = follower.await.expect("follower task should finish");
        let error = outcome.expect_err("follower sees the cancellation");
        assert_eq!(error.kind(), FetchErrorKind::NetworkFailure);
        assert_eq!(inflight.pending(), 0);
    }
}
