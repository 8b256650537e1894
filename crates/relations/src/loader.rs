//! Request-scoped batching and caching of keyed lookups.
//!
//! Every `load(key)` lands in a pending map. The map is flushed as one
//! [`BatchLoad::load_batch`] call when it reaches `max_batch_size`, or when the
//! `batch_window` timer started by the first pending key fires. Answers are
//! cached per key for the lifetime of the loader.
//!
//! A key the batch does not answer rejects with [`LoaderError::NotFound`] and
//! is remembered as a miss. A failed batch rejects all of its keys with
//! [`LoaderError::Batch`] and caches nothing, so a later load retries.

use crate::error::LoaderError;
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use std::{collections::HashMap, fmt::Display, hash::Hash, sync::Arc, time::Duration};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

/// Loads many keys in one round trip.
#[async_trait]
pub trait BatchLoad: Send + Sync + 'static {
    type Key: Eq + Hash + Clone + Display + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;
    type Error: Display + Send;

    /// Keys absent from the returned map are treated as not found.
    async fn load_batch(
        &self,
        keys: &[Self::Key],
    ) -> Result<HashMap<Self::Key, Self::Value>, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// How long the first pending key waits for company.
    pub batch_window: Duration,
    /// Flush as soon as this many distinct keys are pending.
    pub max_batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_window: Duration::from_millis(2),
            max_batch_size: 100,
        }
    }
}

type Waiter<V> = oneshot::Sender<Result<V, LoaderError>>;

struct LoaderState<K, V> {
    /// `None` records a key the batch did not answer.
    cache: HashMap<K, Option<V>>,
    pending: IndexMap<K, Vec<Waiter<V>>>,
    flush_scheduled: bool,
}

enum FlushAction {
    Immediate,
    Delayed,
    None,
}

pub struct DataLoader<B: BatchLoad> {
    batch: B,
    config: LoaderConfig,
    state: Mutex<LoaderState<B::Key, B::Value>>,
}

impl<B: BatchLoad> DataLoader<B> {
    /// Loaders are shared so the flush timer can outlive the first caller.
    /// A `max_batch_size` of zero falls back to the default size.
    pub fn new(batch: B, mut config: LoaderConfig) -> Arc<Self> {
        if config.max_batch_size == 0 {
            config.max_batch_size = LoaderConfig::default().max_batch_size;
        }
        Arc::new(Self {
            batch,
            config,
            state: Mutex::new(LoaderState {
                cache: HashMap::new(),
                pending: IndexMap::new(),
                flush_scheduled: false,
            }),
        })
    }

    pub fn batch(&self) -> &B {
        &self.batch
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn load(self: &Arc<Self>, key: B::Key) -> Result<B::Value, LoaderError> {
        let (tx, rx) = oneshot::channel();

        let action = {
            let mut state = self.state.lock().await;
            if let Some(cached) = state.cache.get(&key) {
                return cached
                    .clone()
                    .ok_or_else(|| LoaderError::NotFound(key.to_string()));
            }
            state.pending.entry(key).or_default().push(tx);
            self.next_action(&mut state)
        };

        match action {
            FlushAction::Immediate => {
                let batch = {
                    let mut state = self.state.lock().await;
                    Self::take_batch(&mut state)
                };
                self.flush(batch).await;
            }
            FlushAction::Delayed => self.schedule_flush(),
            FlushAction::None => {}
        }

        rx.await.map_err(|_| LoaderError::Cancelled)?
    }

    /// Loads every key concurrently; results come back in input order.
    pub async fn load_many(
        self: &Arc<Self>,
        keys: Vec<B::Key>,
    ) -> Vec<Result<B::Value, LoaderError>> {
        join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Drops every cached answer. Pending loads are unaffected.
    pub async fn clear(&self) {
        self.state.lock().await.cache.clear();
    }

    pub async fn cached_len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    fn next_action(&self, state: &mut LoaderState<B::Key, B::Value>) -> FlushAction {
        if state.pending.len() >= self.config.max_batch_size {
            return FlushAction::Immediate;
        }
        if self.config.batch_window.is_zero() {
            return FlushAction::Immediate;
        }
        if !state.flush_scheduled {
            state.flush_scheduled = true;
            return FlushAction::Delayed;
        }
        FlushAction::None
    }

    fn schedule_flush(self: &Arc<Self>) {
        let loader = Arc::clone(self);
        let window = self.config.batch_window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let batch = {
                let mut state = loader.state.lock().await;
                Self::take_batch(&mut state)
            };
            loader.flush(batch).await;
        });
    }

    fn take_batch(
        state: &mut LoaderState<B::Key, B::Value>,
    ) -> IndexMap<B::Key, Vec<Waiter<B::Value>>> {
        state.flush_scheduled = false;
        std::mem::take(&mut state.pending)
    }

    async fn flush(&self, batch: IndexMap<B::Key, Vec<Waiter<B::Value>>>) {
        if batch.is_empty() {
            return;
        }

        let keys: Vec<B::Key> = batch.keys().cloned().collect();
        debug!(keys = keys.len(), "Flushing loader batch");

        match self.batch.load_batch(&keys).await {
            Ok(mut found) => {
                let mut state = self.state.lock().await;
                for (key, waiters) in batch {
                    let value = found.remove(&key);
                    for waiter in waiters {
                        let _ = waiter.send(
                            value
                                .clone()
                                .ok_or_else(|| LoaderError::NotFound(key.to_string())),
                        );
                    }
                    state.cache.insert(key, value);
                }
            }
            Err(err) => {
                let message = err.to_string();
                warn!(keys = keys.len(), error = %message, "Loader batch failed");
                for waiter in batch.into_values().flatten() {
                    let _ = waiter.send(Err(LoaderError::Batch(message.clone())));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Squares even numbers; odd numbers are "missing". 13 fails the batch.
    #[derive(Default)]
    struct Squares {
        calls: AtomicUsize,
        batches: std::sync::Mutex<Vec<Vec<i64>>>,
    }

    #[async_trait]
    impl BatchLoad for Squares {
        type Key = i64;
        type Value = i64;
        type Error = String;

        async fn load_batch(&self, keys: &[i64]) -> Result<HashMap<i64, i64>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().push(keys.to_vec());
            if keys.contains(&13) {
                return Err("unlucky".into());
            }
            Ok(keys
                .iter()
                .filter(|k| *k % 2 == 0)
                .map(|k| (*k, k * k))
                .collect())
        }
    }

    fn loader(max_batch_size: usize) -> Arc<DataLoader<Squares>> {
        DataLoader::new(
            Squares::default(),
            LoaderConfig {
                batch_window: Duration::from_millis(5),
                max_batch_size,
            },
        )
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_batch() {
        let loader = loader(100);
        let results = loader.load_many(vec![2, 4, 2, 6]).await;

        assert_eq!(results, vec![Ok(4), Ok(16), Ok(4), Ok(36)]);
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 1);
        assert_eq!(*loader.batch().batches.lock().unwrap(), vec![vec![2, 4, 6]]);
    }

    #[tokio::test]
    async fn test_missing_key_rejects_and_is_cached() {
        let loader = loader(100);

        assert_eq!(loader.load(3).await, Err(LoaderError::NotFound("3".into())));
        assert_eq!(loader.load(3).await, Err(LoaderError::NotFound("3".into())));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_answers_are_cached_until_cleared() {
        let loader = loader(100);
        assert_eq!(loader.load(8).await, Ok(64));
        assert_eq!(loader.load(8).await, Ok(64));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 1);

        loader.clear().await;
        assert_eq!(loader.cached_len().await, 0);
        assert_eq!(loader.load(8).await, Ok(64));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_failure_rejects_every_key_without_caching() {
        let loader = loader(100);
        let results = loader.load_many(vec![2, 13]).await;

        assert_eq!(
            results,
            vec![
                Err(LoaderError::Batch("unlucky".into())),
                Err(LoaderError::Batch("unlucky".into()))
            ]
        );
        assert_eq!(loader.cached_len().await, 0);

        assert_eq!(loader.load(2).await, Ok(4));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_full_batches_flush_without_waiting() {
        let loader = loader(2);
        let results = loader.load_many(vec![2, 4, 6]).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(
            *loader.batch().batches.lock().unwrap(),
            vec![vec![2, 4], vec![6]]
        );
    }

    #[tokio::test]
    async fn test_zero_batch_size_still_batches() {
        let loader = loader(0);
        assert_eq!(loader.config().max_batch_size, 100);

        let results = loader.load_many(vec![2, 4, 6, 8, 10]).await;
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_window_flushes_each_load() {
        let loader = DataLoader::new(
            Squares::default(),
            LoaderConfig {
                batch_window: Duration::ZERO,
                max_batch_size: 100,
            },
        );
        assert_eq!(loader.load(2).await, Ok(4));
        assert_eq!(loader.load(4).await, Ok(16));
        assert_eq!(loader.batch().calls.load(Ordering::SeqCst), 2);
    }
}
