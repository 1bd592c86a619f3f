//! Shared buffer for fan-out results.
//!
//! Workers `add` one result per fan-out key. The worker whose insert brings
//! the buffer to the threshold flushes it while still holding the lock, so
//! the buffer never holds more than `threshold` entries. The owner calls
//! [`BatchAccumulator::finish`] once all workers are done to flush the rest.

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::database_ops::{Store, UpsertRow};
use crate::error::{SeedError, SeedResult};

/// Sink for a batch of accumulated values. Returns the number of rows written.
#[async_trait]
pub trait Flush<V>: Send + Sync {
    async fn flush(&self, batch: Vec<V>) -> SeedResult<u64>;
}

pub struct BatchAccumulator<K, V, F> {
    entries: Mutex<HashMap<K, V>>,
    threshold: usize,
    sink: F,
}

impl<K, V, F> BatchAccumulator<K, V, F>
where
    K: Eq + Hash + Send,
    V: Send,
    F: Flush<V>,
{
    pub fn new(threshold: usize, sink: F) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            threshold: threshold.max(1),
            sink,
        }
    }

    /// Records `value` under `key`, replacing any earlier value. Returns the
    /// rows written if this call triggered a flush.
    pub async fn add(&self, key: K, value: V) -> SeedResult<u64> {
        let mut entries = self.entries.lock().await;
        entries.insert(key, value);
        if entries.len() < self.threshold {
            return Ok(0);
        }
        let batch: Vec<V> = entries.drain().map(|(_, v)| v).collect();
        debug!(size = batch.len(), "threshold flush");
        self.sink.flush(batch).await
    }

    /// Removes and returns everything not yet flushed.
    pub async fn drain(&self) -> Vec<V> {
        self.entries.lock().await.drain().map(|(_, v)| v).collect()
    }

    /// Drains and flushes the remainder.
    pub async fn finish(&self) -> SeedResult<u64> {
        let rest = self.drain().await;
        if rest.is_empty() {
            return Ok(0);
        }
        debug!(size = rest.len(), "drain flush");
        self.sink.flush(rest).await
    }

    pub async fn pending(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Flushes per-key row groups into the store as one upsert.
pub struct StoreFlush<S, R> {
    store: Arc<S>,
    cancel: CancellationToken,
    operation: String,
    _row: PhantomData<fn() -> R>,
}

impl<S, R> StoreFlush<S, R> {
    pub fn new(store: Arc<S>, cancel: CancellationToken, operation: impl Into<String>) -> Self {
        Self {
            store,
            cancel,
            operation: operation.into(),
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Store, R: UpsertRow> Flush<Vec<R>> for StoreFlush<S, R> {
    async fn flush(&self, batch: Vec<Vec<R>>) -> SeedResult<u64> {
        if self.cancel.is_cancelled() {
            return Err(SeedError::Cancelled {
                operation: self.operation.clone(),
            });
        }
        let rows: Vec<R> = batch.into_iter().flatten().collect();
        self.store.upsert(&self.operation, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        flushes: StdMutex<Vec<Vec<u32>>>,
    }

    #[async_trait]
    impl Flush<u32> for Arc<Recorder> {
        async fn flush(&self, mut batch: Vec<u32>) -> SeedResult<u64> {
            batch.sort_unstable();
            let n = batch.len() as u64;
            self.flushes.lock().unwrap().push(batch);
            Ok(n)
        }
    }

    #[tokio::test]
    async fn flushes_at_threshold_and_on_finish() {
        let rec = Arc::new(Recorder::default());
        let acc = BatchAccumulator::new(4, rec.clone());
        let mut written = 0;
        for k in 0..10u32 {
            written += acc.add(k, k).await.unwrap();
        }
        written += acc.finish().await.unwrap();
        assert_eq!(written, 10);

        let flushes = rec.flushes.lock().unwrap().clone();
        let sizes: Vec<usize> = flushes.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        let mut all: Vec<u32> = flushes.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn duplicate_key_overwrites() {
        let rec = Arc::new(Recorder::default());
        let acc = BatchAccumulator::new(10, rec.clone());
        acc.add("a", 1).await.unwrap();
        acc.add("a", 2).await.unwrap();
        assert_eq!(acc.pending().await, 1);
        assert_eq!(acc.drain().await, vec![2]);
        assert_eq!(acc.finish().await.unwrap(), 0);
        assert!(rec.flushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_adds_lose_nothing() {
        let rec = Arc::new(Recorder::default());
        let acc = Arc::new(BatchAccumulator::new(7, rec.clone()));
        let mut set = tokio::task::JoinSet::new();
        for k in 0..100u32 {
            let acc = acc.clone();
            set.spawn(async move { acc.add(k, k).await });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap().unwrap();
        }
        assert!(acc.pending().await < 7);
        acc.finish().await.unwrap();

        let flushes = rec.flushes.lock().unwrap().clone();
        assert!(flushes[..flushes.len() - 1].iter().all(|f| f.len() == 7));
        let mut all: Vec<u32> = flushes.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }
}
