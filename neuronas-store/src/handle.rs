//! Async access to a [`TieredStore`].
//!
//! Store operations block on SQLite and compression, so the handle moves each
//! call onto tokio's blocking pool. Clones share the same store.

use crate::error::{Error, Result};
use crate::store::{InsertReceipt, Retrieval, StoreStats, TieredStore};
use crate::tier::Tier;
use serde_json::Value;
use std::sync::Arc;

/// Cloneable async handle to a shared store.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<TieredStore>,
}

impl StoreHandle {
    pub fn new(store: TieredStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Borrow the underlying store for synchronous use.
    pub fn store(&self) -> &TieredStore {
        &self.store
    }

    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&TieredStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| Error::Internal(format!("Blocking store task failed: {}", e)))?
    }

    pub async fn insert(
        &self,
        tier: Tier,
        table: impl Into<String>,
        data: Value,
        importance: f64,
    ) -> Result<InsertReceipt> {
        let table = table.into();
        self.run(move |store| store.insert(tier, &table, &data, importance))
            .await
    }

    pub async fn retrieve_all(&self, tier: Tier, table: impl Into<String>) -> Result<Retrieval> {
        let table = table.into();
        self.run(move |store| store.retrieve_all(tier, &table)).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.run(|store| store.stats()).await
    }

    /// Close the store if this is the last handle.
    ///
    /// Returns the handle unchanged when other clones are still alive.
    pub fn try_close(self) -> std::result::Result<Result<()>, Self> {
        match Arc::try_unwrap(self.store) {
            Ok(store) => Ok(store.close()),
            Err(store) => Err(Self { store }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use serde_json::json;

    fn handle() -> StoreHandle {
        StoreHandle::new(TieredStore::in_memory(StoreConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_retrieve() {
        let handle = handle();
        handle
            .insert(Tier::L2, "metrics", json!({"score": 0.42}), 0.9)
            .await
            .unwrap();

        let retrieval = handle.retrieve_all(Tier::L2, "metrics").await.unwrap();
        assert_eq!(retrieval.records, vec![json!({"score": 0.42})]);
    }

    #[tokio::test]
    async fn test_invalid_table() {
        let handle = handle();
        let err = handle
            .insert(Tier::L1, "accounts", json!(1), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts() {
        let handle = handle();
        let mut tasks = Vec::new();
        for i in 0..20 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move {
                h.insert(Tier::L1, "memory", json!({"i": i}), 1.0).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.total_rows(Tier::L1), 20);
        assert_eq!(stats.hot_cache_entries, 20);
    }

    #[tokio::test]
    async fn test_try_close() {
        let handle = handle();
        let other = handle.clone();

        let handle = handle.try_close().err().unwrap();
        drop(other);
        assert!(handle.try_close().ok().unwrap().is_ok());
    }
}
