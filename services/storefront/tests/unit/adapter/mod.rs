
use std::result::Result as DefaultResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use storefront::adapter::cache::AbstractCacheStore;
use storefront::adapter::datastore::{
    AbstDataStore, AppDStoreFilter, AppDStorePage, AppDStoreRow, AppDStoreTxn,
    AppInMemoryDStore,
};
use storefront::error::{AppError, AppErrorCode};

/// cache backend which is always unreachable
pub(crate) struct MockFailingCache {}

fn ut_cache_down() -> AppError {
    AppError {
        code: AppErrorCode::RemoteCacheFailure,
        detail: Some("unit-test-cache-down".to_string()),
    }
}

#[async_trait]
impl AbstractCacheStore for MockFailingCache {
    async fn get(&self, _key: &str) -> DefaultResult<Option<String>, AppError> {
        Err(ut_cache_down())
    }
    async fn set(&self, _key: &str, _value: String, _ttl: u32) -> DefaultResult<(), AppError> {
        Err(ut_cache_down())
    }
    async fn delete(&self, _keys: Vec<String>) -> DefaultResult<usize, AppError> {
        Err(ut_cache_down())
    }
    async fn delete_by_pattern(&self, _pattern: &str) -> DefaultResult<usize, AppError> {
        Err(ut_cache_down())
    }
}

/// cache backend which never keeps anything
pub(crate) struct MockNoopCache {}

#[async_trait]
impl AbstractCacheStore for MockNoopCache {
    async fn get(&self, _key: &str) -> DefaultResult<Option<String>, AppError> {
        Ok(None)
    }
    async fn set(&self, _key: &str, _value: String, _ttl: u32) -> DefaultResult<(), AppError> {
        Ok(())
    }
    async fn delete(&self, _keys: Vec<String>) -> DefaultResult<usize, AppError> {
        Ok(0)
    }
    async fn delete_by_pattern(&self, _pattern: &str) -> DefaultResult<usize, AppError> {
        Ok(0)
    }
}

/// in-memory store which counts the transactions opened on it
pub(crate) struct MockCountingDStore {
    pub inner: AppInMemoryDStore,
    pub num_begin: Arc<AtomicUsize>,
}

impl MockCountingDStore {
    pub(crate) fn new(inner: AppInMemoryDStore) -> Self {
        Self {
            inner,
            num_begin: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl AbstDataStore for MockCountingDStore {
    async fn begin(&self) -> DefaultResult<AppDStoreTxn, AppError> {
        let _prev = self.num_begin.fetch_add(1, Ordering::SeqCst);
        self.inner.begin().await
    }
    async fn commit(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        self.inner.commit(txn).await
    }
    async fn rollback(&self, txn: AppDStoreTxn) -> DefaultResult<(), AppError> {
        self.inner.rollback(txn).await
    }
    async fn fetch_all(
        &self,
        table: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        self.inner.fetch_all(table, txn).await
    }
    async fn fetch_one(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        self.inner.fetch_one(table, filter, txn).await
    }
    async fn fetch_some(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        page: Option<AppDStorePage>,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<AppDStoreRow>, AppError> {
        self.inner.fetch_some(table, filter, page, txn).await
    }
    async fn insert(
        &self,
        table: &str,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<AppDStoreRow, AppError> {
        self.inner.insert(table, row, txn).await
    }
    async fn update(
        &self,
        table: &str,
        id_: u64,
        row: AppDStoreRow,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<AppDStoreRow>, AppError> {
        self.inner.update(table, id_, row, txn).await
    }
    async fn delete(
        &self,
        table: &str,
        filter: AppDStoreFilter,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        self.inner.delete(table, filter, txn).await
    }
} // end of impl MockCountingDStore
