mod in_mem;
mod remote;

use std::boxed::Box;
use std::future::Future;
use std::marker::{Send, Sync};
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use ecommerce_common::confidentiality::AbstractConfidentiality;
use ecommerce_common::config::{AppCacheCfg, AppInMemoryCacheCfg};
use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::constant::hard_limit;
use crate::error::{AppError, AppErrorCode};

pub use in_mem::AppInMemoryCacheStore;
pub use remote::AppRedisCacheStore;

/// key-value cache backend, values are serialized text
#[async_trait]
pub trait AbstractCacheStore: Send + Sync {
    async fn get(&self, key: &str) -> DefaultResult<Option<String>, AppError>;

    async fn set(&self, key: &str, value: String, ttl_secs: u32) -> DefaultResult<(), AppError>;

    /// return number of keys actually removed
    async fn delete(&self, keys: Vec<String>) -> DefaultResult<usize, AppError>;

    async fn delete_by_pattern(&self, pattern: &str) -> DefaultResult<usize, AppError>;
}

pub(crate) fn build_context(
    logctx: Arc<AppLogContext>,
    cfg: &AppCacheCfg,
    confidential: Arc<Box<dyn AbstractConfidentiality>>,
) -> Box<dyn AbstractCacheStore> {
    match cfg {
        AppCacheCfg::InMemory(c) => Box::new(AppInMemoryCacheStore::new(c)),
        AppCacheCfg::Redis(c) => match AppRedisCacheStore::try_build(c, confidential) {
            #[cfg(feature = "redis")]
            Ok(item) => {
                app_log_event!(logctx, AppLogLevel::INFO, "redis-cache-selected, alias:{}", item.alias);
                Box::new(item)
            }
            #[cfg(not(feature = "redis"))]
            Ok(_item) => Box::new(app_inmem_fallback()),
            Err(e) => {
                app_log_event!(logctx, AppLogLevel::WARNING, "fallback-inmem-cache, {}", e);
                Box::new(app_inmem_fallback())
            }
        },
    }
}

fn app_inmem_fallback() -> AppInMemoryCacheStore {
    let cfg = AppInMemoryCacheCfg {
        max_items: hard_limit::MAX_ITEMS_INMEM_CACHE,
    };
    AppInMemoryCacheStore::new(&cfg)
}

/// Cache access limited to one domain, every key is prefixed with
/// `{domain}:` and values are stored in JSON.
///
/// Failures of the cache backend never fail the read-through accessors,
/// they are logged and the loader is called instead.
pub struct AppCacheNamespace {
    domain: &'static str,
    store: Arc<Box<dyn AbstractCacheStore>>,
    logctx: Arc<AppLogContext>,
}

impl AppCacheNamespace {
    pub fn new(
        domain: &'static str,
        store: Arc<Box<dyn AbstractCacheStore>>,
        logctx: Arc<AppLogContext>,
    ) -> Self {
        Self {
            domain,
            store,
            logctx,
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.domain, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DefaultResult<Option<T>, AppError> {
        let fullkey = self.full_key(key);
        match self.store.get(fullkey.as_str()).await? {
            Some(serial) => serde_json::from_str::<T>(serial.as_str())
                .map(Some)
                .map_err(|e| {
                    let detail = format!("key:{}, {}", fullkey, e);
                    AppError::new(AppErrorCode::CacheFailure, detail)
                }),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u32,
    ) -> DefaultResult<(), AppError> {
        let serial = serde_json::to_string(value)
            .map_err(|e| AppError::new(AppErrorCode::CacheFailure, e.to_string()))?;
        self.store
            .set(self.full_key(key).as_str(), serial, ttl_secs)
            .await
    }

    pub async fn delete(&self, keys: &[String]) -> DefaultResult<usize, AppError> {
        let fullkeys = keys.iter().map(|k| self.full_key(k)).collect::<Vec<_>>();
        self.store.delete(fullkeys).await
    }

    pub async fn delete_by_pattern(&self, pattern: &str) -> DefaultResult<usize, AppError> {
        self.store
            .delete_by_pattern(self.full_key(pattern).as_str())
            .await
    }

    /// Delete the given keys and every key matching the patterns. All of
    /// them are attempted even if some fail, the last error is reported.
    pub async fn invalidate(&self, keys: &[String], patterns: &[&str]) -> DefaultResult<(), AppError> {
        let mut last_err = None;
        if !keys.is_empty() {
            if let Err(e) = self.delete(keys).await {
                last_err = Some(e);
            }
        }
        for patt in patterns {
            if let Err(e) = self.delete_by_pattern(patt).await {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn try_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get::<T>(key).await {
            Ok(v) => v,
            Err(e) => {
                let logctx = &self.logctx;
                app_log_event!(logctx, AppLogLevel::WARNING, "domain:{}, key:{}, {}", self.domain, key, e);
                None
            }
        }
    }

    async fn try_save<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u32) {
        if let Err(e) = self.set(key, value, ttl_secs).await {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::WARNING, "domain:{}, key:{}, {}", self.domain, key, e);
        }
    }

    /// cache-aside read, whatever the loader returns is cached
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u32,
        loader: F,
    ) -> DefaultResult<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DefaultResult<T, AppError>>,
    {
        if let Some(v) = self.try_cached::<T>(key).await {
            return Ok(v);
        }
        let loaded = loader().await?;
        self.try_save(key, &loaded, ttl_secs).await;
        Ok(loaded)
    }

    /// cache-aside read, absence reported by the loader is not cached
    pub async fn read_through_opt<T, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u32,
        loader: F,
    ) -> DefaultResult<Option<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DefaultResult<Option<T>, AppError>>,
    {
        if let Some(v) = self.try_cached::<T>(key).await {
            return Ok(Some(v));
        }
        let loaded = loader().await?;
        if let Some(v) = loaded.as_ref() {
            self.try_save(key, v, ttl_secs).await;
        }
        Ok(loaded)
    }
} // end of impl AppCacheNamespace
