use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

#[cfg(feature = "redis")]
use std::future::Future;
#[cfg(feature = "redis")]
use std::time::Duration;

#[cfg(feature = "redis")]
use async_trait::async_trait;
#[cfg(feature = "redis")]
use redis::aio::MultiplexedConnection;
#[cfg(feature = "redis")]
use redis::{AsyncCommands, RedisError};
#[cfg(feature = "redis")]
use tokio::time::timeout;

use ecommerce_common::confidentiality::AbstractConfidentiality;
use ecommerce_common::config::AppRedisCacheCfg;

#[cfg(feature = "redis")]
use super::AbstractCacheStore;
use crate::error::{AppError, AppErrorCode};

#[cfg(feature = "redis")]
impl From<RedisError> for AppError {
    fn from(value: RedisError) -> Self {
        let detail = format!("{:?}, {}", value.kind(), value);
        AppError::new(AppErrorCode::RemoteCacheFailure, detail)
    }
}

#[cfg(feature = "redis")]
pub struct AppRedisCacheStore {
    pub alias: String,
    client: redis::Client,
    timeout: Duration,
}
#[cfg(not(feature = "redis"))]
pub struct AppRedisCacheStore {}

#[cfg(feature = "redis")]
impl AppRedisCacheStore {
    pub fn try_build(
        cfg: &AppRedisCacheCfg,
        confidential: Arc<Box<dyn AbstractConfidentiality>>,
    ) -> DefaultResult<Self, AppError> {
        let serial = confidential.try_get_payload(cfg.confidentiality_path.as_str())?;
        // the secret is a JSON string of the connection URL
        let url = serde_json::from_str::<String>(serial.as_str()).map_err(|e| {
            let detail = e.to_string() + ", secret-parsing-error, source: AppRedisCacheStore";
            AppError::new(AppErrorCode::InvalidJsonFormat, detail)
        })?;
        let client = redis::Client::open(url.as_str())?;
        Ok(Self {
            client,
            alias: cfg.alias.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms as u64),
        })
    }

    async fn with_timeout<T, Fut>(&self, op: Fut) -> DefaultResult<T, AppError>
    where
        Fut: Future<Output = DefaultResult<T, RedisError>>,
    {
        match timeout(self.timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(AppError::new(
                AppErrorCode::RemoteCacheFailure,
                format!("timeout, alias:{}", self.alias),
            )),
        }
    }

    async fn connection(&self) -> DefaultResult<MultiplexedConnection, AppError> {
        self.with_timeout(self.client.get_multiplexed_async_connection())
            .await
    }
} // end of impl AppRedisCacheStore

#[cfg(feature = "redis")]
#[async_trait]
impl AbstractCacheStore for AppRedisCacheStore {
    async fn get(&self, key: &str) -> DefaultResult<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        self.with_timeout(conn.get::<&str, Option<String>>(key))
            .await
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u32) -> DefaultResult<(), AppError> {
        let mut conn = self.connection().await?;
        self.with_timeout(conn.set_ex::<&str, String, ()>(key, value, ttl_secs as u64))
            .await
    }

    async fn delete(&self, keys: Vec<String>) -> DefaultResult<usize, AppError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        self.with_timeout(conn.del::<Vec<String>, usize>(keys))
            .await
    }

    // `KEYS` blocks the server while scanning
    async fn delete_by_pattern(&self, pattern: &str) -> DefaultResult<usize, AppError> {
        let mut conn = self.connection().await?;
        let found = self
            .with_timeout(conn.keys::<&str, Vec<String>>(pattern))
            .await?;
        if found.is_empty() {
            return Ok(0);
        }
        self.with_timeout(conn.del::<Vec<String>, usize>(found))
            .await
    }
} // end of impl AbstractCacheStore for AppRedisCacheStore

#[cfg(not(feature = "redis"))]
impl AppRedisCacheStore {
    pub fn try_build(
        cfg: &AppRedisCacheCfg,
        _confidential: Arc<Box<dyn AbstractConfidentiality>>,
    ) -> DefaultResult<Self, AppError> {
        let detail = format!("redis-cache, alias:{}", cfg.alias.as_str());
        Err(AppError::new(AppErrorCode::FeatureDisabled, detail))
    }
}
