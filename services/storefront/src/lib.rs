use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

pub mod adapter;
pub mod constant;
pub mod error;
pub mod model;
pub mod repository;
pub mod usecase;

use ecommerce_common::confidentiality::AbstractConfidentiality;
use ecommerce_common::config::{AppCacheTtlCfg, AppCheckoutCfg, AppConfig};
use ecommerce_common::logging::AppLogContext;

use adapter::cache::{self, AbstractCacheStore, AppCacheNamespace};
use adapter::datastore::{self, AbstDataStore};
use error::AppError;
use repository::AppTableRepo;

// global state shared by all tasks
pub struct AppSharedState {
    _cfg: Arc<AppConfig>,
    _log: Arc<AppLogContext>,
    _dstore: Arc<Box<dyn AbstDataStore>>,
    _cache: Arc<Box<dyn AbstractCacheStore>>,
}

impl AppSharedState {
    pub fn new(
        cfg: AppConfig,
        log: AppLogContext,
        confidential: Box<dyn AbstractConfidentiality>,
    ) -> DefaultResult<Self, AppError> {
        let confidential = Arc::new(confidential);
        let log = Arc::new(log);
        let dstore = datastore::build_context(
            log.clone(),
            &cfg.api_server.data_store,
            confidential.clone(),
        )?;
        let cache = cache::build_context(log.clone(), &cfg.api_server.cache, confidential);
        Ok(Self {
            _cfg: Arc::new(cfg),
            _log: log,
            _dstore: Arc::new(dstore),
            _cache: Arc::new(cache),
        })
    }

    /// skip backend selection from configuration, mostly for substituting
    /// datastore or cache in tests
    pub fn with_backends(
        cfg: AppConfig,
        log: AppLogContext,
        dstore: Box<dyn AbstDataStore>,
        cache: Box<dyn AbstractCacheStore>,
    ) -> Self {
        Self {
            _cfg: Arc::new(cfg),
            _log: Arc::new(log),
            _dstore: Arc::new(dstore),
            _cache: Arc::new(cache),
        }
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self._cfg
    }

    pub fn log_context(&self) -> &Arc<AppLogContext> {
        &self._log
    }

    pub fn datastore(&self) -> Arc<Box<dyn AbstDataStore>> {
        self._dstore.clone()
    }

    pub fn cache_store(&self) -> Arc<Box<dyn AbstractCacheStore>> {
        self._cache.clone()
    }

    pub fn cache_ttl(&self) -> &AppCacheTtlCfg {
        &self._cfg.api_server.cache_ttl
    }

    pub fn checkout_cfg(&self) -> &AppCheckoutCfg {
        &self._cfg.api_server.checkout
    }

    pub fn cache_ns(&self, domain: &'static str) -> AppCacheNamespace {
        AppCacheNamespace::new(domain, self._cache.clone(), self._log.clone())
    }

    pub fn repo<T>(&self) -> AppTableRepo<T> {
        AppTableRepo::new(self._dstore.clone())
    }
} // end of impl AppSharedState

impl Clone for AppSharedState {
    fn clone(&self) -> Self {
        Self {
            _cfg: self._cfg.clone(),
            _log: self._log.clone(),
            _dstore: self._dstore.clone(),
            _cache: self._cache.clone(),
        }
    }
}
