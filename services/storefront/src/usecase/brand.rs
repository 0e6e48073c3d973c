use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::AppLogContext;

use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::cache_domain;
use crate::error::{AppError, AppErrorCode};
use crate::model::BrandModel;
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const KEY_ALL: &str = "all";

fn key_detail(id_: u64) -> String {
    format!("detail:{}", id_)
}

pub struct BrandService {
    repo: AppTableRepo<BrandModel>,
    cache: AppCacheNamespace,
    ttl_list: u32,
    ttl_detail: u32,
    logctx: Arc<AppLogContext>,
}

impl BrandService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        let ttl_cfg = shr_state.cache_ttl();
        Self {
            repo: shr_state.repo(),
            cache: shr_state.cache_ns(cache_domain::BRAND),
            ttl_list: ttl_cfg.brand_list,
            ttl_detail: ttl_cfg.brand_detail,
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn all(&self) -> DefaultResult<Vec<BrandModel>, AppError> {
        self.cache
            .read_through(KEY_ALL, self.ttl_list, || self.repo.all(None))
            .await
    }

    pub async fn by_id(&self, id_: u64) -> DefaultResult<Option<BrandModel>, AppError> {
        let key = key_detail(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl_detail, || self.repo.one(id_, None))
            .await
    }

    async fn check_name(&self, item: &BrandModel) -> DefaultResult<(), AppError> {
        match self.repo.by_name(item.name.as_str(), None).await? {
            Some(other) if other.id != item.id => {
                let detail = format!("brand-name-duplicate:{}", item.name);
                Err(AppError::new(AppErrorCode::InvalidState, detail))
            }
            _others => Ok(()),
        }
    }

    pub async fn add(&self, item: BrandModel) -> DefaultResult<BrandModel, AppError> {
        let item = BrandModel { id: 0, ..item };
        self.check_name(&item).await?;
        let saved = self.repo.add(item, None).await?;
        self.invalidate(saved.id).await;
        Ok(saved)
    }

    pub async fn update(&self, item: BrandModel) -> DefaultResult<BrandModel, AppError> {
        if self.repo.one(item.id, None).await?.is_none() {
            let detail = format!("brand:{}", item.id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        self.check_name(&item).await?;
        let saved = self.repo.edit(item, None).await?;
        self.invalidate(saved.id).await;
        Ok(saved)
    }

    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        let num = self.repo.delete(id_, None).await?;
        if num == 0 {
            let detail = format!("brand:{}", id_);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        self.invalidate(id_).await;
        Ok(())
    }

    async fn invalidate(&self, id_: u64) {
        let keys = [KEY_ALL.to_string(), key_detail(id_)];
        let result = self.cache.invalidate(&keys, &[]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
    }
} // end of impl BrandService
