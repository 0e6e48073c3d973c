use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::AppLogContext;

use super::product::key_detail;
use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::cache_domain;
use crate::error::{AppError, AppErrorCode};
use crate::model::{ProductModel, VariantModel};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

fn key_product(product_id: u64) -> String {
    format!("product:{}", product_id)
}
fn key_variant(id_: u64) -> String {
    format!("variant:{}", id_)
}

fn not_found(id_: u64) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("variant:{}", id_))
}

pub struct VariantService {
    repo: AppTableRepo<VariantModel>,
    products: AppTableRepo<ProductModel>,
    cache: AppCacheNamespace,
    product_cache: AppCacheNamespace,
    ttl: u32,
    logctx: Arc<AppLogContext>,
}

impl VariantService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        Self {
            repo: shr_state.repo(),
            products: shr_state.repo(),
            cache: shr_state.cache_ns(cache_domain::VARIANT),
            product_cache: shr_state.cache_ns(cache_domain::PRODUCT),
            ttl: shr_state.cache_ttl().variant,
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn by_product(&self, product_id: u64) -> DefaultResult<Vec<VariantModel>, AppError> {
        let key = key_product(product_id);
        self.cache
            .read_through(key.as_str(), self.ttl, || {
                self.repo.by_product(product_id, None)
            })
            .await
    }

    pub async fn by_id(&self, id_: u64) -> DefaultResult<Option<VariantModel>, AppError> {
        let key = key_variant(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl, || self.repo.one(id_, None))
            .await
    }

    pub async fn create(&self, item: VariantModel) -> DefaultResult<VariantModel, AppError> {
        if self.products.one(item.product_id, None).await?.is_none() {
            let detail = format!("product:{}", item.product_id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        let saved = self.repo.add(item, None).await?;
        self.invalidate(&[(saved.id, saved.product_id)]).await;
        Ok(saved)
    }

    pub async fn update(&self, item: VariantModel) -> DefaultResult<VariantModel, AppError> {
        let old = self
            .repo
            .one(item.id, None)
            .await?
            .ok_or_else(|| not_found(item.id))?;
        if old.product_id != item.product_id
            && self.products.one(item.product_id, None).await?.is_none()
        {
            let detail = format!("product:{}", item.product_id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        let saved = self.repo.edit(item, None).await?;
        self.invalidate(&[(old.id, old.product_id), (saved.id, saved.product_id)])
            .await;
        Ok(saved)
    }

    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        let old = self.repo.one(id_, None).await?.ok_or_else(|| not_found(id_))?;
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate(&[(old.id, old.product_id)]).await;
        Ok(())
    }

    /// overwrite the stock level, negative number is rejected
    pub async fn update_stock(&self, id_: u64, stock: i64) -> DefaultResult<VariantModel, AppError> {
        let stock = u32::try_from(stock).map_err(|_e| {
            AppError::new(AppErrorCode::InvalidInput, format!("variant-stock:{}", stock))
        })?;
        let mut saved = self.repo.one(id_, None).await?.ok_or_else(|| not_found(id_))?;
        saved.stock = stock;
        let saved = self.repo.edit(saved, None).await?;
        self.invalidate(&[(saved.id, saved.product_id)]).await;
        Ok(saved)
    }

    /// Drop cached entries of the given (variant, product) pairs in both
    /// variant and product domains.
    pub(crate) async fn invalidate(&self, pairs: &[(u64, u64)]) {
        let mut vkeys = Vec::with_capacity(pairs.len() * 2);
        let mut pkeys = Vec::with_capacity(pairs.len());
        for (vid, pid) in pairs {
            vkeys.push(key_variant(*vid));
            vkeys.push(key_product(*pid));
            pkeys.push(key_detail(*pid));
        }
        let result = self.cache.invalidate(&vkeys, &[]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
        let result = self.product_cache.invalidate(&pkeys, &[]).await;
        report_invalidation(&self.logctx, self.product_cache.domain(), result);
    }
} // end of impl VariantService
