use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ecommerce_common::logging::AppLogContext;

use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::{cache_domain, hard_limit};
use crate::error::{AppError, AppErrorCode};
use crate::model::{ProductModel, ProductPromotionModel, PromotionModel};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const KEY_ALL: &str = "all_promotions";
const PATTERN_PRODUCTS: &str = "product_promotions_*";

fn key_promotion(id_: u64) -> String {
    format!("promotion_{}", id_)
}
fn key_product(product_id: u64) -> String {
    format!("product_promotions_{}", product_id)
}

fn not_found(id_: u64) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("promotion:{}", id_))
}

fn check_fields(item: &PromotionModel) -> DefaultResult<(), AppError> {
    let max_pct = Decimal::from(hard_limit::MAX_PERCENTAGE_DISCOUNT);
    let reason = if item.name.trim().is_empty() {
        Some("promotion-name-empty")
    } else if item.discount_percent <= Decimal::ZERO || item.discount_percent > max_pct {
        Some("promotion-percent-out-of-range")
    } else if item.start_date > item.end_date {
        Some("promotion-window-inverted")
    } else {
        None
    };
    match reason {
        Some(r) => Err(AppError::new(AppErrorCode::InvalidInput, r)),
        None => Ok(()),
    }
}

pub struct PromotionService {
    repo: AppTableRepo<PromotionModel>,
    links: AppTableRepo<ProductPromotionModel>,
    products: AppTableRepo<ProductModel>,
    cache: AppCacheNamespace,
    ttl: u32,
    logctx: Arc<AppLogContext>,
}

impl PromotionService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        Self {
            repo: shr_state.repo(),
            links: shr_state.repo(),
            products: shr_state.repo(),
            cache: shr_state.cache_ns(cache_domain::PROMOTION),
            ttl: shr_state.cache_ttl().promotion,
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn all(&self) -> DefaultResult<Vec<PromotionModel>, AppError> {
        self.cache
            .read_through(KEY_ALL, self.ttl, || self.repo.all(None))
            .await
    }

    pub async fn by_id(&self, id_: u64) -> DefaultResult<Option<PromotionModel>, AppError> {
        let key = key_promotion(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl, || self.repo.one(id_, None))
            .await
    }

    async fn load_for_product(&self, product_id: u64) -> DefaultResult<Vec<PromotionModel>, AppError> {
        let links = self.links.by_product(product_id, None).await?;
        let mut out = Vec::with_capacity(links.len());
        for link in links {
            if let Some(p) = self.repo.one(link.promotion_id, None).await? {
                out.push(p);
            }
        }
        Ok(out)
    }

    /// Promotions assigned to the product are cached, the time window is
    /// evaluated on every call.
    pub async fn active_for_product(
        &self,
        product_id: u64,
        now: DateTime<Utc>,
    ) -> DefaultResult<Vec<PromotionModel>, AppError> {
        let key = key_product(product_id);
        let assigned = self
            .cache
            .read_through(key.as_str(), self.ttl, || self.load_for_product(product_id))
            .await?;
        Ok(assigned.into_iter().filter(|p| p.is_active(now)).collect())
    }

    pub async fn create(&self, item: PromotionModel) -> DefaultResult<PromotionModel, AppError> {
        check_fields(&item)?;
        let saved = self.repo.add(item, None).await?;
        self.invalidate(None).await;
        Ok(saved)
    }

    pub async fn update(&self, item: PromotionModel) -> DefaultResult<PromotionModel, AppError> {
        check_fields(&item)?;
        if self.repo.one(item.id, None).await?.is_none() {
            return Err(not_found(item.id));
        }
        let saved = self.repo.edit(item, None).await?;
        self.invalidate(Some(saved.id)).await;
        Ok(saved)
    }

    /// assignments to products are removed as well
    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        if self.repo.one(id_, None).await?.is_none() {
            return Err(not_found(id_));
        }
        let _num = self.links.delete_by("promotion_id", id_, None).await?;
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate(Some(id_)).await;
        Ok(())
    }

    /// assigning the same promotion twice keeps the existing assignment
    pub async fn assign_to_product(
        &self,
        promotion_id: u64,
        product_id: u64,
    ) -> DefaultResult<ProductPromotionModel, AppError> {
        if self.repo.one(promotion_id, None).await?.is_none() {
            return Err(not_found(promotion_id));
        }
        if self.products.one(product_id, None).await?.is_none() {
            let detail = format!("product:{}", product_id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        let existing = self.links.by_product(product_id, None).await?;
        if let Some(link) = existing.into_iter().find(|l| l.promotion_id == promotion_id) {
            return Ok(link);
        }
        let link = ProductPromotionModel {
            id: 0,
            product_id,
            promotion_id,
        };
        let saved = self.links.add(link, None).await?;
        self.invalidate_product(product_id).await;
        Ok(saved)
    }

    pub async fn remove_from_product(
        &self,
        promotion_id: u64,
        product_id: u64,
    ) -> DefaultResult<(), AppError> {
        let existing = self.links.by_product(product_id, None).await?;
        let link = existing
            .into_iter()
            .find(|l| l.promotion_id == promotion_id)
            .ok_or_else(|| {
                let detail = format!("promotion:{}, product:{}", promotion_id, product_id);
                AppError::new(AppErrorCode::NotFound, detail)
            })?;
        let _num = self.links.delete(link.id, None).await?;
        self.invalidate_product(product_id).await;
        Ok(())
    }

    async fn invalidate(&self, id_: Option<u64>) {
        let mut keys = vec![KEY_ALL.to_string()];
        if let Some(i) = id_ {
            keys.push(key_promotion(i));
        }
        let result = self.cache.invalidate(&keys, &[PATTERN_PRODUCTS]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
    }

    async fn invalidate_product(&self, product_id: u64) {
        let keys = [key_product(product_id)];
        let result = self.cache.invalidate(&keys, &[]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
    }
} // end of impl PromotionService
