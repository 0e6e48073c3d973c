use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::adapter::datastore::{AbstDataStore, AppDStoreTxn};
use crate::constant::cache_domain;
use crate::error::{AppError, AppErrorCode};
use crate::model::{CouponDiscountApplied, CouponModel};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const KEY_ALL: &str = "all";

fn key_code(code: &str) -> String {
    format!("code:{}", code)
}
fn key_id(id_: u64) -> String {
    format!("id:{}", id_)
}

fn not_found(label: &str) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("coupon:{}", label))
}

pub struct CouponService {
    repo: AppTableRepo<CouponModel>,
    dstore: Arc<Box<dyn AbstDataStore>>,
    cache: AppCacheNamespace,
    ttl: u32,
    logctx: Arc<AppLogContext>,
}

impl CouponService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        Self {
            repo: shr_state.repo(),
            dstore: shr_state.datastore(),
            cache: shr_state.cache_ns(cache_domain::COUPON),
            ttl: shr_state.cache_ttl().coupon,
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn all(&self) -> DefaultResult<Vec<CouponModel>, AppError> {
        self.cache
            .read_through(KEY_ALL, self.ttl, || self.repo.all(None))
            .await
    }

    pub async fn by_id(&self, id_: u64) -> DefaultResult<Option<CouponModel>, AppError> {
        let key = key_id(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl, || self.repo.one(id_, None))
            .await
    }

    pub async fn by_code(&self, code: &str) -> DefaultResult<Option<CouponModel>, AppError> {
        let key = key_code(code);
        self.cache
            .read_through_opt(key.as_str(), self.ttl, || self.repo.by_code(code, None))
            .await
    }

    pub async fn create(&self, item: CouponModel) -> DefaultResult<CouponModel, AppError> {
        item.check_fields()?;
        if self.repo.by_code(item.code.as_str(), None).await?.is_some() {
            let detail = format!("coupon-code-duplicate:{}", item.code);
            return Err(AppError::new(AppErrorCode::InvalidState, detail));
        }
        let saved = self.repo.add(item, None).await?;
        self.invalidate(&saved, None).await;
        Ok(saved)
    }

    pub async fn update(&self, item: CouponModel) -> DefaultResult<CouponModel, AppError> {
        item.check_fields()?;
        let old = self
            .repo
            .one(item.id, None)
            .await?
            .ok_or_else(|| not_found(item.id.to_string().as_str()))?;
        if let Some(other) = self.repo.by_code(item.code.as_str(), None).await? {
            if other.id != item.id {
                let detail = format!("coupon-code-duplicate:{}", item.code);
                return Err(AppError::new(AppErrorCode::InvalidState, detail));
            }
        }
        let saved = self.repo.edit(item, None).await?;
        self.invalidate(&saved, Some(old.code.as_str())).await;
        Ok(saved)
    }

    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        let old = self
            .repo
            .one(id_, None)
            .await?
            .ok_or_else(|| not_found(id_.to_string().as_str()))?;
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate(&old, None).await;
        Ok(())
    }

    /// The coupon is always read from the datastore, stale usage count in
    /// cache must not let an exhausted coupon pass. No side effect.
    pub async fn validate_coupon(
        &self,
        code: &str,
        total: Decimal,
    ) -> DefaultResult<CouponModel, AppError> {
        self.validate_in(code, total, None).await
    }

    pub async fn apply_coupon_discount(
        &self,
        code: &str,
        total: Decimal,
    ) -> DefaultResult<CouponDiscountApplied, AppError> {
        self.apply_in(code, total, None).await
    }

    pub(crate) async fn validate_in(
        &self,
        code: &str,
        total: Decimal,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<CouponModel, AppError> {
        let coupon = self
            .repo
            .by_code(code, txn)
            .await?
            .ok_or_else(|| not_found(code))?;
        coupon.validate(total, Utc::now())?;
        Ok(coupon)
    }

    pub(crate) async fn apply_in(
        &self,
        code: &str,
        total: Decimal,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<CouponDiscountApplied, AppError> {
        let coupon = self.validate_in(code, total, txn).await?;
        let discount_amount = coupon.discount(total);
        Ok(CouponDiscountApplied {
            coupon_id: coupon.id,
            discount_amount,
            final_amount: total - discount_amount,
        })
    }

    /// Runs in its own short transaction, the coupon row is locked between
    /// reading and writing back the counter.
    pub async fn increment_uses(&self, id_: u64) -> DefaultResult<CouponModel, AppError> {
        let mut txn = self.dstore.begin().await?;
        let saved = match self.repo.increment_uses(id_, Some(&mut txn)).await {
            Ok(v) => v,
            Err(e) => {
                if let Err(re) = self.dstore.rollback(txn).await {
                    let logctx = &self.logctx;
                    app_log_event!(logctx, AppLogLevel::ERROR, "rollback-fail, coupon:{}, {}", id_, re);
                }
                return Err(e);
            }
        };
        self.dstore.commit(txn).await?;
        self.invalidate(&saved, None).await;
        Ok(saved)
    }

    async fn invalidate(&self, saved: &CouponModel, old_code: Option<&str>) {
        let mut keys = vec![KEY_ALL.to_string(), key_id(saved.id), key_code(saved.code.as_str())];
        if let Some(c) = old_code {
            keys.push(key_code(c));
        }
        let result = self.cache.invalidate(&keys, &[]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
    }
} // end of impl CouponService
