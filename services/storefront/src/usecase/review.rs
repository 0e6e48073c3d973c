use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::Utc;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};
use ecommerce_common::util::AppPagination;

use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::{cache_domain, hard_limit};
use crate::error::{AppError, AppErrorCode};
use crate::model::{ProductModel, ReviewModel, ReviewPage, ReviewRating};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

fn key_rating(product_id: u64) -> String {
    format!("rating:{}", product_id)
}
fn key_list(product_id: u64, page: u32, per_page: u32) -> String {
    format!("list:{}:{}:{}", product_id, page, per_page)
}
fn pattern_list(product_id: u64) -> String {
    format!("list:{}:*", product_id)
}

fn not_found(id_: u64) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("review:{}", id_))
}

pub struct ReviewService {
    repo: AppTableRepo<ReviewModel>,
    products: AppTableRepo<ProductModel>,
    cache: AppCacheNamespace,
    ttl_rating: u32,
    ttl_list: u32,
    logctx: Arc<AppLogContext>,
}

impl ReviewService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        let ttl_cfg = shr_state.cache_ttl();
        Self {
            repo: shr_state.repo(),
            products: shr_state.repo(),
            cache: shr_state.cache_ns(cache_domain::REVIEW),
            ttl_rating: ttl_cfg.review_rating,
            ttl_list: ttl_cfg.review_list,
            logctx: shr_state.log_context().clone(),
        }
    }

    async fn load_rating(&self, product_id: u64) -> DefaultResult<ReviewRating, AppError> {
        let reviews = self.repo.by_product(product_id, None).await?;
        Ok(ReviewRating::from_reviews(&reviews))
    }

    /// average rating and number of reviews of the product, the refresh
    /// option skips the cached entry and overwrites it
    pub async fn rating(
        &self,
        product_id: u64,
        force_refresh: bool,
    ) -> DefaultResult<ReviewRating, AppError> {
        let key = key_rating(product_id);
        if force_refresh {
            let loaded = self.load_rating(product_id).await?;
            if let Err(e) = self.cache.set(key.as_str(), &loaded, self.ttl_rating).await {
                let logctx = &self.logctx;
                app_log_event!(logctx, AppLogLevel::WARNING, "review-rating-refresh, {}", e);
            }
            Ok(loaded)
        } else {
            self.cache
                .read_through(key.as_str(), self.ttl_rating, || self.load_rating(product_id))
                .await
        }
    }

    /// newest first, `per_page` is limited to the range 1 to 50
    pub async fn reviews(
        &self,
        product_id: u64,
        page: u32,
        per_page: u32,
    ) -> DefaultResult<ReviewPage, AppError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, hard_limit::MAX_REVIEWS_PER_PAGE);
        let key = key_list(product_id, page, per_page);
        self.cache
            .read_through(key.as_str(), self.ttl_list, || async {
                let mut items = self.repo.by_product(product_id, None).await?;
                items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
                let pg = AppPagination::new(page, per_page, items.len());
                Ok::<ReviewPage, AppError>(ReviewPage {
                    current_page: pg.current_page,
                    total_pages: pg.total_pages,
                    reviews: pg.slice(&items).to_vec(),
                })
            })
            .await
    }

    pub async fn add(&self, item: ReviewModel) -> DefaultResult<ReviewModel, AppError> {
        item.check_rating()?;
        if self.products.one(item.product_id, None).await?.is_none() {
            let detail = format!("product:{}", item.product_id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        let item = ReviewModel {
            id: 0,
            created_at: Utc::now(),
            ..item
        };
        let saved = self.repo.add(item, None).await?;
        self.invalidate(saved.product_id).await;
        Ok(saved)
    }

    async fn authored(&self, id_: u64, user_id: u64) -> DefaultResult<ReviewModel, AppError> {
        let saved = self.repo.one(id_, None).await?.ok_or_else(|| not_found(id_))?;
        if saved.user_id == user_id {
            Ok(saved)
        } else {
            let detail = format!("review:{}, user:{}", id_, user_id);
            Err(AppError::new(AppErrorCode::PermissionDenied, detail))
        }
    }

    /// only rating and comment can be modified, by the author
    pub async fn update(&self, item: ReviewModel, user_id: u64) -> DefaultResult<ReviewModel, AppError> {
        item.check_rating()?;
        let saved = self.authored(item.id, user_id).await?;
        let updated = ReviewModel {
            rating: item.rating,
            comment: item.comment,
            ..saved
        };
        let updated = self.repo.edit(updated, None).await?;
        self.invalidate(updated.product_id).await;
        Ok(updated)
    }

    pub async fn delete(&self, id_: u64, user_id: u64) -> DefaultResult<(), AppError> {
        let saved = self.authored(id_, user_id).await?;
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate(saved.product_id).await;
        Ok(())
    }

    async fn invalidate(&self, product_id: u64) {
        let keys = [key_rating(product_id)];
        let pattern = pattern_list(product_id);
        let result = self.cache.invalidate(&keys, &[pattern.as_str()]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
        if let Err(e) = self.rating(product_id, true).await {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::WARNING, "review-rating-refresh, product:{}, {}", product_id, e);
        }
    }
} // end of impl ReviewService
