use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::report_invalidation;
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::cache_domain;
use crate::error::{AppError, AppErrorCode};
use crate::model::{CategoryForest, CategoryModel, CategoryNode};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const KEY_HIERARCHY: &str = "hierarchy";
const KEY_MAP: &str = "map";
const KEY_LOWEST: &str = "lowest";
const KEY_PARENTS: &str = "parents";

fn key_finder(id_: u64) -> String {
    format!("finder:{}", id_)
}

fn not_found(id_: u64) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("category:{}", id_))
}

pub struct CategoryService {
    repo: AppTableRepo<CategoryModel>,
    cache: AppCacheNamespace,
    product_cache: AppCacheNamespace,
    ttl: u32,
    ttl_finder: u32,
    logctx: Arc<AppLogContext>,
}

impl CategoryService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        let ttl_cfg = shr_state.cache_ttl();
        Self {
            repo: shr_state.repo(),
            cache: shr_state.cache_ns(cache_domain::CATEGORY),
            product_cache: shr_state.cache_ns(cache_domain::PRODUCT),
            ttl: ttl_cfg.category,
            ttl_finder: ttl_cfg.category_finder,
            logctx: shr_state.log_context().clone(),
        }
    }

    async fn load_forest(&self) -> DefaultResult<Vec<CategoryNode>, AppError> {
        let rows = self.repo.all(None).await?;
        let forest = CategoryForest::build(&rows);
        if !forest.orphans.is_empty() {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::WARNING, "category-orphan, ids:{:?}", forest.orphans);
        }
        Ok(forest.roots)
    }

    /// roots of the category forest, orphan rows and their descendants
    /// are excluded
    pub async fn build_hierarchy(&self) -> DefaultResult<Vec<CategoryNode>, AppError> {
        self.cache
            .read_through(KEY_HIERARCHY, self.ttl, || self.load_forest())
            .await
    }

    /// flat lookup of every category including orphans, each node with
    /// its children
    pub async fn category_map(&self) -> DefaultResult<HashMap<u64, CategoryNode>, AppError> {
        self.cache
            .read_through(KEY_MAP, self.ttl, || async {
                let rows = self.repo.all(None).await?;
                Ok::<_, AppError>(CategoryForest::build(&rows).nodes)
            })
            .await
    }

    /// categories which have a parent
    pub async fn lowest_categories(&self) -> DefaultResult<Vec<CategoryModel>, AppError> {
        self.cache
            .read_through(KEY_LOWEST, self.ttl, || async {
                let rows = self.repo.all(None).await?;
                Ok::<Vec<CategoryModel>, AppError>(
                    rows.into_iter().filter(|r| r.parent.is_some()).collect(),
                )
            })
            .await
    }

    /// categories without parent
    pub async fn parent_categories(&self) -> DefaultResult<Vec<CategoryModel>, AppError> {
        self.cache
            .read_through(KEY_PARENTS, self.ttl, || async {
                let rows = self.repo.all(None).await?;
                Ok::<Vec<CategoryModel>, AppError>(
                    rows.into_iter().filter(|r| r.parent.is_none()).collect(),
                )
            })
            .await
    }

    pub async fn find_category_by_id(
        &self,
        id_: u64,
    ) -> DefaultResult<Option<CategoryNode>, AppError> {
        let key = key_finder(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl_finder, || async {
                let roots = self.build_hierarchy().await?;
                Ok::<_, AppError>(CategoryNode::find_in(&roots, id_).cloned())
            })
            .await
    }

    async fn parent_map(&self) -> DefaultResult<HashMap<u64, Option<u64>>, AppError> {
        let rows = self.repo.all(None).await?;
        Ok(rows.into_iter().map(|r| (r.id, r.parent)).collect())
    }

    pub async fn add(&self, name: String, parent: Option<u64>) -> DefaultResult<CategoryModel, AppError> {
        if let Some(p) = parent {
            if self.repo.one(p, None).await?.is_none() {
                return Err(not_found(p));
            }
        }
        let item = CategoryModel { id: 0, name, parent };
        let saved = self.repo.add(item, None).await?;
        self.invalidate().await;
        Ok(saved)
    }

    pub async fn update(&self, item: CategoryModel) -> DefaultResult<CategoryModel, AppError> {
        let parents = self.parent_map().await?;
        if !parents.contains_key(&item.id) {
            return Err(not_found(item.id));
        }
        if let Some(p) = item.parent {
            if p == item.id {
                let detail = format!("category-self-parent:{}", item.id);
                return Err(AppError::new(AppErrorCode::InvalidState, detail));
            }
            if !parents.contains_key(&p) {
                return Err(not_found(p));
            }
            if CategoryModel::creates_cycle(item.id, p, &parents) {
                let detail = format!("category-cycle, id:{}, parent:{}", item.id, p);
                return Err(AppError::new(AppErrorCode::InvalidState, detail));
            }
        }
        let saved = self.repo.edit(item, None).await?;
        self.invalidate().await;
        Ok(saved)
    }

    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        if self.repo.one(id_, None).await?.is_none() {
            return Err(not_found(id_));
        }
        if !self.repo.children_of(id_, None).await?.is_empty() {
            let detail = format!("category-has-children:{}", id_);
            return Err(AppError::new(AppErrorCode::InvalidState, detail));
        }
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate().await;
        Ok(())
    }

    // product listings embed the category forest
    async fn invalidate(&self) {
        let result = self.cache.invalidate(&[], &["*"]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
        let result = self.product_cache.invalidate(&[], &["*"]).await;
        report_invalidation(&self.logctx, self.product_cache.domain(), result);
    }
} // end of impl CategoryService
