use std::collections::{HashMap, HashSet};
use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::AppLogContext;
use ecommerce_common::util::AppPagination;

use super::{report_invalidation, CategoryService};
use crate::adapter::cache::AppCacheNamespace;
use crate::constant::{cache_domain, pagination};
use crate::error::{AppError, AppErrorCode};
use crate::model::{
    ProductDetail, ProductFilter, ProductImageModel, ProductListPage, ProductModel, VariantModel,
};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const KEY_ALL: &str = "all";

pub(crate) fn key_detail(id_: u64) -> String {
    format!("detail:{}", id_)
}
fn key_related(category_id: u64) -> String {
    format!("related:{}", category_id)
}

fn not_found(id_: u64) -> AppError {
    AppError::new(AppErrorCode::NotFound, format!("product:{}", id_))
}

pub struct ProductService {
    repo: AppTableRepo<ProductModel>,
    variants: AppTableRepo<VariantModel>,
    images: AppTableRepo<ProductImageModel>,
    category: CategoryService,
    cache: AppCacheNamespace,
    variant_cache: AppCacheNamespace,
    ttl_list: u32,
    ttl_detail: u32,
    logctx: Arc<AppLogContext>,
}

impl ProductService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        let ttl_cfg = shr_state.cache_ttl();
        Self {
            repo: shr_state.repo(),
            variants: shr_state.repo(),
            images: shr_state.repo(),
            category: CategoryService::new(shr_state),
            cache: shr_state.cache_ns(cache_domain::PRODUCT),
            variant_cache: shr_state.cache_ns(cache_domain::VARIANT),
            ttl_list: ttl_cfg.product_list,
            ttl_detail: ttl_cfg.product_detail,
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn all(&self) -> DefaultResult<Vec<ProductModel>, AppError> {
        self.cache
            .read_through(KEY_ALL, self.ttl_list, || self.repo.all(None))
            .await
    }

    /// The selected category matches together with its direct children,
    /// zero means no category restriction.
    async fn allowed_categories(&self, cat_id: u64) -> DefaultResult<Option<HashSet<u64>>, AppError> {
        if cat_id == 0 {
            return Ok(None);
        }
        let node = self
            .category
            .find_category_by_id(cat_id)
            .await?
            .ok_or_else(|| AppError::new(AppErrorCode::NotFound, format!("category:{}", cat_id)))?;
        let mut out = HashSet::from([node.id]);
        out.extend(node.children.iter().map(|c| c.id));
        Ok(Some(out))
    }

    pub async fn get_filtered_products(
        &self,
        filter: ProductFilter,
    ) -> DefaultResult<ProductListPage, AppError> {
        let allowed = self.allowed_categories(filter.cat_id).await?;
        let cat_names = self
            .category
            .category_map()
            .await?
            .into_iter()
            .map(|(id_, c)| (id_, c.name))
            .collect::<HashMap<_, _>>();
        let products = self.all().await?;
        let matched = filter.apply(products, allowed.as_ref(), &cat_names);
        let per_page = if filter.per_page == 0 {
            pagination::DEFAULT_PRODUCTS_PER_PAGE
        } else {
            filter.per_page
        };
        let pg = AppPagination::new(filter.page, per_page, matched.len());
        let categories = self.category.build_hierarchy().await?;
        Ok(ProductListPage {
            products: pg.slice(&matched).to_vec(),
            current_page: pg.current_page,
            total_pages: pg.total_pages,
            per_page,
            total_results: matched.len(),
            cat_id: filter.cat_id,
            categories,
        })
    }

    async fn related(&self, product: &ProductModel) -> DefaultResult<Vec<ProductModel>, AppError> {
        let cat_id = match product.category_id {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };
        let key = key_related(cat_id);
        let same_cat = self
            .cache
            .read_through(key.as_str(), self.ttl_detail, || {
                self.repo.by_category(cat_id, None)
            })
            .await?;
        Ok(same_cat.into_iter().filter(|p| p.id != product.id).collect())
    }

    async fn load_detail(&self, id_: u64) -> DefaultResult<Option<ProductDetail>, AppError> {
        let product = match self.repo.one(id_, None).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        let variants = self.variants.by_product(id_, None).await?;
        let images = self.images.by_product(id_, None).await?;
        let related = self.related(&product).await?;
        Ok(Some(ProductDetail {
            product,
            variants,
            images,
            related,
        }))
    }

    pub async fn get_product_detail(&self, id_: u64) -> DefaultResult<ProductDetail, AppError> {
        let key = key_detail(id_);
        self.cache
            .read_through_opt(key.as_str(), self.ttl_detail, || self.load_detail(id_))
            .await?
            .ok_or_else(|| not_found(id_))
    }

    pub async fn add(&self, item: ProductModel) -> DefaultResult<ProductModel, AppError> {
        let saved = self.repo.add(item, None).await?;
        self.invalidate(saved.id, &[saved.category_id]).await;
        Ok(saved)
    }

    pub async fn update(&self, item: ProductModel) -> DefaultResult<ProductModel, AppError> {
        let old = self
            .repo
            .one(item.id, None)
            .await?
            .ok_or_else(|| not_found(item.id))?;
        let saved = self.repo.edit(item, None).await?;
        self.invalidate(saved.id, &[old.category_id, saved.category_id])
            .await;
        Ok(saved)
    }

    /// variants and images of the product are removed as well
    pub async fn delete(&self, id_: u64) -> DefaultResult<(), AppError> {
        let old = self.repo.one(id_, None).await?.ok_or_else(|| not_found(id_))?;
        let removed_variants = self.variants.by_product(id_, None).await?;
        let _num = self.variants.delete_by("product_id", id_, None).await?;
        let _num = self.images.delete_by("product_id", id_, None).await?;
        let _num = self.repo.delete(id_, None).await?;
        self.invalidate(id_, &[old.category_id]).await;
        let mut keys = vec![format!("product:{}", id_)];
        keys.extend(removed_variants.iter().map(|v| format!("variant:{}", v.id)));
        let result = self.variant_cache.invalidate(&keys, &[]).await;
        report_invalidation(&self.logctx, self.variant_cache.domain(), result);
        Ok(())
    }

    async fn invalidate(&self, id_: u64, categories: &[Option<u64>]) {
        let mut keys = vec![KEY_ALL.to_string(), key_detail(id_)];
        keys.extend(categories.iter().flatten().map(|c| key_related(*c)));
        let result = self.cache.invalidate(&keys, &[]).await;
        report_invalidation(&self.logctx, self.cache.domain(), result);
    }
} // end of impl ProductService
