use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CategoryNode;
use crate::constant::pagination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductModel {
    pub id: u64,
    pub name: String,
    pub description: String,
    // listing price, each variant carries its own selling price
    pub price: Decimal,
    pub thumb_url: Option<String>,
    pub brand_id: Option<u64>,
    pub category_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantModel {
    pub id: u64,
    pub product_id: u64,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub image_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImageModel {
    pub id: u64,
    pub product_id: u64,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub variants: Vec<VariantModel>,
    pub images: Vec<ProductImageModel>,
    pub related: Vec<ProductModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProductSortKey {
    #[default]
    Unsorted,
    PriceAsc,
    PriceDesc,
}

impl ProductSortKey {
    /// `min` sorts by ascending price, `max` by descending price, anything
    /// else keeps the stored order
    pub fn from_label(label: &str) -> Self {
        match label {
            "min" => Self::PriceAsc,
            "max" => Self::PriceDesc,
            _others => Self::Unsorted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub page: u32,
    pub per_page: u32,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub sort: ProductSortKey,
    pub query: String,
    /// zero means all categories
    pub cat_id: u64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: pagination::DEFAULT_PRODUCTS_PER_PAGE,
            min: None,
            max: None,
            sort: ProductSortKey::Unsorted,
            query: String::new(),
            cat_id: 0,
        }
    }
}

impl ProductFilter {
    /// Keep products which are in price range and match the search query
    /// by product name or category name, the comparison is case-insensitive.
    /// `allowed_cats` restricts the categories when it is given.
    pub fn apply(
        &self,
        products: Vec<ProductModel>,
        allowed_cats: Option<&HashSet<u64>>,
        cat_names: &HashMap<u64, String>,
    ) -> Vec<ProductModel> {
        let query = self.query.to_lowercase();
        let mut out = products
            .into_iter()
            .filter(|p| match allowed_cats {
                Some(cats) => p.category_id.map_or(false, |c| cats.contains(&c)),
                None => true,
            })
            .filter(|p| self.min.map_or(true, |m| p.price >= m))
            .filter(|p| self.max.map_or(true, |m| p.price <= m))
            .filter(|p| {
                if query.is_empty() || p.name.to_lowercase().contains(query.as_str()) {
                    return true;
                }
                p.category_id
                    .and_then(|c| cat_names.get(&c))
                    .map_or(false, |n| n.to_lowercase().contains(query.as_str()))
            })
            .collect::<Vec<_>>();
        match self.sort {
            ProductSortKey::PriceAsc => out.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSortKey::PriceDesc => out.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSortKey::Unsorted => {}
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListPage {
    pub products: Vec<ProductModel>,
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub total_results: usize,
    pub cat_id: u64,
    pub categories: Vec<CategoryNode>,
}
