use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductModel, VariantModel};

/// one cart per user, created on first access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartModel {
    pub id: u64,
    pub user_id: u64,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineModel {
    pub id: u64,
    pub cart_id: u64,
    pub product_id: u64,
    pub variant_id: u64,
    pub quantity: u32,
}

impl CartLineModel {
    pub fn is_item(&self, product_id: u64, variant_id: u64) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

/// cart line joined with live product and variant data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: u64,
    pub product_name: String,
    pub thumb_url: Option<String>,
    pub variant_id: u64,
    pub variant_name: String,
    pub unit_price: Decimal,
    pub stock: u32,
    pub quantity: u32,
    pub line_price: Decimal,
}

impl CartLineView {
    pub(crate) fn new(line: &CartLineModel, product: &ProductModel, variant: &VariantModel) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            thumb_url: product.thumb_url.clone(),
            variant_id: variant.id,
            variant_name: variant.name.clone(),
            unit_price: variant.price,
            stock: variant.stock,
            quantity: line.quantity,
            line_price: variant.price * Decimal::from(line.quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedCart {
    pub lines: Vec<CartLineView>,
    pub total_price: Decimal,
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemUpdated {
    pub updated_price: Decimal,
    pub updated_quantity: u32,
    pub change_in_price: Decimal,
}
