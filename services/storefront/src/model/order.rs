use std::result::Result as DefaultResult;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Delivering => "Delivering",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;
    fn from_str(s: &str) -> DefaultResult<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Delivering" => Ok(Self::Delivering),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            _others => Err(AppError::new(
                AppErrorCode::InvalidState,
                format!("order-status:{}", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderModel {
    pub id: u64,
    pub user_id: u64,
    /// amount after coupon discount
    pub total_price: Decimal,
    pub address_id: u64,
    pub coupon_id: Option<u64>,
    pub paying_method: String,
    pub shipping_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailModel {
    pub id: u64,
    pub order_id: u64,
    pub product_id: u64,
    pub variant_id: u64,
    pub quantity: u32,
    // line price at the time the order was placed, quantity times unit
    // price, never updated afterwards
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAddressModel {
    pub id: u64,
    pub user_id: u64,
    pub full_name: String,
    pub city: String,
    pub district: String,
    pub ward: String,
    pub address: String,
    pub phone_number: String,
    pub note: Option<String>,
    pub state: Option<String>,
}

/// shipping address of a new order
#[derive(Debug, Clone)]
pub enum OrderAddressReq {
    /// address saved by the same user previously
    Saved(u64),
    Inline {
        full_name: String,
        city: String,
        district: String,
        ward: String,
        address: String,
        phone_number: String,
        note: Option<String>,
        state: Option<String>,
    },
}

impl OrderAddressReq {
    pub(crate) fn into_model(self, user_id: u64) -> Option<OrderAddressModel> {
        match self {
            Self::Saved(_id) => None,
            Self::Inline {
                full_name,
                city,
                district,
                ward,
                address,
                phone_number,
                note,
                state,
            } => Some(OrderAddressModel {
                id: 0,
                user_id,
                full_name,
                city,
                district,
                ward,
                address,
                phone_number,
                note,
                state,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderReq {
    pub address: OrderAddressReq,
    pub coupon_code: Option<String>,
    pub paying_method: String,
    pub shipping_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub id: u64,
    pub product_id: u64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order: OrderModel,
    pub address: Option<OrderAddressModel>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: u64,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub item_count: usize,
    pub created_at: DateTime<Utc>,
}
