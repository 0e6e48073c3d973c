use std::result::Result as DefaultResult;

use super::{new_row, AppTableEntity, AppTableRepo, RowReader};
use crate::adapter::datastore::{AppDStoreRow, AppDStoreTxn};
use crate::constant::tables;
use crate::error::AppError;
use crate::model::{CartLineModel, CartModel};

impl AppTableEntity for CartModel {
    const TABLE: &'static str = tables::CARTS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("total_price", self.total_price.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            user_id: r.u64("user_id")?,
            total_price: r.decimal("total_price")?,
        })
    }
}

impl AppTableEntity for CartLineModel {
    const TABLE: &'static str = tables::CART_ITEMS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("cart_id", self.cart_id.into()),
            ("product_id", self.product_id.into()),
            ("variant_id", self.variant_id.into()),
            ("quantity", self.quantity.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            cart_id: r.u64("cart_id")?,
            product_id: r.u64("product_id")?,
            variant_id: r.u64("variant_id")?,
            quantity: r.u32("quantity")?,
        })
    }
}

impl AppTableRepo<CartModel> {
    pub async fn by_user(
        &self,
        user_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<CartModel>, AppError> {
        self.one_by("user_id", user_id, txn).await
    }
}

impl AppTableRepo<CartLineModel> {
    pub async fn by_cart(
        &self,
        cart_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<CartLineModel>, AppError> {
        self.some("cart_id", cart_id, None, txn).await
    }

    pub async fn clear_cart(
        &self,
        cart_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        self.delete_by("cart_id", cart_id, txn).await
    }
}
