use std::result::Result as DefaultResult;

use super::{new_row, AppTableEntity, AppTableRepo, RowReader};
use crate::adapter::datastore::{AppDStoreRow, AppDStoreTxn};
use crate::constant::tables;
use crate::error::AppError;
use crate::model::{OrderAddressModel, OrderDetailModel, OrderModel};

impl AppTableEntity for OrderModel {
    const TABLE: &'static str = tables::ORDERS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("total_price", self.total_price.into()),
            ("address_id", self.address_id.into()),
            ("coupon_id", self.coupon_id.into()),
            ("paying_method", self.paying_method.into()),
            ("shipping_method", self.shipping_method.into()),
            ("status", self.status.label().into()),
            ("created_at", self.created_at.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            user_id: r.u64("user_id")?,
            total_price: r.decimal("total_price")?,
            address_id: r.u64("address_id")?,
            coupon_id: r.opt_u64("coupon_id")?,
            paying_method: r.string("paying_method")?,
            shipping_method: r.string("shipping_method")?,
            status: r.parse("status")?,
            created_at: r.datetime("created_at")?,
        })
    }
}

impl AppTableEntity for OrderDetailModel {
    const TABLE: &'static str = tables::ORDER_DETAILS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("order_id", self.order_id.into()),
            ("product_id", self.product_id.into()),
            ("variant_id", self.variant_id.into()),
            ("quantity", self.quantity.into()),
            ("price", self.price.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            order_id: r.u64("order_id")?,
            product_id: r.u64("product_id")?,
            variant_id: r.u64("variant_id")?,
            quantity: r.u32("quantity")?,
            price: r.decimal("price")?,
        })
    }
}

impl AppTableEntity for OrderAddressModel {
    const TABLE: &'static str = tables::ORDER_ADDRESSES;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("full_name", self.full_name.into()),
            ("city", self.city.into()),
            ("district", self.district.into()),
            ("ward", self.ward.into()),
            ("address", self.address.into()),
            ("phone_number", self.phone_number.into()),
            ("note", self.note.into()),
            ("state", self.state.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            user_id: r.u64("user_id")?,
            full_name: r.string("full_name")?,
            city: r.string("city")?,
            district: r.string("district")?,
            ward: r.string("ward")?,
            address: r.string("address")?,
            phone_number: r.string("phone_number")?,
            note: r.opt_string("note")?,
            state: r.opt_string("state")?,
        })
    }
}

impl AppTableRepo<OrderModel> {
    pub async fn by_user(
        &self,
        user_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<OrderModel>, AppError> {
        self.some("user_id", user_id, None, txn).await
    }
}

impl AppTableRepo<OrderDetailModel> {
    pub async fn by_order(
        &self,
        order_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<OrderDetailModel>, AppError> {
        self.some("order_id", order_id, None, txn).await
    }
}
