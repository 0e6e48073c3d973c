use std::result::Result as DefaultResult;

use super::{new_row, AppTableEntity, AppTableRepo, RowReader};
use crate::adapter::datastore::{AppDStoreRow, AppDStoreTxn};
use crate::constant::tables;
use crate::error::{AppError, AppErrorCode};
use crate::model::CouponModel;

impl AppTableEntity for CouponModel {
    const TABLE: &'static str = tables::COUPONS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("code", self.code.into()),
            ("discount_type", self.discount_type.label().into()),
            ("discount_value", self.discount_value.into()),
            ("min_purchase", self.min_purchase.into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("max_uses", self.max_uses.into()),
            ("uses_count", self.uses_count.into()),
            ("active", self.active.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            code: r.string("code")?,
            discount_type: r.parse("discount_type")?,
            discount_value: r.decimal("discount_value")?,
            min_purchase: r.decimal("min_purchase")?,
            start_date: r.datetime("start_date")?,
            end_date: r.datetime("end_date")?,
            max_uses: r.opt_u32("max_uses")?,
            uses_count: r.u32("uses_count")?,
            active: r.bool("active")?,
        })
    }
}

impl AppTableRepo<CouponModel> {
    pub async fn by_code(
        &self,
        code: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<CouponModel>, AppError> {
        self.one_by("code", code, txn).await
    }

    /// Read-modify-write of the usage counter. Within a transaction the
    /// coupon row stays locked until the transaction ends.
    pub async fn increment_uses(
        &self,
        id_: u64,
        mut txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<CouponModel, AppError> {
        let mut saved = self
            .one(id_, txn.as_deref_mut())
            .await?
            .ok_or_else(|| AppError::new(AppErrorCode::NotFound, format!("coupon:{}", id_)))?;
        saved.uses_count = saved.uses_count.saturating_add(1);
        self.edit(saved, txn).await
    }
}
