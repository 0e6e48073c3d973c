use std::result::Result as DefaultResult;

use super::{new_row, AppTableEntity, AppTableRepo, RowReader};
use crate::adapter::datastore::{AppDStoreRow, AppDStoreTxn};
use crate::constant::tables;
use crate::error::AppError;
use crate::model::{
    BrandModel, CategoryModel, ProductImageModel, ProductModel, ProductPromotionModel,
    PromotionModel, ReviewModel, VariantModel,
};

impl AppTableEntity for ProductModel {
    const TABLE: &'static str = tables::PRODUCTS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("name", self.name.into()),
            ("description", self.description.into()),
            ("price", self.price.into()),
            ("thumb_url", self.thumb_url.into()),
            ("brand_id", self.brand_id.into()),
            ("category_id", self.category_id.into()),
            ("created_at", self.created_at.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            name: r.string("name")?,
            description: r.string("description")?,
            price: r.decimal("price")?,
            thumb_url: r.opt_string("thumb_url")?,
            brand_id: r.opt_u64("brand_id")?,
            category_id: r.opt_u64("category_id")?,
            created_at: r.datetime("created_at")?,
        })
    }
}

impl AppTableEntity for VariantModel {
    const TABLE: &'static str = tables::PRODUCT_VARIANTS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("product_id", self.product_id.into()),
            ("name", self.name.into()),
            ("color", self.color.into()),
            ("size", self.size.into()),
            ("price", self.price.into()),
            ("stock", self.stock.into()),
            ("image_id", self.image_id.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            product_id: r.u64("product_id")?,
            name: r.string("name")?,
            color: r.opt_string("color")?,
            size: r.opt_string("size")?,
            price: r.decimal("price")?,
            stock: r.u32("stock")?,
            image_id: r.opt_u64("image_id")?,
        })
    }
}

impl AppTableEntity for ProductImageModel {
    const TABLE: &'static str = tables::PRODUCT_IMAGES;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("product_id", self.product_id.into()),
            ("image_url", self.image_url.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            product_id: r.u64("product_id")?,
            image_url: r.string("image_url")?,
        })
    }
}

impl AppTableEntity for CategoryModel {
    const TABLE: &'static str = tables::CATEGORIES;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("name", self.name.into()),
            ("parent", self.parent.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            name: r.string("name")?,
            parent: r.opt_u64("parent")?,
        })
    }
}

impl AppTableEntity for BrandModel {
    const TABLE: &'static str = tables::BRANDS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("name", self.name.into()),
            ("description", self.description.into()),
            ("logo_url", self.logo_url.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            name: r.string("name")?,
            description: r.string("description")?,
            logo_url: r.opt_string("logo_url")?,
        })
    }
}

impl AppTableEntity for PromotionModel {
    const TABLE: &'static str = tables::PROMOTIONS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("name", self.name.into()),
            ("description", self.description.into()),
            ("discount_percent", self.discount_percent.into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            name: r.string("name")?,
            description: r.string("description")?,
            discount_percent: r.decimal("discount_percent")?,
            start_date: r.datetime("start_date")?,
            end_date: r.datetime("end_date")?,
        })
    }
}

impl AppTableEntity for ProductPromotionModel {
    const TABLE: &'static str = tables::PRODUCT_PROMOTIONS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("product_id", self.product_id.into()),
            ("promotion_id", self.promotion_id.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            product_id: r.u64("product_id")?,
            promotion_id: r.u64("promotion_id")?,
        })
    }
}

impl AppTableEntity for ReviewModel {
    const TABLE: &'static str = tables::PRODUCT_REVIEWS;

    fn id(&self) -> u64 {
        self.id
    }

    fn into_row(self) -> AppDStoreRow {
        new_row([
            ("id", self.id.into()),
            ("product_id", self.product_id.into()),
            ("user_id", self.user_id.into()),
            ("rating", self.rating.into()),
            ("comment", self.comment.into()),
            ("created_at", self.created_at.into()),
        ])
    }

    fn try_from_row(row: AppDStoreRow) -> DefaultResult<Self, AppError> {
        let mut r = RowReader::new(Self::TABLE, row);
        Ok(Self {
            id: r.u64("id")?,
            product_id: r.u64("product_id")?,
            user_id: r.u64("user_id")?,
            rating: r.u8("rating")?,
            comment: r.string("comment")?,
            created_at: r.datetime("created_at")?,
        })
    }
}

impl AppTableRepo<VariantModel> {
    pub async fn by_product(
        &self,
        product_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<VariantModel>, AppError> {
        self.some("product_id", product_id, None, txn).await
    }
}

impl AppTableRepo<ProductImageModel> {
    pub async fn by_product(
        &self,
        product_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<ProductImageModel>, AppError> {
        self.some("product_id", product_id, None, txn).await
    }
}

impl AppTableRepo<ProductModel> {
    pub async fn by_category(
        &self,
        category_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<ProductModel>, AppError> {
        self.some("category_id", category_id, None, txn).await
    }
}

impl AppTableRepo<CategoryModel> {
    pub async fn children_of(
        &self,
        parent: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<CategoryModel>, AppError> {
        self.some("parent", parent, None, txn).await
    }
}

impl AppTableRepo<BrandModel> {
    pub async fn by_name(
        &self,
        name: &str,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Option<BrandModel>, AppError> {
        self.one_by("name", name, txn).await
    }
}

impl AppTableRepo<ProductPromotionModel> {
    pub async fn by_product(
        &self,
        product_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<ProductPromotionModel>, AppError> {
        self.some("product_id", product_id, None, txn).await
    }

    pub async fn by_promotion(
        &self,
        promotion_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<ProductPromotionModel>, AppError> {
        self.some("promotion_id", promotion_id, None, txn).await
    }
}

impl AppTableRepo<ReviewModel> {
    pub async fn by_product(
        &self,
        product_id: u64,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<ReviewModel>, AppError> {
        self.some("product_id", product_id, None, txn).await
    }
}
