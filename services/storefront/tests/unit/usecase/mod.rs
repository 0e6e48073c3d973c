mod cart;
mod category;
mod checkout;
mod order;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use storefront::model::{
    CategoryModel, CouponDiscountType, CouponModel, OrderAddressReq, ProductModel, UserModel,
    UserRole, VariantModel,
};
use storefront::AppSharedState;

pub(crate) async fn ut_seed_user(shr_state: &AppSharedState, username: &str, role: UserRole) -> UserModel {
    let user = UserModel {
        id: 0,
        username: username.to_string(),
        email: format!("{}@example.org", username),
        role,
    };
    shr_state.repo::<UserModel>().add(user, None).await.unwrap()
}

pub(crate) async fn ut_seed_category(
    shr_state: &AppSharedState,
    name: &str,
    parent: Option<u64>,
) -> CategoryModel {
    let item = CategoryModel {
        id: 0,
        name: name.to_string(),
        parent,
    };
    shr_state.repo::<CategoryModel>().add(item, None).await.unwrap()
}

pub(crate) async fn ut_seed_product(
    shr_state: &AppSharedState,
    name: &str,
    price: i64,
    category_id: Option<u64>,
) -> ProductModel {
    let item = ProductModel {
        id: 0,
        name: name.to_string(),
        description: format!("{} description", name),
        price: Decimal::new(price, 0),
        thumb_url: Some(format!("/img/{}.png", name.to_lowercase())),
        brand_id: None,
        category_id,
        created_at: Utc::now(),
    };
    shr_state.repo::<ProductModel>().add(item, None).await.unwrap()
}

pub(crate) async fn ut_seed_variant(
    shr_state: &AppSharedState,
    product_id: u64,
    name: &str,
    price: i64,
    stock: u32,
) -> VariantModel {
    let item = VariantModel {
        id: 0,
        product_id,
        name: name.to_string(),
        color: None,
        size: Some(name.to_string()),
        price: Decimal::new(price, 0),
        stock,
        image_id: None,
    };
    shr_state.repo::<VariantModel>().add(item, None).await.unwrap()
}

pub(crate) fn ut_coupon_model(
    code: &str,
    discount_type: CouponDiscountType,
    value: i64,
    max_uses: Option<u32>,
    uses_count: u32,
) -> CouponModel {
    let now = Utc::now();
    CouponModel {
        id: 0,
        code: code.to_string(),
        discount_type,
        discount_value: Decimal::new(value, 0),
        min_purchase: Decimal::ZERO,
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(30),
        max_uses,
        uses_count,
        active: true,
    }
}

pub(crate) async fn ut_seed_coupon(shr_state: &AppSharedState, item: CouponModel) -> CouponModel {
    shr_state.repo::<CouponModel>().add(item, None).await.unwrap()
}

pub(crate) fn ut_inline_address() -> OrderAddressReq {
    OrderAddressReq::Inline {
        full_name: "Lin Mei".to_string(),
        city: "Taipei".to_string(),
        district: "Da-an".to_string(),
        ward: "Ward 5".to_string(),
        address: "No. 12, Lane 3".to_string(),
        phone_number: "0912345678".to_string(),
        note: None,
        state: None,
    }
}
