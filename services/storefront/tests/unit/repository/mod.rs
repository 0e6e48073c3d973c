use std::collections::HashMap;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use storefront::adapter::datastore::AppDStoreValue;
use storefront::constant::tables;
use storefront::error::AppErrorCode;
use storefront::model::{
    CartLineModel, CouponDiscountType, CouponModel, OrderModel, OrderStatus, VariantModel,
};

use crate::ut_setup_share_state;

fn ut_coupon(code: &str) -> CouponModel {
    let now = Utc::now();
    CouponModel {
        id: 0,
        code: code.to_string(),
        discount_type: CouponDiscountType::FixedAmount,
        discount_value: Decimal::new(500, 2),
        min_purchase: Decimal::ZERO,
        start_date: now - Duration::days(2),
        end_date: now + Duration::days(2),
        max_uses: None,
        uses_count: 0,
        active: true,
    }
}

#[tokio::test]
async fn saved_entity_readable() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let repo = shr_state.repo::<CouponModel>();
    let saved = repo.add(ut_coupon("WELCOME5"), None).await.unwrap();
    assert_eq!(saved.id, 1);
    let found = repo.by_code("WELCOME5", None).await.unwrap().unwrap();
    assert_eq!(found, saved);
    assert!(repo.by_code("welcome5", None).await.unwrap().is_none());
    let order = OrderModel {
        id: 0,
        user_id: 4,
        total_price: Decimal::new(12345, 2),
        address_id: 2,
        coupon_id: None,
        paying_method: "cod".to_string(),
        shipping_method: "express".to_string(),
        status: OrderStatus::Delivering,
        created_at: Utc::now(),
    };
    let repo = shr_state.repo::<OrderModel>();
    let saved = repo.add(order, None).await.unwrap();
    let found = repo.by_user(4, None).await.unwrap();
    assert_eq!(found, vec![saved]);
}

#[tokio::test]
async fn increment_coupon_uses() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let repo = shr_state.repo::<CouponModel>();
    let saved = repo.add(ut_coupon("TWICE"), None).await.unwrap();
    let _ = repo.increment_uses(saved.id, None).await.unwrap();
    let updated = repo.increment_uses(saved.id, None).await.unwrap();
    assert_eq!(updated.uses_count, 2);
    let err = repo.increment_uses(999, None).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn edit_missing_entity() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let repo = shr_state.repo::<VariantModel>();
    let variant = VariantModel {
        id: 31,
        product_id: 2,
        name: "XL".to_string(),
        color: None,
        size: Some("XL".to_string()),
        price: Decimal::new(30, 0),
        stock: 3,
        image_id: None,
    };
    let err = repo.edit(variant, None).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn clear_cart_lines() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let repo = shr_state.repo::<CartLineModel>();
    for (cart_id, variant_id) in [(1u64, 11u64), (2, 12), (1, 13)] {
        let line = CartLineModel {
            id: 0,
            cart_id,
            product_id: 7,
            variant_id,
            quantity: 1,
        };
        let _saved = repo.add(line, None).await.unwrap();
    }
    let num = repo.clear_cart(1, None).await.unwrap();
    assert_eq!(num, 2);
    assert!(repo.by_cart(1, None).await.unwrap().is_empty());
    assert_eq!(repo.by_cart(2, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn report_corrupted_row() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let row = HashMap::from([
        ("product_id".to_string(), AppDStoreValue::UInt(2)),
        ("name".to_string(), AppDStoreValue::from("broken")),
        ("price".to_string(), AppDStoreValue::from("not-a-price")),
        ("stock".to_string(), AppDStoreValue::Int(-4)),
    ]);
    let dstore = shr_state.datastore();
    let _saved = dstore
        .insert(tables::PRODUCT_VARIANTS, row, None)
        .await
        .unwrap();
    let repo = shr_state.repo::<VariantModel>();
    let err = repo.one(1, None).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::DataCorruption);
    let detail = err.detail.unwrap();
    assert!(detail.contains(tables::PRODUCT_VARIANTS));
}
