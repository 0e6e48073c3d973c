use rust_decimal::Decimal;

use storefront::error::AppErrorCode;
use storefront::model::{CartItemUpdated, UserRole, VariantModel};
use storefront::usecase::CartService;

use super::{ut_seed_product, ut_seed_user, ut_seed_variant};
use crate::ut_setup_share_state;

#[tokio::test]
async fn add_merge_existing_line() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "kai", UserRole::Customer).await;
    let product = ut_seed_product(&shr_state, "Backpack", 30, None).await;
    let variant = ut_seed_variant(&shr_state, product.id, "grey", 35, 6).await;
    let cart_svc = CartService::new(&shr_state);
    let first = cart_svc
        .add_product_to_cart(user.id, product.id, variant.id, 2)
        .await
        .unwrap();
    let merged = cart_svc
        .add_product_to_cart(user.id, product.id, variant.id, 1)
        .await
        .unwrap();
    assert_eq!(first.id, merged.id);
    assert_eq!(merged.quantity, 3);
    let lines = cart_svc.all(user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    // running total follows the variant price, not the product price
    let cart = cart_svc.get_or_create_cart(user.id).await.unwrap();
    assert_eq!(cart.total_price, Decimal::new(105, 0));
    let again = cart_svc.get_or_create_cart(user.id).await.unwrap();
    assert_eq!(cart.id, again.id);
}

#[tokio::test]
async fn add_reject_invalid_request() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "noa", UserRole::Customer).await;
    let tent = ut_seed_product(&shr_state, "Tent", 90, None).await;
    let stove = ut_seed_product(&shr_state, "Stove", 25, None).await;
    let v_tent = ut_seed_variant(&shr_state, tent.id, "2p", 90, 3).await;
    let cart_svc = CartService::new(&shr_state);

    let err = cart_svc
        .add_product_to_cart(user.id, tent.id, v_tent.id, 0)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidInput);
    let err = cart_svc
        .add_product_to_cart(user.id, tent.id, v_tent.id, 4)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InsufficientStock);
    // variant belongs to another product
    let err = cart_svc
        .add_product_to_cart(user.id, stove.id, v_tent.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
    let err = cart_svc
        .add_product_to_cart(9876, tent.id, v_tent.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);

    let _line = cart_svc
        .add_product_to_cart(user.id, tent.id, v_tent.id, 2)
        .await
        .unwrap();
    let err = cart_svc
        .add_product_to_cart(user.id, tent.id, v_tent.id, 2)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InsufficientStock);
    let lines = cart_svc.all(user.id).await.unwrap();
    assert_eq!(lines[0].quantity, 2);
}

#[tokio::test]
async fn formatted_cart_pages() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "ema", UserRole::Customer).await;
    let cart_svc = CartService::new(&shr_state);
    for idx in 1..=7i64 {
        let name = format!("Sticker{}", idx);
        let p = ut_seed_product(&shr_state, name.as_str(), idx, None).await;
        let v = ut_seed_variant(&shr_state, p.id, "std", idx, 10).await;
        let _line = cart_svc.add_product_to_cart(user.id, p.id, v.id, 1).await.unwrap();
    }
    let fmt_cart = cart_svc.get_formatted_cart(user.id, 1, 0).await.unwrap();
    assert_eq!(fmt_cart.lines.len(), 5);
    assert_eq!(fmt_cart.total_pages, 2);
    assert_eq!(fmt_cart.current_page, 1);
    // total covers every line, not only the current page
    assert_eq!(fmt_cart.total_price, Decimal::new(28, 0));
    assert_eq!(fmt_cart.lines[0].product_name.as_str(), "Sticker1");
    assert_eq!(fmt_cart.lines[0].thumb_url.as_deref(), Some("/img/sticker1.png"));

    let fmt_cart = cart_svc.get_formatted_cart(user.id, 2, 5).await.unwrap();
    assert_eq!(fmt_cart.lines.len(), 2);
    let fmt_cart = cart_svc.get_formatted_cart(user.id, 9, 5).await.unwrap();
    assert_eq!(fmt_cart.current_page, 2);
    assert_eq!(fmt_cart.lines.len(), 2);
}

#[tokio::test]
async fn formatted_cart_skip_dangling_line() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "aki", UserRole::Customer).await;
    let cart_svc = CartService::new(&shr_state);
    let cup = ut_seed_product(&shr_state, "Cup", 8, None).await;
    let plate = ut_seed_product(&shr_state, "Plate", 11, None).await;
    let v_cup = ut_seed_variant(&shr_state, cup.id, "white", 8, 10).await;
    let v_plate = ut_seed_variant(&shr_state, plate.id, "white", 11, 10).await;
    let _line = cart_svc.add_product_to_cart(user.id, cup.id, v_cup.id, 1).await.unwrap();
    let _line = cart_svc.add_product_to_cart(user.id, plate.id, v_plate.id, 1).await.unwrap();
    let num = shr_state.repo::<VariantModel>().delete(v_plate.id, None).await.unwrap();
    assert_eq!(num, 1);
    let fmt_cart = cart_svc.get_formatted_cart(user.id, 1, 5).await.unwrap();
    assert_eq!(fmt_cart.lines.len(), 1);
    assert_eq!(fmt_cart.lines[0].product_id, cup.id);
    assert_eq!(fmt_cart.total_price, Decimal::new(8, 0));
}

#[tokio::test]
async fn update_item_report_price_change() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "rio", UserRole::Customer).await;
    let product = ut_seed_product(&shr_state, "Scarf", 20, None).await;
    let variant = ut_seed_variant(&shr_state, product.id, "red", 20, 8).await;
    let cart_svc = CartService::new(&shr_state);
    let _line = cart_svc
        .add_product_to_cart(user.id, product.id, variant.id, 2)
        .await
        .unwrap();
    let updated = cart_svc
        .update_cart_item(user.id, product.id, variant.id, 5)
        .await
        .unwrap();
    let expect = CartItemUpdated {
        updated_price: Decimal::new(100, 0),
        updated_quantity: 5,
        change_in_price: Decimal::new(60, 0),
    };
    assert_eq!(updated, expect);
    let updated = cart_svc
        .update_cart_item(user.id, product.id, variant.id, 1)
        .await
        .unwrap();
    assert_eq!(updated.change_in_price, Decimal::new(-80, 0));
    let cart = cart_svc.get_or_create_cart(user.id).await.unwrap();
    assert_eq!(cart.total_price, Decimal::new(20, 0));

    let err = cart_svc
        .update_cart_item(user.id, product.id, variant.id, 9)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InsufficientStock);
    let other = ut_seed_variant(&shr_state, product.id, "blue", 20, 8).await;
    let err = cart_svc
        .update_cart_item(user.id, product.id, other.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn remove_item_return_price() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "tomo", UserRole::Customer).await;
    let product = ut_seed_product(&shr_state, "Gloves", 15, None).await;
    let v_s = ut_seed_variant(&shr_state, product.id, "S", 15, 8).await;
    let v_l = ut_seed_variant(&shr_state, product.id, "L", 17, 8).await;
    let cart_svc = CartService::new(&shr_state);
    let _line = cart_svc.add_product_to_cart(user.id, product.id, v_s.id, 3).await.unwrap();
    let _line = cart_svc.add_product_to_cart(user.id, product.id, v_l.id, 1).await.unwrap();
    let removed = cart_svc
        .remove_product_from_cart(user.id, product.id, v_s.id)
        .await
        .unwrap();
    assert_eq!(removed, Decimal::new(45, 0));
    let lines = cart_svc.all(user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].variant_id, v_l.id);
    let cart = cart_svc.get_or_create_cart(user.id).await.unwrap();
    assert_eq!(cart.total_price, Decimal::new(17, 0));
    let err = cart_svc
        .remove_product_from_cart(user.id, product.id, v_s.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}
