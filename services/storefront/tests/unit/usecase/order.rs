use rust_decimal::Decimal;

use storefront::error::AppErrorCode;
use storefront::model::{CreateOrderReq, OrderModel, OrderStatus, ProductModel, UserModel, UserRole};
use storefront::usecase::{
    CartService, CreateOrderUseCase, ListUserOrdersUseCase, RetrieveOrderUseCase,
    UpdateOrderStatusUseCase,
};
use storefront::AppSharedState;

use super::{ut_inline_address, ut_seed_product, ut_seed_user, ut_seed_variant};
use crate::ut_setup_share_state;

async fn ut_place_order(shr_state: &AppSharedState, user: &UserModel, items: &[(&str, i64, u32)]) -> OrderModel {
    let cart_svc = CartService::new(shr_state);
    for (name, price, qty) in items {
        let p = ut_seed_product(shr_state, name, *price, None).await;
        let v = ut_seed_variant(shr_state, p.id, "std", *price, 50).await;
        let _line = cart_svc.add_product_to_cart(user.id, p.id, v.id, *qty).await.unwrap();
    }
    let req = CreateOrderReq {
        address: ut_inline_address(),
        coupon_code: None,
        paying_method: "card".to_string(),
        shipping_method: "express".to_string(),
    };
    let uc = CreateOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    uc.execute(req).await.unwrap()
}

#[tokio::test]
async fn retrieve_own_order() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "mina", UserRole::Customer).await;
    let other = ut_seed_user(&shr_state, "jun", UserRole::Customer).await;
    let order = ut_place_order(&shr_state, &user, &[("Vase", 40, 1), ("Frame", 15, 2)]).await;

    let uc = RetrieveOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    let view = uc.execute(order.id).await.unwrap();
    assert_eq!(view.order, order);
    assert_eq!(view.address.unwrap().full_name.as_str(), "Lin Mei");
    let names = view.items.iter().map(|i| i.product_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Vase", "Frame"]);
    assert_eq!(view.items[1].price, Decimal::new(30, 0));
    assert_eq!(view.items[0].product_image.as_deref(), Some("/img/vase.png"));

    // orders of other users look like missing ones
    let uc = RetrieveOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id: other.id,
    };
    let err = uc.execute(order.id).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
    let uc = RetrieveOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    let err = uc.execute(9999).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}

#[tokio::test]
async fn retrieve_removed_product() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "sho", UserRole::Customer).await;
    let order = ut_place_order(&shr_state, &user, &[("Clock", 25, 1)]).await;
    let products = shr_state.repo::<ProductModel>().all(None).await.unwrap();
    let _num = shr_state
        .repo::<ProductModel>()
        .delete(products[0].id, None)
        .await
        .unwrap();
    let uc = RetrieveOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    let view = uc.execute(order.id).await.unwrap();
    assert_eq!(view.items[0].product_name.as_str(), "Product no longer available");
    assert!(view.items[0].product_image.is_none());
    assert_eq!(view.items[0].price, Decimal::new(25, 0));
}

#[tokio::test]
async fn list_newest_first() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "hina", UserRole::Customer).await;
    let other = ut_seed_user(&shr_state, "taro", UserRole::Customer).await;
    let first = ut_place_order(&shr_state, &user, &[("Soap", 4, 3)]).await;
    let _foreign = ut_place_order(&shr_state, &other, &[("Towel", 9, 1)]).await;
    let second = ut_place_order(&shr_state, &user, &[("Brush", 6, 1), ("Comb", 3, 1)]).await;

    let uc = ListUserOrdersUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    let summaries = uc.execute(1, 0).await.unwrap();
    let ids = summaries.iter().map(|s| s.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(summaries[0].item_count, 2);
    assert_eq!(summaries[0].total_price, Decimal::new(9, 0));
    assert_eq!(summaries[1].item_count, 1);
    assert_eq!(summaries[1].status, OrderStatus::Pending);

    let uc = ListUserOrdersUseCase {
        glb_state: shr_state.clone(),
        usr_id: user.id,
    };
    let summaries = uc.execute(2, 1).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, first.id);
}

#[tokio::test]
async fn update_status_permission() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let owner = ut_seed_user(&shr_state, "yuki", UserRole::Customer).await;
    let stranger = ut_seed_user(&shr_state, "ken", UserRole::Customer).await;
    let admin = ut_seed_user(&shr_state, "root", UserRole::Admin).await;
    let order = ut_place_order(&shr_state, &owner, &[("Lamp", 30, 1)]).await;

    let uc = UpdateOrderStatusUseCase {
        glb_state: shr_state.clone(),
        actor: stranger,
    };
    let err = uc.execute(order.id, "Cancelled").await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::PermissionDenied);

    let uc = UpdateOrderStatusUseCase {
        glb_state: shr_state.clone(),
        actor: owner.clone(),
    };
    let saved = uc.execute(order.id, "Cancelled").await.unwrap();
    assert_eq!(saved.status, OrderStatus::Cancelled);

    let uc = UpdateOrderStatusUseCase {
        glb_state: shr_state.clone(),
        actor: admin.clone(),
    };
    let saved = uc.execute(order.id, "Delivering").await.unwrap();
    assert_eq!(saved.status, OrderStatus::Delivering);
    let stored = shr_state
        .repo::<OrderModel>()
        .one(order.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Delivering);

    let uc = UpdateOrderStatusUseCase {
        glb_state: shr_state.clone(),
        actor: admin.clone(),
    };
    let err = uc.execute(order.id, "Shipped").await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidState);
    let uc = UpdateOrderStatusUseCase {
        glb_state: shr_state.clone(),
        actor: admin,
    };
    let err = uc.execute(12345, "Completed").await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::NotFound);
}
