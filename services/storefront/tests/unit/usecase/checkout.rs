use std::boxed::Box;
use std::sync::atomic::Ordering;

use rust_decimal::Decimal;

use storefront::error::AppErrorCode;
use storefront::model::{
    CartLineModel, CouponDiscountType, CouponModel, CreateOrderReq, OrderAddressModel,
    OrderAddressReq, OrderDetailModel, OrderModel, OrderStatus, UserRole, VariantModel,
};
use storefront::usecase::{
    CartService, CouponService, CreateOrderUsKsErr, CreateOrderUseCase, ProductService,
    VariantService,
};
use storefront::AppSharedState;

use super::{
    ut_coupon_model, ut_inline_address, ut_seed_coupon, ut_seed_product, ut_seed_user,
    ut_seed_variant,
};
use crate::adapter::MockCountingDStore;
use crate::{ut_inmem_cache, ut_inmem_dstore, ut_setup_share_state, ut_setup_share_state_with};

fn ut_order_req(address: OrderAddressReq, coupon_code: Option<&str>) -> CreateOrderReq {
    CreateOrderReq {
        address,
        coupon_code: coupon_code.map(String::from),
        paying_method: "cod".to_string(),
        shipping_method: "standard".to_string(),
    }
}

async fn ut_checkout(
    shr_state: &AppSharedState,
    usr_id: u64,
    req: CreateOrderReq,
) -> Result<OrderModel, CreateOrderUsKsErr> {
    let uc = CreateOrderUseCase {
        glb_state: shr_state.clone(),
        usr_id,
    };
    uc.execute(req).await
}

async fn ut_stock_of(shr_state: &AppSharedState, variant_id: u64) -> u32 {
    let repo = shr_state.repo::<VariantModel>();
    repo.one(variant_id, None).await.unwrap().unwrap().stock
}

async fn ut_cart_lines(shr_state: &AppSharedState, usr_id: u64) -> Vec<CartLineModel> {
    CartService::new(shr_state).all(usr_id).await.unwrap()
}

// single line of 2 units at 50 each
async fn ut_setup_lamp_cart(shr_state: &AppSharedState) -> (u64, VariantModel) {
    let user = ut_seed_user(shr_state, "mio", UserRole::Customer).await;
    let product = ut_seed_product(shr_state, "Desk Lamp", 50, None).await;
    let variant = ut_seed_variant(shr_state, product.id, "warm-white", 50, 5).await;
    let cart_svc = CartService::new(shr_state);
    let _line = cart_svc
        .add_product_to_cart(user.id, product.id, variant.id, 2)
        .await
        .unwrap();
    (user.id, variant)
}

#[tokio::test]
async fn checkout_without_coupon() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let (usr_id, variant) = ut_setup_lamp_cart(&shr_state).await;
    let req = ut_order_req(ut_inline_address(), None);
    let order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(order.total_price, Decimal::new(100, 0));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, usr_id);
    assert!(order.coupon_id.is_none());

    let details = shr_state
        .repo::<OrderDetailModel>()
        .by_order(order.id, None)
        .await
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].variant_id, variant.id);
    assert_eq!(details[0].quantity, 2);
    assert_eq!(details[0].price, Decimal::new(100, 0));
    assert_eq!(ut_stock_of(&shr_state, variant.id).await, 3);
    assert!(ut_cart_lines(&shr_state, usr_id).await.is_empty());
    let cart = CartService::new(&shr_state).get_or_create_cart(usr_id).await.unwrap();
    assert_eq!(cart.total_price, Decimal::ZERO);

    let address = shr_state
        .repo::<OrderAddressModel>()
        .one(order.address_id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(address.user_id, usr_id);
    assert_eq!(address.city.as_str(), "Taipei");
}

#[tokio::test]
async fn checkout_percentage_coupon() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let (usr_id, _variant) = ut_setup_lamp_cart(&shr_state).await;
    let coupon = ut_coupon_model("SAVE10", CouponDiscountType::Percentage, 10, None, 0);
    let coupon = ut_seed_coupon(&shr_state, coupon).await;
    let req = ut_order_req(ut_inline_address(), Some("SAVE10"));
    let order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(order.total_price, Decimal::new(90, 0));
    assert_eq!(order.coupon_id, Some(coupon.id));
    let saved = shr_state
        .repo::<CouponModel>()
        .one(coupon.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.uses_count, 1);
}

#[tokio::test]
async fn checkout_insufficient_stock_rollback() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "ren", UserRole::Customer).await;
    let mug = ut_seed_product(&shr_state, "Mug", 12, None).await;
    let kettle = ut_seed_product(&shr_state, "Kettle", 40, None).await;
    let v_mug = ut_seed_variant(&shr_state, mug.id, "blue", 12, 5).await;
    let v_kettle = ut_seed_variant(&shr_state, kettle.id, "steel", 40, 3).await;
    let cart_svc = CartService::new(&shr_state);
    for (pid, vid) in [(mug.id, v_mug.id), (kettle.id, v_kettle.id)] {
        let _line = cart_svc.add_product_to_cart(user.id, pid, vid, 2).await.unwrap();
    }
    // stock drops after the item was put in cart
    let vsvc = VariantService::new(&shr_state);
    let _v = vsvc.update_stock(v_kettle.id, 1).await.unwrap();

    let req = ut_order_req(ut_inline_address(), None);
    let err = ut_checkout(&shr_state, user.id, req).await.unwrap_err();
    assert!(matches!(&err, CreateOrderUsKsErr::InsufficientStock(name) if name == "Kettle"));
    assert_eq!(err.code(), AppErrorCode::InsufficientStock);

    // nothing written by the transaction survives, including the line
    // processed before the failure
    let orders = shr_state.repo::<OrderModel>().all(None).await.unwrap();
    assert!(orders.is_empty());
    let details = shr_state.repo::<OrderDetailModel>().all(None).await.unwrap();
    assert!(details.is_empty());
    let addresses = shr_state.repo::<OrderAddressModel>().all(None).await.unwrap();
    assert!(addresses.is_empty());
    assert_eq!(ut_stock_of(&shr_state, v_mug.id).await, 5);
    assert_eq!(ut_stock_of(&shr_state, v_kettle.id).await, 1);
    assert_eq!(ut_cart_lines(&shr_state, user.id).await.len(), 2);
}

#[tokio::test]
async fn checkout_empty_cart_skip_txn() {
    let dstore = MockCountingDStore::new(ut_inmem_dstore());
    let num_begin = dstore.num_begin.clone();
    let cache = Box::new(ut_inmem_cache());
    let shr_state = ut_setup_share_state_with("config_ok.json", Box::new(dstore), cache);
    let user = ut_seed_user(&shr_state, "sora", UserRole::Customer).await;
    let req = ut_order_req(ut_inline_address(), None);
    let err = ut_checkout(&shr_state, user.id, req).await.unwrap_err();
    assert!(matches!(err, CreateOrderUsKsErr::EmptyCart));
    assert_eq!(err.code(), AppErrorCode::InvalidState);
    assert_eq!(err.to_string().as_str(), "cart is empty");
    assert_eq!(num_begin.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn checkout_open_single_txn() {
    let dstore = MockCountingDStore::new(ut_inmem_dstore());
    let num_begin = dstore.num_begin.clone();
    let cache = Box::new(ut_inmem_cache());
    let shr_state = ut_setup_share_state_with("config_ok.json", Box::new(dstore), cache);
    let (usr_id, _variant) = ut_setup_lamp_cart(&shr_state).await;
    let req = ut_order_req(ut_inline_address(), None);
    let _order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(num_begin.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn checkout_quantity_conservation() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "yui", UserRole::Customer).await;
    let cart_svc = CartService::new(&shr_state);
    let mut expect = Vec::new();
    for (name, price, stock, qty) in [("Pen", 3i64, 40u32, 7u32), ("Ink", 9, 10, 2), ("Pad", 5, 6, 6)] {
        let p = ut_seed_product(&shr_state, name, price, None).await;
        let v = ut_seed_variant(&shr_state, p.id, "std", price, stock).await;
        let _line = cart_svc.add_product_to_cart(user.id, p.id, v.id, qty).await.unwrap();
        expect.push((v.id, stock, qty));
    }
    let cart_qty = ut_cart_lines(&shr_state, user.id)
        .await
        .iter()
        .map(|l| l.quantity)
        .sum::<u32>();
    let req = ut_order_req(ut_inline_address(), None);
    let order = ut_checkout(&shr_state, user.id, req).await.unwrap();
    let details = shr_state
        .repo::<OrderDetailModel>()
        .by_order(order.id, None)
        .await
        .unwrap();
    let detail_qty = details.iter().map(|d| d.quantity).sum::<u32>();
    assert_eq!(detail_qty, cart_qty);
    let detail_total = details.iter().map(|d| d.price).sum::<Decimal>();
    assert_eq!(order.total_price, detail_total);
    assert_eq!(order.total_price, Decimal::new(21 + 18 + 30, 0));
    for (vid, stock, qty) in expect {
        assert_eq!(ut_stock_of(&shr_state, vid).await, stock - qty);
    }
}

#[tokio::test]
async fn checkout_coupon_usage_boundary() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let (usr_id, variant) = ut_setup_lamp_cart(&shr_state).await;
    let coupon = ut_coupon_model("LAST3", CouponDiscountType::FixedAmount, 15, Some(3), 2);
    let coupon = ut_seed_coupon(&shr_state, coupon).await;
    let coupon_svc = CouponService::new(&shr_state);
    let total = Decimal::new(100, 0);
    assert!(coupon_svc.validate_coupon("LAST3", total).await.is_ok());

    let req = ut_order_req(ut_inline_address(), Some("LAST3"));
    let order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(order.total_price, Decimal::new(85, 0));
    let saved = coupon_svc.by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(saved.uses_count, 3);
    let err = coupon_svc.validate_coupon("LAST3", total).await.unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidState);

    // lenient policy, exhausted coupon is ignored and full price charged
    let cart_svc = CartService::new(&shr_state);
    let _line = cart_svc
        .add_product_to_cart(usr_id, variant.product_id, variant.id, 1)
        .await
        .unwrap();
    let req = ut_order_req(OrderAddressReq::Saved(order.address_id), Some("LAST3"));
    let order2 = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(order2.total_price, Decimal::new(50, 0));
    assert!(order2.coupon_id.is_none());
    assert_eq!(order2.address_id, order.address_id);
    let saved = coupon_svc.by_id(coupon.id).await.unwrap().unwrap();
    assert_eq!(saved.uses_count, 3);
}

#[tokio::test]
async fn checkout_strict_coupon_rejected() {
    let shr_state = ut_setup_share_state("config_checkout_strict.json");
    let (usr_id, variant) = ut_setup_lamp_cart(&shr_state).await;
    let coupon = ut_coupon_model("GONE", CouponDiscountType::Percentage, 20, Some(1), 1);
    let _coupon = ut_seed_coupon(&shr_state, coupon).await;
    let req = ut_order_req(ut_inline_address(), Some("GONE"));
    let err = ut_checkout(&shr_state, usr_id, req).await.unwrap_err();
    assert!(matches!(&err, CreateOrderUsKsErr::CouponRejected(e) if e.code == AppErrorCode::InvalidState));
    let req = ut_order_req(ut_inline_address(), Some("NO-SUCH-CODE"));
    let err = ut_checkout(&shr_state, usr_id, req).await.unwrap_err();
    assert_eq!(err.code(), AppErrorCode::NotFound);

    let orders = shr_state.repo::<OrderModel>().all(None).await.unwrap();
    assert!(orders.is_empty());
    assert_eq!(ut_stock_of(&shr_state, variant.id).await, 5);
    assert_eq!(ut_cart_lines(&shr_state, usr_id).await.len(), 1);
}

#[tokio::test]
async fn checkout_saved_address_ownership() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let (usr_id, variant) = ut_setup_lamp_cart(&shr_state).await;
    let other = ut_seed_user(&shr_state, "haru", UserRole::Customer).await;
    let repo_addr = shr_state.repo::<OrderAddressModel>();
    let mut addr = OrderAddressModel {
        id: 0,
        user_id: other.id,
        full_name: "Haru Sato".to_string(),
        city: "Osaka".to_string(),
        district: "Kita".to_string(),
        ward: "Umeda".to_string(),
        address: "3-1 Umeda".to_string(),
        phone_number: "0611112222".to_string(),
        note: None,
        state: None,
    };
    let foreign = repo_addr.add(addr.clone(), None).await.unwrap();
    addr.user_id = usr_id;
    let own = repo_addr.add(addr, None).await.unwrap();

    let req = ut_order_req(OrderAddressReq::Saved(foreign.id), None);
    let err = ut_checkout(&shr_state, usr_id, req).await.unwrap_err();
    assert!(matches!(err, CreateOrderUsKsErr::AddressNotOwned));
    let req = ut_order_req(OrderAddressReq::Saved(9999), None);
    let err = ut_checkout(&shr_state, usr_id, req).await.unwrap_err();
    assert!(matches!(err, CreateOrderUsKsErr::AddressNotFound));
    assert_eq!(err.code(), AppErrorCode::NotFound);
    assert_eq!(ut_stock_of(&shr_state, variant.id).await, 5);

    let req = ut_order_req(OrderAddressReq::Saved(own.id), None);
    let order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    assert_eq!(order.address_id, own.id);
    let addresses = repo_addr.all(None).await.unwrap();
    assert_eq!(addresses.len(), 2);
}

#[tokio::test]
async fn checkout_refresh_cached_stock() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let (usr_id, variant) = ut_setup_lamp_cart(&shr_state).await;
    let vsvc = VariantService::new(&shr_state);
    let cached = vsvc.by_id(variant.id).await.unwrap().unwrap();
    assert_eq!(cached.stock, 5);
    let listed = vsvc.by_product(variant.product_id).await.unwrap();
    assert_eq!(listed[0].stock, 5);

    let req = ut_order_req(ut_inline_address(), None);
    let _order = ut_checkout(&shr_state, usr_id, req).await.unwrap();
    let cached = vsvc.by_id(variant.id).await.unwrap().unwrap();
    assert_eq!(cached.stock, 3);
    let listed = vsvc.by_product(variant.product_id).await.unwrap();
    assert_eq!(listed[0].stock, 3);
}

#[tokio::test]
async fn checkout_deleted_variant_rollback() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let user = ut_seed_user(&shr_state, "aoi", UserRole::Customer).await;
    let plate = ut_seed_product(&shr_state, "Plate", 10, None).await;
    let bowl = ut_seed_product(&shr_state, "Bowl", 8, None).await;
    let v_plate = ut_seed_variant(&shr_state, plate.id, "white", 10, 9).await;
    let v_bowl = ut_seed_variant(&shr_state, bowl.id, "grey", 8, 9).await;
    let cart_svc = CartService::new(&shr_state);
    let _line = cart_svc.add_product_to_cart(user.id, plate.id, v_plate.id, 1).await.unwrap();
    let _line = cart_svc.add_product_to_cart(user.id, bowl.id, v_bowl.id, 3).await.unwrap();
    VariantService::new(&shr_state).delete(v_bowl.id).await.unwrap();

    let req = ut_order_req(ut_inline_address(), None);
    let err = ut_checkout(&shr_state, user.id, req).await.unwrap_err();
    assert!(matches!(&err, CreateOrderUsKsErr::InsufficientStock(name) if name == "Bowl"));
    assert_eq!(err.code(), AppErrorCode::InsufficientStock);
    let orders = shr_state.repo::<OrderModel>().all(None).await.unwrap();
    assert!(orders.is_empty());
    assert_eq!(ut_stock_of(&shr_state, v_plate.id).await, 9);
    let lines = ut_cart_lines(&shr_state, user.id).await;
    assert_eq!(lines.iter().map(|l| l.quantity).sum::<u32>(), 4);
    // the cart view still hides the line
    let formatted = cart_svc.get_formatted_cart(user.id, 1, 10).await.unwrap();
    assert_eq!(formatted.lines.len(), 1);

    // product removed along with its variants, reported by product id
    ProductService::new(&shr_state).delete(plate.id).await.unwrap();
    let req = ut_order_req(ut_inline_address(), None);
    let err = ut_checkout(&shr_state, user.id, req).await.unwrap_err();
    let expect = format!("product:{}", plate.id);
    assert!(matches!(&err, CreateOrderUsKsErr::InsufficientStock(name) if *name == expect));
    assert_eq!(ut_cart_lines(&shr_state, user.id).await.len(), 2);
}

#[tokio::test]
async fn checkout_unknown_user_keep_code() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let req = ut_order_req(ut_inline_address(), None);
    let err = ut_checkout(&shr_state, 4242, req).await.unwrap_err();
    assert!(matches!(&err, CreateOrderUsKsErr::PreCheck(e) if e.code == AppErrorCode::NotFound));
    assert_eq!(err.code(), AppErrorCode::NotFound);
    let orders = shr_state.repo::<OrderModel>().all(None).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn checkout_race_last_unit() {
    let shr_state = ut_setup_share_state("config_ok.json");
    let product = ut_seed_product(&shr_state, "Poster", 20, None).await;
    let variant = ut_seed_variant(&shr_state, product.id, "A2", 20, 1).await;
    let cart_svc = CartService::new(&shr_state);
    let mut usr_ids = Vec::new();
    for name in ["kai", "nao", "riku"] {
        let user = ut_seed_user(&shr_state, name, UserRole::Customer).await;
        let _line = cart_svc
            .add_product_to_cart(user.id, product.id, variant.id, 1)
            .await
            .unwrap();
        usr_ids.push(user.id);
    }
    let handles = usr_ids
        .into_iter()
        .map(|usr_id| {
            let shr_state = shr_state.clone();
            tokio::spawn(async move {
                let req = ut_order_req(ut_inline_address(), None);
                ut_checkout(&shr_state, usr_id, req).await
            })
        })
        .collect::<Vec<_>>();
    let mut num_ok = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_order) => {
                num_ok += 1;
            }
            Err(e) => assert_eq!(e.code(), AppErrorCode::InsufficientStock),
        }
    }
    assert_eq!(num_ok, 1);
    assert_eq!(ut_stock_of(&shr_state, variant.id).await, 0);
    let orders = shr_state.repo::<OrderModel>().all(None).await.unwrap();
    assert_eq!(orders.len(), 1);
}
