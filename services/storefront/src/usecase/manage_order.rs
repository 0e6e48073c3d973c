use std::fmt::{Display, Formatter};
use std::result::Result as DefaultResult;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;

use ecommerce_common::config::CouponFailurePolicy;
use ecommerce_common::logging::{app_log_event, AppLogLevel};
use ecommerce_common::util::AppPagination;

use super::manage_cart::{CartLineJoined, CartLineSnapshot};
use super::{CartService, CouponService, VariantService};
use crate::adapter::datastore::AppDStoreTxn;
use crate::constant::pagination;
use crate::error::{AppError, AppErrorCode};
use crate::model::{
    CartModel, CouponDiscountApplied, CreateOrderReq, OrderAddressModel, OrderAddressReq,
    OrderDetailModel, OrderItemView, OrderModel, OrderStatus, OrderSummary, OrderView,
    ProductModel, UserModel, VariantModel,
};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

const PRODUCT_UNAVAILABLE: &str = "Product no longer available";

#[derive(Debug)]
pub enum CreateOrderUsKsErr {
    EmptyCart,
    AddressNotFound,
    AddressNotOwned,
    /// name of the product which does not have enough stock
    InsufficientStock(String),
    /// only reported when coupon failure policy is strict
    CouponRejected(AppError),
    /// raised before any transaction opens, keeps the code of the cause
    PreCheck(AppError),
    TransactionFailed(AppError),
}

impl CreateOrderUsKsErr {
    pub fn code(&self) -> AppErrorCode {
        match self {
            Self::EmptyCart => AppErrorCode::InvalidState,
            Self::AddressNotFound | Self::AddressNotOwned => AppErrorCode::NotFound,
            Self::InsufficientStock(_name) => AppErrorCode::InsufficientStock,
            Self::CouponRejected(e) | Self::PreCheck(e) => e.code.clone(),
            Self::TransactionFailed(_e) => AppErrorCode::TransactionFailure,
        }
    }
}

impl Display for CreateOrderUsKsErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "cart is empty"),
            Self::AddressNotFound => write!(f, "address not found"),
            Self::AddressNotOwned => write!(f, "address not owned"),
            Self::InsufficientStock(name) => write!(f, "insufficient stock for {}", name),
            Self::CouponRejected(e) => write!(f, "coupon rejected, {}", e),
            Self::PreCheck(e) => write!(f, "checkout rejected, {}", e),
            Self::TransactionFailed(e) => write!(f, "transaction failed, {}", e),
        }
    }
}

impl From<AppError> for CreateOrderUsKsErr {
    fn from(value: AppError) -> Self {
        Self::TransactionFailed(value)
    }
}

struct CheckoutOutcome {
    order: OrderModel,
    coupon: Option<CouponDiscountApplied>,
    // (variant, product) pairs whose stock changed
    touched: Vec<(u64, u64)>,
}

/// Convert the cart of the user to an order in a single transaction, see
/// `execute()` for the sequence.
pub struct CreateOrderUseCase {
    pub glb_state: AppSharedState,
    pub usr_id: u64,
}

impl CreateOrderUseCase {
    /// - the cart is loaded before opening any transaction, empty cart is
    ///   rejected at this point
    /// - cart lines are joined with product and variant rows inside the
    ///   transaction, a line whose product or variant is gone fails the
    ///   checkout as insufficient stock
    /// - address, order header, order details, stock decrement and cart
    ///   clearance are written in the same transaction, any failure rolls
    ///   back all of them
    /// - the coupon usage is increased after commit, its failure does not
    ///   affect the committed order
    pub async fn execute(self, req: CreateOrderReq) -> DefaultResult<OrderModel, CreateOrderUsKsErr> {
        let cart_svc = CartService::new(&self.glb_state);
        let cart = cart_svc
            .get_or_create_cart(self.usr_id)
            .await
            .map_err(CreateOrderUsKsErr::PreCheck)?;
        let num_lines = cart_svc
            .lines_of(&cart, None)
            .await
            .map_err(CreateOrderUsKsErr::PreCheck)?
            .len();
        if num_lines == 0 {
            return Err(CreateOrderUsKsErr::EmptyCart);
        }
        let dstore = self.glb_state.datastore();
        let mut txn = dstore.begin().await?;
        let result = self.run_in_txn(&mut txn, &cart_svc, &cart, req).await;
        let logctx = self.glb_state.log_context();
        let outcome = match result {
            Ok(v) => {
                dstore.commit(txn).await?;
                v
            }
            Err(e) => {
                if let Err(re) = dstore.rollback(txn).await {
                    app_log_event!(logctx, AppLogLevel::ERROR, "rollback-fail, usr:{}, {}", self.usr_id, re);
                }
                app_log_event!(logctx, AppLogLevel::INFO, "order-rejected, usr:{}, {}", self.usr_id, e);
                return Err(e);
            }
        };
        if let Some(applied) = outcome.coupon.as_ref() {
            let coupon_svc = CouponService::new(&self.glb_state);
            if let Err(e) = coupon_svc.increment_uses(applied.coupon_id).await {
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "coupon-uses-increment-fail, order:{}, coupon:{}, {}",
                    outcome.order.id,
                    applied.coupon_id,
                    e
                );
            }
        }
        VariantService::new(&self.glb_state)
            .invalidate(&outcome.touched)
            .await;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "order-created, id:{}, usr:{}, num-lines:{}, total:{}",
            outcome.order.id,
            self.usr_id,
            outcome.touched.len(),
            outcome.order.total_price
        );
        Ok(outcome.order)
    } // end of fn execute

    async fn run_in_txn(
        &self,
        txn: &mut AppDStoreTxn,
        cart_svc: &CartService,
        cart: &CartModel,
        req: CreateOrderReq,
    ) -> DefaultResult<CheckoutOutcome, CreateOrderUsKsErr> {
        let CreateOrderReq {
            address,
            coupon_code,
            paying_method,
            shipping_method,
        } = req;
        let address_id = self.resolve_address(txn, address).await?;
        let snapshots = self.join_cart_lines(txn, cart_svc, cart).await?;
        let cart_total = snapshots.iter().map(|s| s.view.line_price).sum::<Decimal>();
        let coupon = match coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => self.try_apply_coupon(txn, code, cart_total).await?,
            _others => None,
        };
        let order = OrderModel {
            id: 0,
            user_id: self.usr_id,
            total_price: coupon.as_ref().map_or(cart_total, |c| c.final_amount),
            address_id,
            coupon_id: coupon.as_ref().map(|c| c.coupon_id),
            paying_method,
            shipping_method,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        let repo_order = self.glb_state.repo::<OrderModel>();
        let order = repo_order.add(order, Some(&mut *txn)).await?;

        let repo_detail = self.glb_state.repo::<OrderDetailModel>();
        let repo_variant = self.glb_state.repo::<VariantModel>();
        let mut touched = Vec::with_capacity(snapshots.len());
        for snap in snapshots {
            let CartLineSnapshot {
                line,
                view,
                mut variant,
            } = snap;
            if variant.stock < line.quantity {
                return Err(CreateOrderUsKsErr::InsufficientStock(view.product_name));
            }
            let detail = OrderDetailModel {
                id: 0,
                order_id: order.id,
                product_id: line.product_id,
                variant_id: line.variant_id,
                quantity: line.quantity,
                price: view.line_price,
            };
            let _detail = repo_detail.add(detail, Some(&mut *txn)).await?;
            variant.stock -= line.quantity;
            let variant = repo_variant.edit(variant, Some(&mut *txn)).await?;
            touched.push((variant.id, variant.product_id));
        }
        let _num_cleared = cart_svc.clear(cart, Some(&mut *txn)).await?;
        Ok(CheckoutOutcome {
            order,
            coupon,
            touched,
        })
    } // end of fn run_in_txn

    // every read here is from the datastore within the transaction, never
    // from cache, so stock levels are authoritative
    async fn join_cart_lines(
        &self,
        txn: &mut AppDStoreTxn,
        cart_svc: &CartService,
        cart: &CartModel,
    ) -> DefaultResult<Vec<CartLineSnapshot>, CreateOrderUsKsErr> {
        let lines = cart_svc.lines_of(cart, Some(&mut *txn)).await?;
        if lines.is_empty() {
            return Err(CreateOrderUsKsErr::EmptyCart);
        }
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            match cart_svc.join_line(line, Some(&mut *txn)).await? {
                CartLineJoined::Live(snap) => out.push(snap),
                CartLineJoined::Dangling { line, product } => {
                    let label = product
                        .map(|p| p.name)
                        .unwrap_or_else(|| format!("product:{}", line.product_id));
                    return Err(CreateOrderUsKsErr::InsufficientStock(label));
                }
            }
        }
        Ok(out)
    }

    async fn resolve_address(
        &self,
        txn: &mut AppDStoreTxn,
        address: OrderAddressReq,
    ) -> DefaultResult<u64, CreateOrderUsKsErr> {
        let repo = self.glb_state.repo::<OrderAddressModel>();
        if let OrderAddressReq::Saved(addr_id) = address {
            let saved = repo
                .one(addr_id, Some(txn))
                .await?
                .ok_or(CreateOrderUsKsErr::AddressNotFound)?;
            if saved.user_id == self.usr_id {
                Ok(saved.id)
            } else {
                Err(CreateOrderUsKsErr::AddressNotOwned)
            }
        } else if let Some(m) = address.into_model(self.usr_id) {
            let saved = repo.add(m, Some(txn)).await?;
            Ok(saved.id)
        } else {
            Err(CreateOrderUsKsErr::AddressNotFound)
        }
    }

    // Rejection of the coupon itself follows the configured policy, other
    // errors still abort the checkout.
    async fn try_apply_coupon(
        &self,
        txn: &mut AppDStoreTxn,
        code: &str,
        total: Decimal,
    ) -> DefaultResult<Option<CouponDiscountApplied>, CreateOrderUsKsErr> {
        let coupon_svc = CouponService::new(&self.glb_state);
        let e = match coupon_svc.apply_in(code, total, Some(txn)).await {
            Ok(applied) => return Ok(Some(applied)),
            Err(e) => e,
        };
        if !e.code.is_client_error() {
            return Err(CreateOrderUsKsErr::TransactionFailed(e));
        }
        match self.glb_state.checkout_cfg().coupon_failure_policy {
            CouponFailurePolicy::Lenient => {
                let logctx = self.glb_state.log_context();
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "coupon-ignored, usr:{}, code:{}, {}",
                    self.usr_id,
                    code,
                    e
                );
                Ok(None)
            }
            CouponFailurePolicy::Strict => Err(CreateOrderUsKsErr::CouponRejected(e)),
        }
    }
} // end of impl CreateOrderUseCase

pub struct RetrieveOrderUseCase {
    pub glb_state: AppSharedState,
    pub usr_id: u64,
}

impl RetrieveOrderUseCase {
    pub async fn execute(self, order_id: u64) -> DefaultResult<OrderView, AppError> {
        let order = self
            .glb_state
            .repo::<OrderModel>()
            .one(order_id, None)
            .await?
            .filter(|o| o.user_id == self.usr_id)
            .ok_or_else(|| AppError::new(AppErrorCode::NotFound, format!("order:{}", order_id)))?;
        let address = self
            .glb_state
            .repo::<OrderAddressModel>()
            .one(order.address_id, None)
            .await?;
        let details = self
            .glb_state
            .repo::<OrderDetailModel>()
            .by_order(order.id, None)
            .await?;
        let repo_product = self.glb_state.repo::<ProductModel>();
        let mut items = Vec::with_capacity(details.len());
        for d in details {
            let product = repo_product.one(d.product_id, None).await?;
            let (product_name, product_image) = match product {
                Some(p) => (p.name, p.thumb_url),
                None => (PRODUCT_UNAVAILABLE.to_string(), None),
            };
            items.push(OrderItemView {
                id: d.id,
                product_id: d.product_id,
                product_name,
                product_image,
                quantity: d.quantity,
                price: d.price,
            });
        }
        Ok(OrderView {
            order,
            address,
            items,
        })
    }
}

pub struct ListUserOrdersUseCase {
    pub glb_state: AppSharedState,
    pub usr_id: u64,
}

impl ListUserOrdersUseCase {
    /// newest first, zero page or page size falls back to default
    pub async fn execute(self, page: u32, per_page: u32) -> DefaultResult<Vec<OrderSummary>, AppError> {
        let per_page = if per_page == 0 {
            pagination::DEFAULT_ORDERS_PER_PAGE
        } else {
            per_page
        };
        let mut orders = self
            .glb_state
            .repo::<OrderModel>()
            .by_user(self.usr_id, None)
            .await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let pg = AppPagination::new(page, per_page, orders.len());
        let repo_detail = self.glb_state.repo::<OrderDetailModel>();
        let mut out = Vec::with_capacity(pg.end_idx - pg.start_idx);
        for o in pg.slice(&orders) {
            let item_count = repo_detail.by_order(o.id, None).await?.len();
            out.push(OrderSummary {
                id: o.id,
                total_price: o.total_price,
                status: o.status,
                item_count,
                created_at: o.created_at,
            });
        }
        Ok(out)
    }
}

pub struct UpdateOrderStatusUseCase {
    pub glb_state: AppSharedState,
    pub actor: UserModel,
}

impl UpdateOrderStatusUseCase {
    /// Only the owner of the order or admin can update, any of the known
    /// statuses can be set.
    pub async fn execute(self, order_id: u64, status: &str) -> DefaultResult<OrderModel, AppError> {
        let repo = self.glb_state.repo::<OrderModel>();
        let mut order = repo
            .one(order_id, None)
            .await?
            .ok_or_else(|| AppError::new(AppErrorCode::NotFound, format!("order:{}", order_id)))?;
        if order.user_id != self.actor.id && !self.actor.is_admin() {
            let detail = format!("order:{}, actor:{}", order_id, self.actor.id);
            return Err(AppError::new(AppErrorCode::PermissionDenied, detail));
        }
        order.status = OrderStatus::from_str(status)?;
        let saved = repo.edit(order, None).await?;
        let logctx = self.glb_state.log_context();
        app_log_event!(logctx, AppLogLevel::INFO, "order-status, id:{}, status:{}", saved.id, saved.status.label());
        Ok(saved)
    }
}
