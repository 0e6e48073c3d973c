mod brand;
mod category;
mod coupon;
mod manage_cart;
mod manage_order;
mod product;
mod promotion;
mod review;
mod variant;

use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

pub use brand::BrandService;
pub use category::CategoryService;
pub use coupon::CouponService;
pub use manage_cart::CartService;
pub use manage_order::{
    CreateOrderUsKsErr, CreateOrderUseCase, ListUserOrdersUseCase, RetrieveOrderUseCase,
    UpdateOrderStatusUseCase,
};
pub use product::ProductService;
pub use promotion::PromotionService;
pub use review::ReviewService;
pub use variant::VariantService;

use crate::error::AppError;

// invalidation runs after the mutation persisted, its failure is logged
// and never fails the request
pub(crate) fn report_invalidation(
    logctx: &Arc<AppLogContext>,
    domain: &str,
    result: DefaultResult<(), AppError>,
) {
    if let Err(e) = result {
        app_log_event!(logctx, AppLogLevel::ERROR, "cache-invalidate-fail, domain:{}, {}", domain, e);
    }
}
