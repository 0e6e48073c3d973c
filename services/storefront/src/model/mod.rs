mod brand;
mod cart;
mod category;
mod coupon;
mod order;
mod product;
mod promotion;
mod review;
mod user;

pub use brand::BrandModel;
pub use cart::{CartItemUpdated, CartLineModel, CartLineView, CartModel, FormattedCart};
pub use category::{CategoryForest, CategoryModel, CategoryNode};
pub use coupon::{CouponDiscountApplied, CouponDiscountType, CouponModel};
pub use order::{
    CreateOrderReq, OrderAddressModel, OrderAddressReq, OrderDetailModel, OrderItemView,
    OrderModel, OrderStatus, OrderSummary, OrderView,
};
pub use product::{
    ProductDetail, ProductFilter, ProductImageModel, ProductListPage, ProductModel, ProductSortKey,
    VariantModel,
};
pub use promotion::{ProductPromotionModel, PromotionModel};
pub use review::{ReviewModel, ReviewPage, ReviewRating};
pub use user::{UserModel, UserRole};
