pub mod app_meta {
    pub const LABEL: &str = "storefront";
}

pub mod hard_limit {
    pub const MAX_ITEMS_STORED_PER_MODEL: u32 = 2200;
    pub const MAX_ITEMS_INMEM_CACHE: u32 = 4096;
    pub const MAX_DB_CONNECTIONS: u32 = 10000;
    pub const MAX_SECONDS_DB_IDLE: u16 = 600;
    pub const MAX_REVIEWS_PER_PAGE: u32 = 50;
    pub const MAX_REVIEW_RATING: u8 = 5;
    pub const MAX_PERCENTAGE_DISCOUNT: u32 = 100;
}

pub mod pagination {
    pub const DEFAULT_CART_LINES_PER_PAGE: u32 = 5;
    pub const DEFAULT_ORDERS_PER_PAGE: u32 = 10;
    pub const DEFAULT_PRODUCTS_PER_PAGE: u32 = 12;
}

pub mod tables {
    pub const USERS: &str = "users";
    pub const CARTS: &str = "carts";
    pub const CART_ITEMS: &str = "cart_items";
    pub const PRODUCTS: &str = "products";
    pub const PRODUCT_VARIANTS: &str = "product_variants";
    pub const PRODUCT_IMAGES: &str = "product_images";
    pub const CATEGORIES: &str = "categories";
    pub const BRANDS: &str = "brands";
    pub const COUPONS: &str = "coupons";
    pub const PROMOTIONS: &str = "promotions";
    pub const PRODUCT_PROMOTIONS: &str = "product_promotions";
    pub const PRODUCT_REVIEWS: &str = "product_reviews";
    pub const ORDERS: &str = "orders";
    pub const ORDER_DETAILS: &str = "order_details";
    pub const ORDER_ADDRESSES: &str = "order_addresses";

    pub const ALL: [&str; 15] = [
        USERS,
        CARTS,
        CART_ITEMS,
        PRODUCTS,
        PRODUCT_VARIANTS,
        PRODUCT_IMAGES,
        CATEGORIES,
        BRANDS,
        COUPONS,
        PROMOTIONS,
        PRODUCT_PROMOTIONS,
        PRODUCT_REVIEWS,
        ORDERS,
        ORDER_DETAILS,
        ORDER_ADDRESSES,
    ];
}

// every cache key is prefixed with one of the domains, so pattern
// deletion never crosses domains
pub mod cache_domain {
    pub const PRODUCT: &str = "product";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const COUPON: &str = "coupon";
    pub const PROMOTION: &str = "promotion";
    pub const REVIEW: &str = "review";
    pub const VARIANT: &str = "variant";
}
