use std::result::Result as DefaultResult;
use std::sync::Arc;

use rust_decimal::Decimal;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};
use ecommerce_common::util::AppPagination;

use crate::adapter::datastore::AppDStoreTxn;
use crate::constant::pagination;
use crate::error::{AppError, AppErrorCode};
use crate::model::{
    CartItemUpdated, CartLineModel, CartLineView, CartModel, FormattedCart, ProductModel,
    UserModel, VariantModel,
};
use crate::repository::AppTableRepo;
use crate::AppSharedState;

/// cart line joined with the product and variant it refers to
pub(crate) struct CartLineSnapshot {
    pub line: CartLineModel,
    pub view: CartLineView,
    pub variant: VariantModel,
}

pub(crate) enum CartLineJoined {
    Live(CartLineSnapshot),
    /// product or variant row no longer exists
    Dangling {
        line: CartLineModel,
        product: Option<ProductModel>,
    },
}

/// Mutable per-user collection of cart lines. None of the operations
/// touches the stock of variants, only checkout does.
pub struct CartService {
    users: AppTableRepo<UserModel>,
    carts: AppTableRepo<CartModel>,
    lines: AppTableRepo<CartLineModel>,
    products: AppTableRepo<ProductModel>,
    variants: AppTableRepo<VariantModel>,
    logctx: Arc<AppLogContext>,
}

impl CartService {
    pub fn new(shr_state: &AppSharedState) -> Self {
        Self {
            users: shr_state.repo(),
            carts: shr_state.repo(),
            lines: shr_state.repo(),
            products: shr_state.repo(),
            variants: shr_state.repo(),
            logctx: shr_state.log_context().clone(),
        }
    }

    pub async fn get_or_create_cart(&self, user_id: u64) -> DefaultResult<CartModel, AppError> {
        if let Some(c) = self.carts.by_user(user_id, None).await? {
            return Ok(c);
        }
        if self.users.one(user_id, None).await?.is_none() {
            let detail = format!("user:{}", user_id);
            return Err(AppError::new(AppErrorCode::NotFound, detail));
        }
        let new_cart = CartModel {
            id: 0,
            user_id,
            total_price: Decimal::ZERO,
        };
        self.carts.add(new_cart, None).await
    }

    pub async fn all(&self, user_id: u64) -> DefaultResult<Vec<CartLineModel>, AppError> {
        let cart = self.get_or_create_cart(user_id).await?;
        self.lines.by_cart(cart.id, None).await
    }

    pub(crate) async fn lines_of(
        &self,
        cart: &CartModel,
        txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<Vec<CartLineModel>, AppError> {
        self.lines.by_cart(cart.id, txn).await
    }

    pub(crate) async fn join_line(
        &self,
        line: CartLineModel,
        mut txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<CartLineJoined, AppError> {
        let product = self.products.one(line.product_id, txn.as_deref_mut()).await?;
        let variant = self.variants.one(line.variant_id, txn).await?;
        let joined = match (product, variant) {
            (Some(p), Some(v)) => {
                let view = CartLineView::new(&line, &p, &v);
                CartLineJoined::Live(CartLineSnapshot {
                    line,
                    view,
                    variant: v,
                })
            }
            (product, _none) => CartLineJoined::Dangling { line, product },
        };
        Ok(joined)
    }

    /// Join every line with live product and variant data. Lines whose
    /// product or variant no longer exists are skipped.
    async fn snapshot(&self, cart: &CartModel) -> DefaultResult<Vec<CartLineSnapshot>, AppError> {
        let lines = self.lines_of(cart, None).await?;
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            match self.join_line(line, None).await? {
                CartLineJoined::Live(snap) => out.push(snap),
                CartLineJoined::Dangling { line, .. } => {
                    let logctx = &self.logctx;
                    app_log_event!(
                        logctx,
                        AppLogLevel::WARNING,
                        "cart-line-dangling, cart:{}, line:{}, product:{}, variant:{}",
                        cart.id,
                        line.id,
                        line.product_id,
                        line.variant_id
                    );
                }
            }
        }
        Ok(out)
    }

    pub async fn get_formatted_cart(
        &self,
        user_id: u64,
        page: u32,
        per_page: u32,
    ) -> DefaultResult<FormattedCart, AppError> {
        let cart = self.get_or_create_cart(user_id).await?;
        let snapshots = self.snapshot(&cart).await?;
        let total_price = snapshots.iter().map(|s| s.view.line_price).sum::<Decimal>();
        let views = snapshots.into_iter().map(|s| s.view).collect::<Vec<_>>();
        let per_page = if per_page == 0 {
            pagination::DEFAULT_CART_LINES_PER_PAGE
        } else {
            per_page
        };
        let pg = AppPagination::new(page, per_page, views.len());
        Ok(FormattedCart {
            lines: pg.slice(&views).to_vec(),
            total_price,
            current_page: pg.current_page,
            total_pages: pg.total_pages,
        })
    }

    async fn load_variant(
        &self,
        product_id: u64,
        variant_id: u64,
    ) -> DefaultResult<VariantModel, AppError> {
        let product_exist = self.products.one(product_id, None).await?.is_some();
        let variant = self.variants.one(variant_id, None).await?;
        match variant {
            Some(v) if product_exist && v.product_id == product_id => Ok(v),
            _others => {
                let detail = format!("product:{}, variant:{}", product_id, variant_id);
                Err(AppError::new(AppErrorCode::NotFound, detail))
            }
        }
    }

    fn check_quantity(variant: &VariantModel, quantity: u32) -> DefaultResult<(), AppError> {
        if quantity == 0 {
            Err(AppError::new(AppErrorCode::InvalidInput, "cart-quantity-zero"))
        } else if quantity > variant.stock {
            let detail = format!(
                "variant:{}, requested:{}, stock:{}",
                variant.id, quantity, variant.stock
            );
            Err(AppError::new(AppErrorCode::InsufficientStock, detail))
        } else {
            Ok(())
        }
    }

    async fn find_line(
        &self,
        cart: &CartModel,
        product_id: u64,
        variant_id: u64,
    ) -> DefaultResult<Option<CartLineModel>, AppError> {
        let lines = self.lines.by_cart(cart.id, None).await?;
        Ok(lines.into_iter().find(|l| l.is_item(product_id, variant_id)))
    }

    fn line_missing(product_id: u64, variant_id: u64) -> AppError {
        let detail = format!("cart-line, product:{}, variant:{}", product_id, variant_id);
        AppError::new(AppErrorCode::NotFound, detail)
    }

    /// recompute the running total from live variant prices
    async fn refresh_total(&self, mut cart: CartModel) -> DefaultResult<CartModel, AppError> {
        let snapshots = self.snapshot(&cart).await?;
        cart.total_price = snapshots.iter().map(|s| s.view.line_price).sum();
        self.carts.edit(cart, None).await
    }

    pub async fn add_product_to_cart(
        &self,
        user_id: u64,
        product_id: u64,
        variant_id: u64,
        quantity: u32,
    ) -> DefaultResult<CartLineModel, AppError> {
        let cart = self.get_or_create_cart(user_id).await?;
        let variant = self.load_variant(product_id, variant_id).await?;
        let saved = match self.find_line(&cart, product_id, variant_id).await? {
            Some(mut line) => {
                let new_qty = line.quantity.saturating_add(quantity);
                Self::check_quantity(&variant, quantity)?;
                Self::check_quantity(&variant, new_qty)?;
                line.quantity = new_qty;
                self.lines.edit(line, None).await?
            }
            None => {
                Self::check_quantity(&variant, quantity)?;
                let line = CartLineModel {
                    id: 0,
                    cart_id: cart.id,
                    product_id,
                    variant_id,
                    quantity,
                };
                self.lines.add(line, None).await?
            }
        };
        let _cart = self.refresh_total(cart).await?;
        Ok(saved)
    }

    pub async fn update_cart_item(
        &self,
        user_id: u64,
        product_id: u64,
        variant_id: u64,
        quantity: u32,
    ) -> DefaultResult<CartItemUpdated, AppError> {
        let cart = self.get_or_create_cart(user_id).await?;
        let mut line = self
            .find_line(&cart, product_id, variant_id)
            .await?
            .ok_or_else(|| Self::line_missing(product_id, variant_id))?;
        let variant = self.load_variant(product_id, variant_id).await?;
        Self::check_quantity(&variant, quantity)?;
        let old_qty = line.quantity;
        line.quantity = quantity;
        let saved = self.lines.edit(line, None).await?;
        let _cart = self.refresh_total(cart).await?;
        let unit = variant.price;
        Ok(CartItemUpdated {
            updated_price: unit * Decimal::from(saved.quantity),
            updated_quantity: saved.quantity,
            change_in_price: unit * (Decimal::from(quantity) - Decimal::from(old_qty)),
        })
    }

    /// return the price removed from the cart
    pub async fn remove_product_from_cart(
        &self,
        user_id: u64,
        product_id: u64,
        variant_id: u64,
    ) -> DefaultResult<Decimal, AppError> {
        let cart = self.get_or_create_cart(user_id).await?;
        let line = self
            .find_line(&cart, product_id, variant_id)
            .await?
            .ok_or_else(|| Self::line_missing(product_id, variant_id))?;
        let unit_price = self
            .variants
            .one(variant_id, None)
            .await?
            .map(|v| v.price)
            .unwrap_or(Decimal::ZERO);
        let removed = unit_price * Decimal::from(line.quantity);
        let _num = self.lines.delete(line.id, None).await?;
        let _cart = self.refresh_total(cart).await?;
        Ok(removed)
    }

    pub(crate) async fn clear(
        &self,
        cart: &CartModel,
        mut txn: Option<&mut AppDStoreTxn>,
    ) -> DefaultResult<usize, AppError> {
        let num = self.lines.clear_cart(cart.id, txn.as_deref_mut()).await?;
        let mut emptied = cart.clone();
        emptied.total_price = Decimal::ZERO;
        let _saved = self.carts.edit(emptied, txn).await?;
        Ok(num)
    }
} // end of impl CartService
