//! Order pricing pipeline.
//!
//! Turns a storefront cart into a persisted order:
//!
//! 1. resolve the shop by slug (active and published only)
//! 2. validate the cart shape
//! 3. inside one transaction, lock and read the current catalog prices
//! 4. reject lines whose displayed price drifted beyond the tolerance
//! 5. look up the shipping price by method name
//! 6. validate and redeem the coupon, if any
//! 7. `total = subtotal + shipping + tax - discount`
//! 8. issue an order number
//! 9. insert the order and its lines, then commit
//!
//! Any error before step 9 completes drops the transaction, so an order is
//! either written with all of its lines and its coupon use, or not at all.
//! Stock is neither checked nor reserved.

mod postgres;
mod store;

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopforge_core::{MAX_MONEY, OrderId, ProductId, line_total};

use super::order_number::OrderNumberGenerator;
use crate::db::RepositoryError;
use crate::db::coupons::normalize_code;
use crate::error::AppError;
use crate::models::{BillingAddress, CouponRejection, NewOrder, NewOrderItem, ShippingAddress};

pub use postgres::{PgCheckoutStore, PgCheckoutTx};
pub use store::{CatalogPrice, CheckoutStore, CheckoutTx};

/// One cart line as sent by the storefront.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: i32,
    /// The unit price the customer was shown, if the storefront sends it.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// Body of `POST /shop/{slug}/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub billing: BillingAddress,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Response of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub total: Decimal,
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Shop not found")]
    ShopNotFound,

    #[error("Order must contain at least one item")]
    EmptyCart,

    #[error("Quantity must be at least 1 for product {0}")]
    InvalidQuantity(ProductId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Price changed for product {0}")]
    PriceChanged(ProductId),

    #[error("Order amount exceeds {MAX_MONEY}")]
    AmountTooLarge,

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::ShopNotFound => Self::shop_not_found(),
            CheckoutError::ProductNotFound(_) => Self::NotFound(err.to_string()),
            CheckoutError::EmptyCart
            | CheckoutError::InvalidQuantity(_)
            | CheckoutError::AmountTooLarge
            | CheckoutError::Coupon(_) => Self::BadRequest(err.to_string()),
            CheckoutError::PriceChanged(_) => Self::Conflict(err.to_string()),
            CheckoutError::Repository(e) => Self::Database(e),
        }
    }
}

/// The pricing pipeline bound to its storage and order number source.
pub struct Checkout<'a> {
    store: &'a dyn CheckoutStore,
    numbers: &'a OrderNumberGenerator,
    price_tolerance: Decimal,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn CheckoutStore,
        numbers: &'a OrderNumberGenerator,
        price_tolerance: Decimal,
    ) -> Self {
        Self {
            store,
            numbers,
            price_tolerance,
        }
    }

    /// Price and persist an order for the shop behind `slug`.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. Nothing is written when an error is returned.
    #[tracing::instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_order(
        &self,
        slug: &str,
        request: CheckoutRequest,
    ) -> Result<OrderPlaced, CheckoutError> {
        let shop = self
            .store
            .published_shop(slug)
            .await?
            .ok_or(CheckoutError::ShopNotFound)?;

        validate_cart(&request.items)?;

        let mut tx = self.store.begin().await?;

        let ids = unique_ids(&request.items);
        let catalog: HashMap<ProductId, CatalogPrice> = tx
            .catalog_prices(shop.id, &ids)
            .await?
            .into_iter()
            .map(|row| (row.id, row))
            .collect();

        let mut lines = Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;
        for line in &request.items {
            let current = catalog
                .get(&line.product_id)
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

            if let Some(shown) = line.unit_price
                && !within_tolerance(shown, current.price, self.price_tolerance)
            {
                tracing::info!(
                    product_id = %line.product_id,
                    shown = %shown,
                    current = %current.price,
                    "rejecting checkout on price drift"
                );
                return Err(CheckoutError::PriceChanged(line.product_id));
            }

            let quantity = line.quantity.unsigned_abs();
            let total = line_total(current.price, quantity);
            subtotal = storable_sum(subtotal, total)?;
            lines.push(NewOrderItem {
                product_id: current.id,
                name: current.name.clone(),
                sku: current.sku.clone(),
                quantity: line.quantity,
                price: current.price,
                total,
            });
        }

        let shipping_method = non_blank(request.shipping_method);
        let shipping = match &shipping_method {
            Some(name) => tx
                .shipping_price(shop.id, name)
                .await?
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };

        let coupon_code = non_blank(request.coupon_code).map(|code| normalize_code(&code));
        let discount = match &coupon_code {
            Some(code) => {
                let coupon = tx
                    .coupon_for_update(shop.id, code)
                    .await?
                    .ok_or(CouponRejection::Unknown)?;
                let discount = coupon.discount_for(subtotal, Utc::now())?;
                tx.redeem_coupon(coupon.id).await?;
                discount
            }
            None => Decimal::ZERO,
        };

        let tax = Decimal::ZERO;
        let total = storable_sum(subtotal, shipping + tax)? - discount;

        let order = NewOrder {
            shop_id: shop.id,
            order_number: self.numbers.next(),
            subtotal,
            shipping,
            tax,
            discount,
            total,
            currency: shop.currency,
            shipping_address: request.shipping,
            billing_address: request.billing,
            payment_method: non_blank(request.payment_method),
            shipping_method,
            customer_note: non_blank(request.customer_note),
            coupon_code,
        };

        let order_id = tx.insert_order(&order).await?;
        for line in &lines {
            tx.insert_item(order_id, line).await?;
        }
        tx.commit().await?;

        tracing::info!(
            %order_id,
            order_number = %order.order_number,
            total = %order.total,
            "order placed"
        );

        Ok(OrderPlaced {
            order_id,
            order_number: order.order_number,
            total: order.total,
        })
    }
}

fn validate_cart(items: &[CheckoutLine]) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if let Some(line) = items.iter().find(|line| line.quantity < 1) {
        return Err(CheckoutError::InvalidQuantity(line.product_id));
    }
    Ok(())
}

/// `shown` is client input and may sit at the edge of the decimal range.
fn within_tolerance(shown: Decimal, current: Decimal, tolerance: Decimal) -> bool {
    shown
        .checked_sub(current)
        .is_some_and(|drift| drift.abs() <= tolerance)
}

/// Add two amounts, rejecting sums a money column cannot hold.
fn storable_sum(a: Decimal, b: Decimal) -> Result<Decimal, CheckoutError> {
    a.checked_add(b)
        .filter(|sum| *sum <= MAX_MONEY)
        .ok_or(CheckoutError::AmountTooLarge)
}

fn unique_ids(items: &[CheckoutLine]) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|line| line.product_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
