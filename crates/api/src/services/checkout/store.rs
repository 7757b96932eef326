//! Storage seams of the checkout pipeline.
//!
//! The pipeline talks to storage only through these two traits: a
//! [`CheckoutStore`] that resolves the storefront and opens a unit of work,
//! and the [`CheckoutTx`] unit of work itself. Everything written through a
//! `CheckoutTx` becomes visible on [`CheckoutTx::commit`] and is discarded if
//! the transaction is dropped first.

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopforge_core::{CouponId, OrderId, ProductId, ShopId};

use crate::db::RepositoryError;
use crate::models::{Coupon, NewOrder, NewOrderItem, Shop};

/// Current catalog data for one product, read inside the checkout
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogPrice {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
}

/// Entry point of checkout storage.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// The shop behind a public slug, only if it is active and published.
    async fn published_shop(&self, slug: &str) -> Result<Option<Shop>, RepositoryError>;

    /// Open the transaction the whole order aggregate is written in.
    async fn begin(&self) -> Result<Box<dyn CheckoutTx>, RepositoryError>;
}

/// One checkout transaction.
#[async_trait]
pub trait CheckoutTx: Send {
    /// Current price, name and SKU of the active products of `shop_id` among
    /// `ids`, locked against concurrent price edits until commit. Products
    /// that are missing, inactive or belong to another shop are absent from
    /// the result.
    async fn catalog_prices(
        &mut self,
        shop_id: ShopId,
        ids: &[ProductId],
    ) -> Result<Vec<CatalogPrice>, RepositoryError>;

    /// Flat price of the shipping method called exactly `name`.
    async fn shipping_price(
        &mut self,
        shop_id: ShopId,
        name: &str,
    ) -> Result<Option<Decimal>, RepositoryError>;

    /// The coupon with `code`, locked for the usage-count increment.
    async fn coupon_for_update(
        &mut self,
        shop_id: ShopId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError>;

    /// Count one use of a coupon.
    async fn redeem_coupon(&mut self, id: CouponId) -> Result<(), RepositoryError>;

    /// Insert the order row.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Insert one line of `order_id`.
    async fn insert_item(
        &mut self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<(), RepositoryError>;

    /// Make every write of this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
