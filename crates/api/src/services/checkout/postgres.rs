//! `PostgreSQL` implementation of the checkout storage seams.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use shopforge_core::{CouponId, OrderId, OrderStatus, PaymentStatus, ProductId, ShopId};

use super::store::{CatalogPrice, CheckoutStore, CheckoutTx};
use crate::db::coupons::COUPON_COLUMNS;
use crate::db::{RepositoryError, ShopRepository};
use crate::models::{Coupon, NewOrder, NewOrderItem, Shop};

/// Checkout storage backed by the connection pool.
#[derive(Clone, Copy)]
pub struct PgCheckoutStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCheckoutStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore<'_> {
    async fn published_shop(&self, slug: &str) -> Result<Option<Shop>, RepositoryError> {
        ShopRepository::new(self.pool).find_published(slug).await
    }

    async fn begin(&self) -> Result<Box<dyn CheckoutTx>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCheckoutTx { tx }))
    }
}

/// A checkout running inside one database transaction. Dropping it without
/// calling `commit` rolls everything back.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutTx for PgCheckoutTx {
    async fn catalog_prices(
        &mut self,
        shop_id: ShopId,
        ids: &[ProductId],
    ) -> Result<Vec<CatalogPrice>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();

        let rows = sqlx::query_as::<_, CatalogPrice>(
            "SELECT id, name, sku, price FROM products \
             WHERE shop_id = $1 AND is_active = TRUE AND id = ANY($2) \
             FOR SHARE",
        )
        .bind(shop_id)
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn shipping_price(
        &mut self,
        shop_id: ShopId,
        name: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let price = sqlx::query_scalar::<_, Decimal>(
            "SELECT price FROM shipping_methods WHERE shop_id = $1 AND name = $2 \
             ORDER BY is_active DESC, position LIMIT 1",
        )
        .bind(shop_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(price)
    }

    async fn coupon_for_update(
        &mut self,
        shop_id: ShopId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE shop_id = $1 AND code = $2 FOR UPDATE"
        ))
        .bind(shop_id)
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(coupon)
    }

    async fn redeem_coupon(&mut self, id: CouponId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE coupons SET used_count = used_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let shipping = &order.shipping_address;
        let billing = &order.billing_address;

        let id = sqlx::query_scalar::<_, OrderId>(
            "INSERT INTO orders (shop_id, order_number, status, payment_status, \
                 subtotal, shipping, tax, discount, total, currency, \
                 shipping_first_name, shipping_last_name, shipping_address, shipping_city, \
                 shipping_zip, shipping_country, shipping_phone, \
                 billing_first_name, billing_last_name, billing_address, billing_city, \
                 billing_zip, billing_country, billing_email, \
                 payment_method, shipping_method, customer_note, coupon_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                     $11, $12, $13, $14, $15, $16, $17, \
                     $18, $19, $20, $21, $22, $23, $24, \
                     $25, $26, $27, $28) \
             RETURNING id",
        )
        .bind(order.shop_id)
        .bind(&order.order_number)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(order.subtotal)
        .bind(order.shipping)
        .bind(order.tax)
        .bind(order.discount)
        .bind(order.total)
        .bind(&order.currency)
        .bind(&shipping.first_name)
        .bind(&shipping.last_name)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.zip)
        .bind(&shipping.country)
        .bind(&shipping.phone)
        .bind(&billing.first_name)
        .bind(&billing.last_name)
        .bind(&billing.address)
        .bind(&billing.city)
        .bind(&billing.zip)
        .bind(&billing.country)
        .bind(&billing.email)
        .bind(&order.payment_method)
        .bind(&order.shipping_method)
        .bind(&order.customer_note)
        .bind(&order.coupon_code)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, "Order number already issued"))?;

        Ok(id)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, name, sku, quantity, price, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.total)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
