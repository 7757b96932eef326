//! Order repository (owner side).
//!
//! Orders are only ever inserted by the checkout pipeline
//! (`services::checkout`). Owners read them, move their status along the
//! transition tables, and annotate them; money columns are never updated.

use sqlx::PgPool;

use shopforge_core::{OrderId, OrderStatus, Page, PageRequest, PaymentStatus, ShopId};

use super::RepositoryError;
use super::listing::{Filter, ListQuery};
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{Order, OrderDetail, OrderItem};

const ORDER_COLUMNS: &str = "id, shop_id, customer_id, order_number, status, payment_status, \
     subtotal, shipping, tax, discount, total, currency, \
     shipping_first_name, shipping_last_name, shipping_address, shipping_city, shipping_zip, \
     shipping_country, shipping_phone, \
     billing_first_name, billing_last_name, billing_address, billing_city, billing_zip, \
     billing_country, billing_email, \
     payment_method, shipping_method, tracking_number, customer_note, internal_note, \
     coupon_code, created_at, updated_at";

fn parse_order_status(s: &str) -> Option<&'static str> {
    s.parse::<OrderStatus>().ok().map(OrderStatus::as_str)
}

fn parse_payment_status(s: &str) -> Option<&'static str> {
    s.parse::<PaymentStatus>().ok().map(PaymentStatus::as_str)
}

/// Columns an owner may change through `PUT .../orders/{id}`.
pub const ORDER_UPDATE: Whitelist = Whitelist::new(
    "orders",
    &[
        Field::new("status", FieldKind::Enum(parse_order_status)),
        Field::new("payment_status", FieldKind::Enum(parse_payment_status)),
        Field::new("tracking_number", FieldKind::NullableText),
        Field::new("internal_note", FieldKind::NullableText),
    ],
);

const ORDER_LIST: ListQuery = ListQuery {
    from: "orders",
    columns: ORDER_COLUMNS,
    order_by: "created_at DESC",
};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders of a shop, newest first, optionally filtered by status and
    /// searched by order number or billing email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        shop_id: ShopId,
        search: Option<&str>,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut filter = Filter::new()
            .uuid("shop_id", shop_id)
            .search(&["order_number", "billing_email"], search);
        if let Some(status) = status {
            filter = filter.text("status", status.as_str());
        }

        ORDER_LIST.fetch(self.pool, &filter, page).await
    }

    /// An order of `shop_id`, without items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop_id: ShopId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND shop_id = $2"
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// An order of `shop_id` with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn detail(
        &self,
        shop_id: ShopId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(shop_id, id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, name, sku, quantity, price, total \
             FROM order_items WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail { order, items }))
    }

    /// Apply an owner update, guarded on the status pair the caller
    /// validated the transition against.
    ///
    /// `None` means the order no longer has `current` statuses (or is gone):
    /// someone else changed it in between.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        current: &Order,
        update: PartialUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut query = update.into_query(current.id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" AND status = ")
            .push_bind(current.status)
            .push(" AND payment_status = ")
            .push_bind(current.payment_status)
            .push(" RETURNING ")
            .push(ORDER_COLUMNS);

        let order = query
            .build_query_as::<Order>()
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Move an order to `cancelled` if it is still in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn cancel(
        &self,
        shop_id: ShopId,
        id: OrderId,
        from: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND shop_id = $3 AND status = $4 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(OrderStatus::Cancelled)
        .bind(id)
        .bind(shop_id)
        .bind(from)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_money_columns_are_not_updatable() {
        let body = json!({
            "total": "0.01",
            "subtotal": "0.01",
            "discount": "100",
            "order_number": "ORD-1",
            "tracking_number": "Z123"
        });
        let update = ORDER_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["tracking_number"]);
    }

    #[test]
    fn test_payment_alias_is_stored_canonically() {
        let body = json!({"payment_status": "completed"});
        let update = ORDER_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.text("payment_status"), Some("paid"));
    }

    #[test]
    fn test_status_filter_shared_by_count_and_page() {
        let filter = Filter::new()
            .uuid("shop_id", uuid::Uuid::nil())
            .search(&["order_number", "billing_email"], Some("ORD-17"))
            .text("status", OrderStatus::Shipped.as_str());
        let count = ORDER_LIST.count_query(&filter).into_sql();
        let page = ORDER_LIST.page_query(&filter, PageRequest::default()).into_sql();
        let predicate = " WHERE shop_id = $1 AND (order_number ILIKE $2 ESCAPE '\\' \
                         OR billing_email ILIKE $3 ESCAPE '\\') AND status = $4";
        assert!(count.ends_with(predicate));
        assert!(page.contains(&format!("{predicate} ORDER BY created_at DESC")));
    }
}
