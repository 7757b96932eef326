//! Owner order routes.
//!
//! Orders are created by the storefront checkout only. Owners move them
//! along the status tables and annotate them; cancelling is the only way to
//! "delete" one.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{OrderId, OrderStatus, Page, PaymentStatus, ShopId};

use crate::db::orders::ORDER_UPDATE;
use crate::db::update::PartialUpdate;
use crate::db::{OrderRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath, AppQuery};
use crate::middleware::RequireUser;
use crate::models::{Order, OrderDetail};
use crate::routes::not_found;
use crate::services::owned_shop;
use crate::state::AppState;

const CONCURRENT_CHANGE: &str = "Order was changed by another request, reload and retry";

/// Query parameters of `GET /shops/{shop_id}/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
}

#[instrument(skip(state, params))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppQuery(params): AppQuery<OrderListParams>,
) -> Result<Json<Page<Order>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let page = state.page_request(params.page, params.limit);
    let orders = OrderRepository::new(state.pool())
        .list(shop_id, params.search.as_deref(), params.status, page)
        .await?;
    Ok(Json(orders))
}

/// `GET /shops/{shop_id}/orders/{id}` - the order with its line items.
#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, OrderId)>,
) -> Result<Json<OrderDetail>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let detail = OrderRepository::new(state.pool())
        .detail(shop_id, id)
        .await?
        .ok_or_else(|| not_found("Order"))?;
    Ok(Json(detail))
}

/// `PUT /shops/{shop_id}/orders/{id}`
///
/// Status and payment status changes are checked against their transition
/// tables before anything is written.
#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, OrderId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Order>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = ORDER_UPDATE.filter(&body)?;
    let repo = OrderRepository::new(state.pool());
    let current = repo
        .get(shop_id, id)
        .await?
        .ok_or_else(|| not_found("Order"))?;
    check_transitions(&current, &update)?;

    let order = repo
        .update(shop_id, &current, update)
        .await?
        .ok_or_else(|| AppError::Conflict(CONCURRENT_CHANGE.to_string()))?;

    if order.status != current.status || order.payment_status != current.payment_status {
        tracing::info!(
            order_id = %order.id,
            from = %current.status,
            to = %order.status,
            payment = %order.payment_status,
            "order status changed"
        );
    }
    Ok(Json(order))
}

/// `DELETE /shops/{shop_id}/orders/{id}` - cancel the order.
#[instrument(skip(state))]
pub async fn cancel(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, OrderId)>,
) -> Result<Json<Order>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let repo = OrderRepository::new(state.pool());
    let current = repo
        .get(shop_id, id)
        .await?
        .ok_or_else(|| not_found("Order"))?;
    current.status.transition_to(OrderStatus::Cancelled)?;

    let order = repo
        .cancel(shop_id, id, current.status)
        .await?
        .ok_or_else(|| AppError::Conflict(CONCURRENT_CHANGE.to_string()))?;

    tracing::info!(order_id = %order.id, from = %current.status, "order cancelled");
    Ok(Json(order))
}

/// Reject status changes the transition tables do not allow.
fn check_transitions(current: &Order, update: &PartialUpdate) -> Result<(), AppError> {
    if let Some(next) = update.text("status") {
        let next = next
            .parse::<OrderStatus>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        current.status.transition_to(next)?;
    }
    if let Some(next) = update.text("payment_status") {
        let next = next
            .parse::<PaymentStatus>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        current.payment_status.transition_to(next)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::models::{BillingAddress, ShippingAddress};

    use super::*;

    fn order(status: OrderStatus, payment_status: PaymentStatus) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::random(),
            shop_id: ShopId::random(),
            customer_id: None,
            order_number: "ORD-1".to_string(),
            status,
            payment_status,
            subtotal: Decimal::TEN,
            shipping: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::TEN,
            currency: "EUR".to_string(),
            shipping_address: ShippingAddress::default(),
            billing_address: BillingAddress::default(),
            payment_method: None,
            shipping_method: None,
            tracking_number: None,
            customer_note: None,
            internal_note: None,
            coupon_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn update(body: Value) -> PartialUpdate {
        ORDER_UPDATE.filter(body.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_allowed_transitions_pass() {
        let current = order(OrderStatus::Pending, PaymentStatus::Pending);
        let change = update(json!({ "status": "processing", "payment_status": "completed" }));
        assert!(check_transitions(&current, &change).is_ok());
    }

    #[test]
    fn test_illegal_order_transition_rejected() {
        let current = order(OrderStatus::Delivered, PaymentStatus::Paid);
        let err = check_transitions(&current, &update(json!({ "status": "pending" }))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_illegal_payment_transition_rejected() {
        let current = order(OrderStatus::Processing, PaymentStatus::Refunded);
        let err = check_transitions(&current, &update(json!({ "payment_status": "paid" })))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_same_status_is_a_no_op() {
        let current = order(OrderStatus::Shipped, PaymentStatus::Paid);
        let change = update(json!({ "status": "shipped", "tracking_number": "SK123" }));
        assert!(check_transitions(&current, &change).is_ok());
    }

    #[test]
    fn test_notes_skip_transition_checks() {
        let current = order(OrderStatus::Cancelled, PaymentStatus::Failed);
        assert!(check_transitions(&current, &update(json!({ "internal_note": "x" }))).is_ok());
    }
}
