//! Owner payment method routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{PaymentMethodId, ShopId};

use crate::db::payments::PAYMENT_UPDATE;
use crate::db::{PaymentMethodRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{CreatePaymentMethodInput, PaymentMethod};
use crate::routes::{missing, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let methods = PaymentMethodRepository::new(state.pool())
        .list(shop_id)
        .await?;
    Ok(Json(methods))
}

#[instrument(skip(state, input), fields(kind = %input.kind))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(input): AppJson<CreatePaymentMethodInput>,
) -> Result<(StatusCode, Json<PaymentMethod>), AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Payment method name is required".to_string(),
        ));
    }

    let method = PaymentMethodRepository::new(state.pool())
        .create(shop_id, &input)
        .await?;
    tracing::info!(%shop_id, payment_method_id = %method.id, "payment method created");
    Ok((StatusCode::CREATED, Json(method)))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, PaymentMethodId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<PaymentMethod>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = PAYMENT_UPDATE.filter(&body)?;
    let method = PaymentMethodRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Payment method"))?;
    Ok(Json(method))
}

#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, PaymentMethodId)>,
) -> Result<StatusCode, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    PaymentMethodRepository::new(state.pool())
        .delete(shop_id, id)
        .await
        .map_err(missing("Payment method"))?;
    Ok(StatusCode::NO_CONTENT)
}
