//! Owner shipping method routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{ShippingMethodId, ShopId, is_storable_amount};

use crate::db::shipping::SHIPPING_UPDATE;
use crate::db::{ShippingMethodRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{CreateShippingMethodInput, ShippingMethod};
use crate::routes::{missing, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<Vec<ShippingMethod>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let methods = ShippingMethodRepository::new(state.pool())
        .list(shop_id)
        .await?;
    Ok(Json(methods))
}

#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(input): AppJson<CreateShippingMethodInput>,
) -> Result<(StatusCode, Json<ShippingMethod>), AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Shipping method name is required".to_string(),
        ));
    }
    if !is_storable_amount(input.price) || input.free_above.is_some_and(|f| !is_storable_amount(f)) {
        return Err(AppError::BadRequest(
            "Shipping prices must be between 0 and 9999999999.99".to_string(),
        ));
    }

    let method = ShippingMethodRepository::new(state.pool())
        .create(shop_id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(method)))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, ShippingMethodId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<ShippingMethod>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = SHIPPING_UPDATE.filter(&body)?;
    let method = ShippingMethodRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Shipping method"))?;
    Ok(Json(method))
}

#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, ShippingMethodId)>,
) -> Result<StatusCode, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    ShippingMethodRepository::new(state.pool())
        .delete(shop_id, id)
        .await
        .map_err(missing("Shipping method"))?;
    Ok(StatusCode::NO_CONTENT)
}
