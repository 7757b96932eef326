//! Owner shop settings routes.

use axum::Json;
use axum::extract::State;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::ShopId;

use crate::db::settings::SETTINGS_UPDATE;
use crate::db::{SettingsRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::ShopSettings;
use crate::services::owned_shop;
use crate::state::AppState;

/// `GET /shops/{shop_id}/settings`, creating the defaults on first read.
#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<ShopSettings>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let settings = SettingsRepository::new(state.pool())
        .get_or_create(shop_id)
        .await?;
    Ok(Json(settings))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<ShopSettings>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = SETTINGS_UPDATE.filter(&body)?;
    let settings = SettingsRepository::new(state.pool())
        .update(shop_id, update)
        .await?;
    Ok(Json(settings))
}
