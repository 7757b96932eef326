//! Owner category routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{CategoryId, ShopId};

use crate::db::categories::CATEGORY_UPDATE;
use crate::db::{CategoryRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{Category, CreateCategoryInput};
use crate::routes::shops::requested_slug;
use crate::routes::{missing, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

/// `GET /shops/{shop_id}/categories` - ordered by position, then name.
#[instrument(skip(state))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<Vec<Category>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let categories = CategoryRepository::new(state.pool()).list(shop_id).await?;
    Ok(Json(categories))
}

#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(input): AppJson<CreateCategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Category name is required".to_string()));
    }

    let repo = CategoryRepository::new(state.pool());
    if let Some(parent_id) = input.parent_id
        && !repo.belongs_to(shop_id, parent_id).await?
    {
        return Err(AppError::BadRequest("Unknown parent category".to_string()));
    }

    // Duplicate slugs surface as a conflict from the unique index.
    let slug = requested_slug(input.slug.as_deref(), &input.name)?;
    let category = repo.create(shop_id, &slug, &input).await?;

    tracing::info!(%shop_id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CategoryId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Category>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = CATEGORY_UPDATE.filter(&body)?;
    let category = CategoryRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Category"))?;
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CategoryId)>,
) -> Result<StatusCode, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    CategoryRepository::new(state.pool())
        .delete(shop_id, id)
        .await
        .map_err(missing("Category"))?;
    Ok(StatusCode::NO_CONTENT)
}
