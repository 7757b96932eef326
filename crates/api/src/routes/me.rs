//! Caller profile.

use axum::Json;
use axum::extract::State;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::db::UserRepository;
use crate::db::users::PROFILE_UPDATE;
use crate::error::{AppError, AppJson};
use crate::middleware::RequireUser;
use crate::models::User;
use crate::state::AppState;

/// `GET /me` - the caller's account, re-read from the database.
///
/// A session whose user was deleted or deactivated since login is treated
/// as logged out.
#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    match UserRepository::new(state.pool()).get_by_id(user.id).await? {
        Some(account) if account.is_active => Ok(Json(account)),
        _ => Err(AppError::Unauthorized("Not logged in".to_string())),
    }
}

/// `PUT /me` - rename the caller's account.
#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<User>, AppError> {
    let update = PROFILE_UPDATE.filter(&body)?;
    if update.text("name").is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    UserRepository::new(state.pool())
        .update_profile(user.id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))
}
