//! Super-admin routes.
//!
//! Platform-wide views over every shop and user. No ownership check applies
//! here; the [`RequireSuperAdmin`] extractor is the only gate.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{Page, ShopId, UserId, UserRole};

use crate::db::shops::{ADMIN_SHOP_UPDATE, ShopStatusFilter};
use crate::db::update::{FieldValue, PartialUpdate};
use crate::db::users::USER_UPDATE;
use crate::db::{RepositoryError, ShopRepository, UserRepository};
use crate::error::{AppError, AppJson, AppPath, AppQuery};
use crate::middleware::RequireSuperAdmin;
use crate::models::{AdminShopListItem, CurrentUser, Shop, User, UserDetail};
use crate::routes::not_found;
use crate::state::AppState;

/// Query parameters of `GET /admin/shops`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminShopParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<ShopStatusFilter>,
}

/// Query parameters of `GET /admin/users`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUserParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

#[instrument(skip(state, params))]
pub async fn shops(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdminShopParams>,
) -> Result<Json<Page<AdminShopListItem>>, AppError> {
    let page = state.page_request(params.page, params.limit);
    let shops = ShopRepository::new(state.pool())
        .admin_list(params.search.as_deref(), params.status, page)
        .await?;
    Ok(Json(shops))
}

#[instrument(skip(state, body))]
pub async fn update_shop(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Shop>, AppError> {
    let update = ADMIN_SHOP_UPDATE.filter(&body)?;
    let shop = ShopRepository::new(state.pool())
        .admin_update(shop_id, update)
        .await?
        .ok_or_else(AppError::shop_not_found)?;

    tracing::info!(%shop_id, admin_id = %admin.id, "shop updated by admin");
    Ok(Json(shop))
}

#[instrument(skip(state))]
pub async fn delete_shop(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<StatusCode, AppError> {
    ShopRepository::new(state.pool())
        .admin_delete(shop_id)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => AppError::shop_not_found(),
            other => other.into(),
        })?;

    tracing::warn!(%shop_id, admin_id = %admin.id, "shop deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, params))]
pub async fn users(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdminUserParams>,
) -> Result<Json<Page<User>>, AppError> {
    let page = state.page_request(params.page, params.limit);
    let users = UserRepository::new(state.pool())
        .list(params.search.as_deref(), params.role, page)
        .await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn user(
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppPath(user_id): AppPath<UserId>,
) -> Result<Json<UserDetail>, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;
    let shops = ShopRepository::new(state.pool())
        .summaries_for_user(user_id)
        .await?;

    Ok(Json(UserDetail { user, shops }))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppPath(user_id): AppPath<UserId>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<User>, AppError> {
    let update = USER_UPDATE.filter(&body)?;
    guard_self_lockout(&admin, user_id, &update)?;

    let user = UserRepository::new(state.pool())
        .update(user_id, update)
        .await?
        .ok_or_else(|| not_found("User"))?;

    tracing::info!(%user_id, admin_id = %admin.id, role = %user.role, "user updated by admin");
    Ok(Json(user))
}

/// Deletes the account and every shop it owns.
#[instrument(skip(state))]
pub async fn delete_user(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    AppPath(user_id): AppPath<UserId>,
) -> Result<StatusCode, AppError> {
    let users = UserRepository::new(state.pool());
    let target = users
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;
    guard_deletable(&admin, &target)?;

    users.delete(user_id).await.map_err(|err| match err {
        RepositoryError::NotFound => not_found("User"),
        other => other.into(),
    })?;

    tracing::warn!(%user_id, admin_id = %admin.id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// Super-admin accounts, the caller's included, cannot be deleted.
fn guard_deletable(admin: &CurrentUser, target: &User) -> Result<(), AppError> {
    if target.role == UserRole::SuperAdmin || target.id == admin.id {
        return Err(AppError::Forbidden("Cannot delete super admin".to_string()));
    }
    Ok(())
}

/// A super-admin may not demote or deactivate their own account.
fn guard_self_lockout(
    admin: &CurrentUser,
    target: UserId,
    update: &PartialUpdate,
) -> Result<(), AppError> {
    if admin.id != target {
        return Ok(());
    }
    let demotes = update
        .text("role")
        .is_some_and(|role| role != UserRole::SuperAdmin.as_str());
    let deactivates = matches!(update.get("is_active"), Some(FieldValue::Boolean(false)));

    if demotes || deactivates {
        return Err(AppError::BadRequest(
            "You cannot demote or deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn admin() -> CurrentUser {
        CurrentUser {
            id: UserId::random(),
            role: UserRole::SuperAdmin,
        }
    }

    fn update(body: Value) -> PartialUpdate {
        USER_UPDATE.filter(body.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let me = admin();
        assert!(guard_self_lockout(&me, me.id, &update(json!({ "role": "user" }))).is_err());
        assert!(guard_self_lockout(&me, me.id, &update(json!({ "is_active": false }))).is_err());
    }

    #[test]
    fn test_admin_may_rename_self() {
        let me = admin();
        assert!(guard_self_lockout(&me, me.id, &update(json!({ "name": "Jana" }))).is_ok());
    }

    fn account(role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id: UserId::random(),
            email: "jana@example.sk".to_string(),
            name: "Jana".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_super_admin_cannot_be_deleted() {
        let me = admin();
        let err = guard_deletable(&me, &account(UserRole::SuperAdmin)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.public_message(), "Cannot delete super admin");

        let mut myself = account(UserRole::SuperAdmin);
        myself.id = me.id;
        assert!(guard_deletable(&me, &myself).is_err());
    }

    #[test]
    fn test_owner_account_can_be_deleted() {
        assert!(guard_deletable(&admin(), &account(UserRole::User)).is_ok());
    }

    #[test]
    fn test_admin_may_demote_others() {
        let me = admin();
        let other = UserId::random();
        assert!(guard_self_lockout(&me, other, &update(json!({ "role": "user" }))).is_ok());
    }
}
