//! Caller identity extractors.
//!
//! The session carries a [`CurrentUser`] written by the login service.
//! These extractors only read it; they never authenticate.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a caller identity.
///
/// Rejects with `401 {"error": "Not logged in"}` when the session has none.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_shops(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("shops of {}", user.id)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        set_sentry_user(&user.id.to_string());
        Ok(Self(user))
    }
}

/// Extractor that requires a caller with the `super_admin` role.
///
/// Rejects with 401 without an identity and 403 for any other role.
pub struct RequireSuperAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        set_sentry_user(&user.id.to_string());

        if !user.is_super_admin() {
            return Err(AppError::Forbidden(
                "Only super admins can access this resource".to_string(),
            ));
        }

        Ok(Self(user))
    }
}

async fn current_user(parts: &Parts) -> Result<CurrentUser, AppError> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(not_logged_in)?;

    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or_else(not_logged_in)
}

fn not_logged_in() -> AppError {
    AppError::Unauthorized("Not logged in".to_string())
}
