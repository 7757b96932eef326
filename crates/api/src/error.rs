//! Unified error handling for the API.
//!
//! Every handler returns `Result<_, AppError>`. Errors render as
//! `{"error": "<message>"}` with the matching status code; server-side
//! failures are reported to Sentry and never leak their details.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use shopforge_core::TransitionError;

use crate::db::RepositoryError;
use crate::db::update::UpdateError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Repository failure; `NotFound` and `Conflict` keep their status.
    #[error("repository: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found, or not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Caller identity is missing.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the required role.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed or semantically invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with current state (price drift, duplicate key).
    #[error("{0}")]
    Conflict(String),
}

impl AppError {
    /// The message shown for a missing shop or a shop owned by someone else.
    #[must_use]
    pub fn shop_not_found() -> Self {
        Self::NotFound("Shop not found".to_string())
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl AppError {
    /// Message safe to show to the client.
    pub(crate) fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let sentry_event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, %sentry_event_id, "request failed");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid identifier: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

/// `Json` extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `Query` extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors_show_their_message() {
        assert_eq!(AppError::shop_not_found().to_string(), "Shop not found");
        let err = AppError::BadRequest("No valid fields to update".to_string());
        assert_eq!(err.to_string(), "No valid fields to update");
    }

    #[rstest]
    #[case::not_found(AppError::shop_not_found(), StatusCode::NOT_FOUND)]
    #[case::unauthorized(AppError::Unauthorized("Not logged in".into()), StatusCode::UNAUTHORIZED)]
    #[case::forbidden(AppError::Forbidden("admins only".into()), StatusCode::FORBIDDEN)]
    #[case::bad_request(AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST)]
    #[case::conflict(AppError::Conflict("drift".into()), StatusCode::CONFLICT)]
    #[case::database(
        AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_variants_map_to_status(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(status_of(err), expected);
    }

    #[test]
    fn test_repository_errors_map_to_status() {
        assert_eq!(
            status_of(AppError::from(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::from(RepositoryError::Conflict("slug taken".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::from(RepositoryError::DataCorruption("bad".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response =
            AppError::from(RepositoryError::DataCorruption("secret detail".to_string()))
                .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"], "Internal server error");
    }
}
