//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Readiness (database ping)
//!
//! # Profile (session required)
//! GET|PUT /api/v1/me                            - Caller's account (PUT renames)
//!
//! # Owner (session required, ownership checked per request)
//! GET|POST       /api/v1/shops
//! GET|PUT|DELETE /api/v1/shops/{shop_id}
//! GET|POST       /api/v1/shops/{shop_id}/products
//! POST           /api/v1/shops/{shop_id}/products/import     - Bulk create
//! GET            /api/v1/shops/{shop_id}/products/export     - JSON download
//! GET|PUT|DELETE /api/v1/shops/{shop_id}/products/{id}
//! GET|POST       /api/v1/shops/{shop_id}/categories
//! PUT|DELETE     /api/v1/shops/{shop_id}/categories/{id}
//! GET            /api/v1/shops/{shop_id}/orders
//! GET|PUT|DELETE /api/v1/shops/{shop_id}/orders/{id}          (DELETE cancels)
//! GET            /api/v1/shops/{shop_id}/customers
//! GET|PUT        /api/v1/shops/{shop_id}/customers/{id}
//! GET|POST       /api/v1/shops/{shop_id}/shipping-methods
//! PUT|DELETE     /api/v1/shops/{shop_id}/shipping-methods/{id}
//! GET|POST       /api/v1/shops/{shop_id}/coupons
//! PUT|DELETE     /api/v1/shops/{shop_id}/coupons/{id}
//! GET|POST       /api/v1/shops/{shop_id}/payment-methods
//! PUT|DELETE     /api/v1/shops/{shop_id}/payment-methods/{id}
//! GET|PUT        /api/v1/shops/{shop_id}/settings
//!
//! # Storefront (public, published + active shops only)
//! GET  /api/v1/shop/{slug}
//! GET  /api/v1/shop/{slug}/products
//! GET  /api/v1/shop/{slug}/products/{product_slug}
//! GET  /api/v1/shop/{slug}/categories
//! GET  /api/v1/shop/{slug}/shipping-methods
//! GET  /api/v1/shop/{slug}/payment-methods
//! POST /api/v1/shop/{slug}/orders               - Checkout
//!
//! # Super-admin
//! GET        /api/v1/admin/shops
//! PUT|DELETE /api/v1/admin/shops/{id}
//! GET        /api/v1/admin/users
//! GET|PUT|DELETE /api/v1/admin/users/{id}
//! ```

pub mod admin;
pub mod categories;
pub mod coupons;
pub mod customers;
pub mod health;
pub mod me;
pub mod orders;
pub mod payments;
pub mod products;
pub mod public;
pub mod settings;
pub mod shipping;
pub mod shops;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// Common query parameters of paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// `404 {"error": "<what> not found"}`.
pub(crate) fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found"))
}

/// Map a repository `NotFound` to [`not_found`], passing other errors on.
pub(crate) fn missing(what: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => not_found(what),
        other => AppError::Database(other),
    }
}

/// Create the owner routes router, nested under `/shops`.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shops::index).post(shops::create))
        .route(
            "/{shop_id}",
            get(shops::show).put(shops::update).delete(shops::delete),
        )
        // Catalog
        .route(
            "/{shop_id}/products",
            get(products::index).post(products::create),
        )
        .route("/{shop_id}/products/import", post(products::import))
        .route("/{shop_id}/products/export", get(products::export))
        .route(
            "/{shop_id}/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/{shop_id}/categories",
            get(categories::index).post(categories::create),
        )
        .route(
            "/{shop_id}/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        // Sales
        .route("/{shop_id}/orders", get(orders::index))
        .route(
            "/{shop_id}/orders/{id}",
            get(orders::show).put(orders::update).delete(orders::cancel),
        )
        .route("/{shop_id}/customers", get(customers::index))
        .route(
            "/{shop_id}/customers/{id}",
            get(customers::show).put(customers::update),
        )
        // Settings
        .route(
            "/{shop_id}/shipping-methods",
            get(shipping::index).post(shipping::create),
        )
        .route(
            "/{shop_id}/shipping-methods/{id}",
            put(shipping::update).delete(shipping::delete),
        )
        .route(
            "/{shop_id}/coupons",
            get(coupons::index).post(coupons::create),
        )
        .route(
            "/{shop_id}/coupons/{id}",
            put(coupons::update).delete(coupons::delete),
        )
        .route(
            "/{shop_id}/payment-methods",
            get(payments::index).post(payments::create),
        )
        .route(
            "/{shop_id}/payment-methods/{id}",
            put(payments::update).delete(payments::delete),
        )
        .route(
            "/{shop_id}/settings",
            get(settings::show).put(settings::update),
        )
}

/// Create the public storefront router, nested under `/shop/{slug}`.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::shop))
        .route("/products", get(public::products))
        .route("/products/{product_slug}", get(public::product))
        .route("/categories", get(public::categories))
        .route("/shipping-methods", get(public::shipping_methods))
        .route("/payment-methods", get(public::payment_methods))
        .route("/orders", post(public::checkout))
}

/// Create the super-admin router, nested under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/shops", get(admin::shops))
        .route(
            "/shops/{id}",
            put(admin::update_shop).delete(admin::delete_shop),
        )
        .route("/users", get(admin::users))
        .route(
            "/users/{id}",
            get(admin::user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
}

/// Create the `/api/v1` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::show).put(me::update))
        .nest("/shops", owner_routes())
        .nest("/shop/{slug}", storefront_routes())
        .nest("/admin", admin_routes())
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::extract::Request;
    use axum::http::{Method, StatusCode, header};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

    use shopforge_core::{UserId, UserRole};

    use super::*;
    use crate::config::ApiConfig;
    use crate::models::{CurrentUser, session_keys};

    fn state() -> AppState {
        let config = ApiConfig::from_source(&|key| match key {
            "SHOPFORGE_DATABASE_URL" => Some("postgres://localhost/shopforge_test".to_string()),
            "SHOPFORGE_BASE_URL" => Some("http://localhost:8080".to_string()),
            _ => None,
        })
        .unwrap();
        // Never connects unless a handler reaches the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/shopforge_test")
            .unwrap();
        AppState::new(config, pool)
    }

    /// The app with an in-memory session that carries `caller`, as if the
    /// login service had written it.
    fn app(caller: Option<CurrentUser>) -> Router {
        let login = move |session: Session, request: Request, next: Next| async move {
            if let Some(user) = caller {
                session
                    .insert(session_keys::CURRENT_USER, user)
                    .await
                    .unwrap();
            }
            next.run(request).await
        };

        routes()
            .layer(middleware::from_fn(login))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
            .with_state(state())
    }

    fn user(role: UserRole) -> Option<CurrentUser> {
        Some(CurrentUser {
            id: UserId::random(),
            role,
        })
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.oneshot(request.body(body).unwrap()).await.unwrap()
    }

    async fn error_message(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(app(None), Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_owner_routes_require_identity() {
        let response = send(app(None), Method::GET, "/api/v1/shops", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "Not logged in");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_plain_users() {
        let response = send(
            app(user(UserRole::User)),
            Method::GET,
            "/api/v1/admin/users",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_delete_is_admin_only() {
        let uri = format!("/api/v1/admin/users/{}", uuid::Uuid::new_v4());
        let response = send(app(user(UserRole::User)), Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile_update_requires_identity() {
        let response = send(
            app(None),
            Method::PUT,
            "/api/v1/me",
            Some(r#"{"name": "Jana"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_import_requires_identity() {
        let uri = format!("/api/v1/shops/{}/products/import", uuid::Uuid::new_v4());
        let response = send(app(None), Method::POST, &uri, Some(r#"{"products": []}"#)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_require_identity() {
        let response = send(app(None), Method::GET, "/api/v1/admin/shops", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_shop_id_is_bad_request() {
        let response = send(
            app(user(UserRole::User)),
            Method::GET,
            "/api/v1/shops/not-a-uuid/products",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.starts_with("Invalid identifier"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let uri = format!("/api/v1/shops/{}", uuid::Uuid::new_v4());
        let response = send(
            app(user(UserRole::User)),
            Method::PUT,
            &uri,
            Some("{not json"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_checkout_body_is_validated_before_lookup() {
        let response = send(
            app(None),
            Method::POST,
            "/api/v1/shop/cajovna/orders",
            Some(r#"{"items": "two teas"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = send(app(None), Method::GET, "/api/v1/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
