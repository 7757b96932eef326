//! Shopforge API server.
//!
//! Serves the owner, storefront and super-admin REST API under `/api/v1`.
//! Caller identity comes from the session written by the login service;
//! this binary never authenticates anyone itself.
//!
//! Migrations are not run on startup; use `shopforge-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::http::{Method, header};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use shopforge_api::config::ApiConfig;
use shopforge_api::db;
use shopforge_api::middleware::create_session_layer;
use shopforge_api::routes;
use shopforge_api::state::AppState;
use shopforge_api::telemetry;

/// Storefront pages on other origins call the public routes.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[tokio::main]
async fn main() {
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Sentry first, so the tracing layer can attach to its client.
    let _sentry = telemetry::init_sentry(&config);
    telemetry::init_tracing(&config);

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let sessions = create_session_layer(&pool, &config).expect("Invalid session store");
    let addr = config.socket_addr();

    let app = routes::routes()
        .layer(sessions)
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(telemetry::request_span)
                .on_response(telemetry::record_response),
        )
        .with_state(AppState::new(config, pool))
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "shopforge api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "ctrl-c listener failed");
                }
            }
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c listener failed");
    }

    tracing::info!("shutdown requested, draining connections");
}
