//! Logging, request spans and Sentry.
//!
//! Log output goes through `tracing-subscriber`, as JSON when
//! `SHOPFORGE_LOG_JSON` is set. With a `SENTRY_DSN`, warnings and errors are
//! sent to Sentry as events and info/debug lines ride along as breadcrumbs.

use std::borrow::Cow;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tower_http::trace::{DefaultOnResponse, OnResponse};
use tracing::{Level, Metadata, Span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::ApiConfig;

/// Log directives used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "shopforge_api=info,tower_http=debug";

/// Start the Sentry client when a DSN is configured.
///
/// The returned guard flushes pending events on drop and must live as long
/// as the server.
#[must_use]
pub fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    Some(guard)
}

/// Install the global subscriber. Call after [`init_sentry`].
pub fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let (json, text) = if config.log_json {
        (
            Some(tracing_subscriber::fmt::layer().json().flatten_event(true)),
            None,
        )
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();

    if config.sentry_dsn.is_some() {
        tracing::info!(
            environment = config.sentry_environment.as_deref().unwrap_or("default"),
            "sentry reporting enabled"
        );
    }
}

fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    let level = *metadata.level();
    if level <= Level::WARN {
        EventFilter::Event
    } else if level <= Level::DEBUG {
        EventFilter::Breadcrumb
    } else {
        EventFilter::Ignore
    }
}

/// Span opened for every HTTP request; `status` and `latency_ms` are filled
/// in by [`record_response`].
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    )
}

/// Record the outcome of a request on its span.
pub fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
    span.record(
        "latency_ms",
        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
    );
    DefaultOnResponse::new()
        .level(Level::INFO)
        .on_response(response, latency, span);
}
