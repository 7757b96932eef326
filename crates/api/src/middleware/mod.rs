//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. `CorsLayer`
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is not a layer: handlers opt in with the [`auth`]
//! extractors, which read the caller identity out of the session.

pub mod auth;
pub mod session;

pub use auth::{RequireSuperAdmin, RequireUser};
pub use session::create_session_layer;
