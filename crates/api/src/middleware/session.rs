//! Session store wiring.
//!
//! Sessions live in `shopforge.session` and are shared with the login
//! service, which writes the caller identity into them. Cookie attributes
//! must match what that service sets.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopforge_session";

/// Schema and table created by the initial migration.
pub const SESSION_SCHEMA: &str = "shopforge";
pub const SESSION_TABLE: &str = "session";

/// Idle time after which a session expires.
const IDLE_EXPIRY: Duration = Duration::days(7);

/// Build the session layer over the shared `PostgreSQL` store.
///
/// # Errors
///
/// Returns the store's message if the schema or table name is rejected.
pub fn create_session_layer(
    pool: &PgPool,
    config: &ApiConfig,
) -> Result<SessionManagerLayer<PostgresStore>, String> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)?
        .with_table_name(SESSION_TABLE)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(IDLE_EXPIRY))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}
