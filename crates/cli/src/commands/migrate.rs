//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time. The API server never runs them on startup.

use super::{ConnectError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
