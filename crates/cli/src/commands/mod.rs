//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Errors shared by commands that need a database connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Neither database URL variable is set.
    #[error("Missing environment variable: SHOPFORGE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Connection failed.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `SHOPFORGE_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("SHOPFORGE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = shopforge_api::db::create_pool(&url).await?;
    Ok(pool)
}
