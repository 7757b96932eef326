//! Database access for Shopforge `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Platform accounts (owners and super-admins)
//! - `shops` - Tenant roots; every other table below carries `shop_id`
//! - `categories`, `products` - Catalog
//! - `customers` - Per-shop customer records
//! - `shipping_methods`, `payment_methods`, `coupons` - Checkout configuration
//! - `shop_settings` - Invoicing identity, tax and thresholds (one row per shop)
//! - `orders`, `order_items` - Order aggregate
//! - `shopforge.session` - Session storage (tower-sessions)
//!
//! Queries are runtime-checked (`query_as::<_, Row>`); dynamic statements go
//! through [`update`] and [`listing`] so every value is a bound parameter.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shopforge-cli -- migrate
//! ```

pub mod categories;
pub mod coupons;
pub mod customers;
pub mod listing;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;
pub mod shipping;
pub mod shops;
pub mod update;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use coupons::CouponRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use payments::PaymentMethodRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use shipping::ShippingMethodRepository;
pub use shops::ShopRepository;
pub use users::UserRepository;

/// Failure of a repository call.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer parses into its domain type.
    #[error("stored data is invalid: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// Unique index hit; the message is safe to show to the caller.
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict(message)`; pass every
    /// other error through as `Database`.
    pub(crate) fn unique_or_database(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_string());
        }
        Self::Database(err)
    }

    /// Like [`Self::unique_or_database`] for tables with several unique
    /// constraints: the message is picked by the violated constraint's name.
    pub(crate) fn unique_by_constraint(err: sqlx::Error, messages: &[(&str, &str)]) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message(db_err.constraint(), messages).to_string());
        }
        Self::Database(err)
    }
}

/// Message for a violated unique constraint, by constraint name.
fn conflict_message<'m>(constraint: Option<&str>, messages: &[(&str, &'m str)]) -> &'m str {
    constraint
        .and_then(|name| messages.iter().find(|(c, _)| *c == name))
        .map_or("Value already in use", |(_, message)| *message)
}

/// Upper bound on pooled connections per process.
const MAX_CONNECTIONS: u32 = 10;

/// Open the bounded connection pool shared by every request.
///
/// # Errors
///
/// Fails if no connection can be opened within the acquire timeout.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGES: &[(&str, &str)] = &[
        ("shops_slug_key", "Shop slug already taken"),
        ("shops_custom_domain_key", "Custom domain already in use"),
    ];

    #[test]
    fn test_conflict_message_by_constraint() {
        assert_eq!(
            conflict_message(Some("shops_custom_domain_key"), MESSAGES),
            "Custom domain already in use"
        );
        assert_eq!(
            conflict_message(Some("shops_slug_key"), MESSAGES),
            "Shop slug already taken"
        );
        assert_eq!(conflict_message(Some("other_key"), MESSAGES), "Value already in use");
        assert_eq!(conflict_message(None, MESSAGES), "Value already in use");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = RepositoryError::unique_by_constraint(sqlx::Error::RowNotFound, MESSAGES);
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
