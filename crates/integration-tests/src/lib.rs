//! Integration tests for Shopforge.
//!
//! The tests talk HTTP to a running API server and seed fixtures straight
//! into its database. They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! shopforge-cli migrate
//! cargo run -p shopforge-api &
//! cargo test -p shopforge-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFORGE_TEST_URL` - API base URL (default `http://localhost:8080`)
//! - `SHOPFORGE_DATABASE_URL` - database the server is using

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;

use reqwest::Client;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use shopforge_core::{UserId, UserRole};

/// Cookie and session layout shared with the API server.
const SESSION_COOKIE_NAME: &str = "shopforge_session";
const SESSION_SCHEMA: &str = "shopforge";
const SESSION_TABLE: &str = "session";
const CURRENT_USER_KEY: &str = "current_user";

/// HTTP client, base URL and a database handle for fixtures.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the server's database and build a client.
    pub async fn new() -> Self {
        let base_url = std::env::var("SHOPFORGE_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let database_url = std::env::var("SHOPFORGE_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("SHOPFORGE_DATABASE_URL must be set for integration tests");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        Self {
            client: Client::new(),
            base_url,
            pool,
        }
    }

    /// Absolute URL for an API path such as `/api/v1/shop/x`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Insert a user with a random email and return its id.
    pub async fn seed_user(&self) -> Uuid {
        sqlx::query_scalar("INSERT INTO users (email, name) VALUES ($1, 'Test Owner') RETURNING id")
            .bind(format!("owner-{}@test.shopforge.dev", Uuid::new_v4()))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to seed user")
    }

    /// Write a session for `user_id` the way the login service does and
    /// return the `Cookie` header value that selects it.
    pub async fn seed_session(&self, user_id: Uuid, role: UserRole) -> String {
        let store = PostgresStore::new(self.pool.clone())
            .with_schema_name(SESSION_SCHEMA)
            .and_then(|store| store.with_table_name(SESSION_TABLE))
            .expect("Invalid session table");

        let identity = serde_json::json!({ "id": UserId::new(user_id), "role": role });
        let mut record = Record {
            id: Id::default(),
            data: HashMap::from([(CURRENT_USER_KEY.to_string(), identity)]),
            expiry_date: OffsetDateTime::now_utc() + Duration::hours(1),
        };
        store
            .create(&mut record)
            .await
            .expect("Failed to seed session");

        format!("{SESSION_COOKIE_NAME}={}", record.id)
    }

    /// Insert a shop with a random slug; returns `(id, slug)`.
    pub async fn seed_shop(&self, owner: Uuid, published: bool) -> (Uuid, String) {
        let slug = format!("test-{}", Uuid::new_v4().simple());
        let id = sqlx::query_scalar(
            "INSERT INTO shops (user_id, name, slug, is_published) \
             VALUES ($1, 'Test Shop', $2, $3) RETURNING id",
        )
        .bind(owner)
        .bind(&slug)
        .bind(published)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed shop");
        (id, slug)
    }

    /// Insert an active product and return its id.
    pub async fn seed_product(&self, shop_id: Uuid, name: &str, price: Decimal) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO products (shop_id, name, slug, price, quantity) \
             VALUES ($1, $2, $3, $4, 10) RETURNING id",
        )
        .bind(shop_id)
        .bind(name)
        .bind(format!("p-{}", Uuid::new_v4().simple()))
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed product")
    }

    /// Insert a shipping method.
    pub async fn seed_shipping(&self, shop_id: Uuid, name: &str, price: Decimal) {
        sqlx::query("INSERT INTO shipping_methods (shop_id, name, price) VALUES ($1, $2, $3)")
            .bind(shop_id)
            .bind(name)
            .bind(price)
            .execute(&self.pool)
            .await
            .expect("Failed to seed shipping method");
    }

    /// Whether a shop row still exists.
    pub async fn shop_exists(&self, shop_id: Uuid) -> bool {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shops WHERE id = $1)")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to look up shop")
    }

    /// Number of orders stored for a shop.
    pub async fn order_count(&self, shop_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count orders")
    }

    /// Remove a seeded user and, by cascade, everything they own.
    pub async fn cleanup(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await;
    }
}
