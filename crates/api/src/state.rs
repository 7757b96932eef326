//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use shopforge_core::PageRequest;

use crate::config::ApiConfig;
use crate::services::OrderNumberGenerator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    order_numbers: OrderNumberGenerator,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                order_numbers: OrderNumberGenerator::new(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The process-wide order number generator.
    #[must_use]
    pub fn order_numbers(&self) -> &OrderNumberGenerator {
        &self.inner.order_numbers
    }

    /// Clamp raw `page`/`limit` query values with the configured bounds.
    #[must_use]
    pub fn page_request(&self, page: Option<u32>, limit: Option<u32>) -> PageRequest {
        let bounds = self.inner.config.pagination;
        PageRequest::new(page, limit, bounds.default_limit, bounds.max_limit)
    }
}
