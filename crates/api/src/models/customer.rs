//! Per-shop customer records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopforge_core::{CustomerId, ShopId};

/// A customer of one shop.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub shop_id: ShopId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub accepts_marketing: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
