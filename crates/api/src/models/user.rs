//! Platform user accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopforge_core::{UserId, UserRole};

use super::ShopSummary;

/// A platform account (shop owner or super-admin).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /admin/users/{id}`: the account and the shops it owns.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub shops: Vec<ShopSummary>,
}
