//! Shops: the tenant root.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopforge_core::{ShopId, UserId};

/// A shop as its owner sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Shop {
    pub id: ShopId,
    pub user_id: UserId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub currency: String,
    pub language: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: bool,
    pub is_published: bool,
    pub custom_domain: Option<String>,
    pub domain_verified: bool,
    pub ssl_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Visible on the public storefront routes.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_active && self.is_published
    }
}

/// The storefront-facing subset of a shop. Never carries the owner.
#[derive(Debug, Clone, Serialize)]
pub struct PublicShop {
    pub id: ShopId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub currency: String,
    pub language: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl From<Shop> for PublicShop {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name,
            slug: shop.slug,
            description: shop.description,
            logo: shop.logo,
            currency: shop.currency,
            language: shop.language,
            email: shop.email,
            phone: shop.phone,
            address: shop.address,
            city: shop.city,
            zip: shop.zip,
            country: shop.country,
            meta_title: shop.meta_title,
            meta_description: shop.meta_description,
        }
    }
}

/// Row of the super-admin shop listing: shop, owner and a few counters.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminShopListItem {
    pub id: ShopId,
    pub user_id: UserId,
    pub name: String,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub domain_verified: bool,
    pub is_active: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_email: String,
    pub user_name: String,
    pub products_count: i64,
    pub orders_count: i64,
    pub revenue: Decimal,
}

/// One shop of a user in the super-admin user detail.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShopSummary {
    pub id: ShopId,
    pub name: String,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub is_active: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub products_count: i64,
    pub orders_count: i64,
    /// Sum of paid order totals.
    pub revenue: Decimal,
}

/// Body of `POST /shops`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShopInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}
