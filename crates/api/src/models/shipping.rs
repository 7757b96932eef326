//! Shipping methods.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopforge_core::{ShippingMethodId, ShopId};

/// A flat-rate shipping method.
///
/// `free_above` is informational for storefronts; checkout always charges
/// `price` for the selected method.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub shop_id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub free_above: Option<Decimal>,
    pub is_active: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront view of an active shipping method.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub free_above: Option<Decimal>,
}

/// Body of `POST /shops/{shop_id}/shipping-methods`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShippingMethodInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub free_above: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub position: i32,
}

const fn default_true() -> bool {
    true
}
