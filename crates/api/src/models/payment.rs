//! Payment methods a shop offers at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopforge_core::{PaymentMethodId, PaymentProvider, ShopId};

/// A configured payment method.
///
/// `config` holds provider credentials and is only ever returned to the
/// shop's owner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub shop_id: ShopId,
    pub kind: PaymentProvider,
    pub name: String,
    pub description: Option<String>,
    pub config: Value,
    pub is_active: bool,
    pub is_test_mode: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront view of an active payment method.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicPaymentMethod {
    pub id: PaymentMethodId,
    pub kind: PaymentProvider,
    pub name: String,
    pub description: Option<String>,
}

/// Body of `POST /shops/{shop_id}/payment-methods`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentMethodInput {
    pub kind: PaymentProvider,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_test_mode: bool,
    #[serde(default)]
    pub position: i32,
}

const fn default_true() -> bool {
    true
}
