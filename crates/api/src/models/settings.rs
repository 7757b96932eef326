//! Per-shop business settings: invoicing identity, tax and thresholds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shopforge_core::ShopId;

/// The settings row of a shop. Created with defaults on first read.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShopSettings {
    pub shop_id: ShopId,
    pub company_name: Option<String>,
    /// Company registration number.
    pub ico: Option<String>,
    /// Tax identification number.
    pub dic: Option<String>,
    /// VAT number.
    pub ic_dph: Option<String>,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
    pub swift: Option<String>,
    pub invoice_prefix: String,
    pub invoice_next_number: i32,
    pub invoice_footer: Option<String>,
    pub tax_rate: Decimal,
    pub prices_include_tax: bool,
    pub min_order_value: Option<Decimal>,
    pub order_notify_email: Option<String>,
    pub low_stock_threshold: i32,
    pub terms_url: Option<String>,
    pub privacy_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
