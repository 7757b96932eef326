//! Order aggregate: orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopforge_core::{CustomerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ShopId};

/// Delivery address snapshot taken at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    #[sqlx(rename = "shipping_first_name")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[sqlx(rename = "shipping_last_name")]
    #[serde(default)]
    pub last_name: Option<String>,
    #[sqlx(rename = "shipping_address")]
    #[serde(default)]
    pub address: Option<String>,
    #[sqlx(rename = "shipping_city")]
    #[serde(default)]
    pub city: Option<String>,
    #[sqlx(rename = "shipping_zip")]
    #[serde(default)]
    pub zip: Option<String>,
    #[sqlx(rename = "shipping_country")]
    #[serde(default)]
    pub country: Option<String>,
    #[sqlx(rename = "shipping_phone")]
    #[serde(default)]
    pub phone: Option<String>,
}

/// Billing address snapshot taken at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BillingAddress {
    #[sqlx(rename = "billing_first_name")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[sqlx(rename = "billing_last_name")]
    #[serde(default)]
    pub last_name: Option<String>,
    #[sqlx(rename = "billing_address")]
    #[serde(default)]
    pub address: Option<String>,
    #[sqlx(rename = "billing_city")]
    #[serde(default)]
    pub city: Option<String>,
    #[sqlx(rename = "billing_zip")]
    #[serde(default)]
    pub zip: Option<String>,
    #[sqlx(rename = "billing_country")]
    #[serde(default)]
    pub country: Option<String>,
    #[sqlx(rename = "billing_email")]
    #[serde(default)]
    pub email: Option<String>,
}

/// An order as stored. Money columns never change after creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    pub customer_id: Option<CustomerId>,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    #[sqlx(flatten)]
    pub billing_address: BillingAddress,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub tracking_number: Option<String>,
    pub customer_note: Option<String>,
    pub internal_note: Option<String>,
    pub coupon_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen order line.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

/// `GET /shops/{shop_id}/orders/{id}` response.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order row written by checkout. Status and payment status start `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub shop_id: ShopId,
    pub order_number: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    pub billing_address: BillingAddress,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub customer_note: Option<String>,
    pub coupon_code: Option<String>,
}

/// Priced line written by checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}
