//! Whitelisted partial updates.
//!
//! Owner-facing `PUT` endpoints accept an arbitrary JSON object. A
//! [`Whitelist`] decides which keys may touch which column and how each value
//! is validated; everything else in the body is ignored. The surviving
//! assignments become a single `UPDATE ... SET a = $1, b = $2, updated_at =
//! NOW()` with bound parameters, emitted in whitelist order.
//!
//! ```rust,ignore
//! const PRODUCT: Whitelist = Whitelist::new("products", &[
//!     Field::new("name", FieldKind::Text),
//!     Field::new("price", FieldKind::Money),
//! ]);
//!
//! let update = PRODUCT.filter(&body)?;
//! let mut query = update.into_query(product_id.as_uuid());
//! query.push(" AND shop_id = ").push_bind(shop_id);
//! query.build().execute(pool).await?;
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use shopforge_core::{is_storable_amount, is_valid_slug, round_money};

/// Errors produced while filtering an update body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// No whitelisted key was present.
    #[error("No valid fields to update")]
    Empty,

    /// A whitelisted key carried a value of the wrong shape.
    #[error("Invalid value for '{field}': expected {expected}")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

/// Parser for closed-set text columns: returns the canonical spelling.
pub type EnumParser = fn(&str) -> Option<&'static str>;

/// How a whitelisted value is validated and bound.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Non-empty string.
    Text,
    /// String or `null`.
    NullableText,
    /// Lowercase URL slug.
    Slug,
    /// Non-empty code, stored upper-cased (coupon codes).
    Code,
    /// Three-letter currency code, stored upper-cased.
    Currency,
    /// Amount in `0..=MAX_MONEY`, rounded to two decimals.
    Money,
    /// Money amount or `null`.
    NullableMoney,
    /// Percentage in `0..=100`, rounded to two decimals.
    Percent,
    /// 32-bit integer.
    Integer,
    /// Non-negative 32-bit integer.
    Count,
    /// 32-bit integer or `null`.
    NullableInteger,
    /// `true` / `false`.
    Boolean,
    /// UUID string or `null`.
    NullableUuid,
    /// RFC 3339 timestamp or `null`.
    NullableTimestamp,
    /// JSON object, stored as `JSONB`.
    JsonObject,
    /// One of a closed set of strings.
    Enum(EnumParser),
}

impl FieldKind {
    const fn expected(self) -> &'static str {
        match self {
            Self::Text => "a non-empty string",
            Self::NullableText => "a string or null",
            Self::Slug => "a lowercase slug (a-z, 0-9, -)",
            Self::Code => "a non-empty code",
            Self::Currency => "a three-letter currency code",
            Self::Money => "an amount between 0 and 9999999999.99",
            Self::NullableMoney => "an amount between 0 and 9999999999.99, or null",
            Self::Percent => "a percentage between 0 and 100",
            Self::Integer => "an integer",
            Self::Count => "a non-negative integer",
            Self::NullableInteger => "an integer or null",
            Self::Boolean => "a boolean",
            Self::NullableUuid => "a UUID or null",
            Self::NullableTimestamp => "an RFC 3339 timestamp or null",
            Self::JsonObject => "a JSON object",
            Self::Enum(_) => "one of the allowed values",
        }
    }

    fn parse(self, value: &Json) -> Option<FieldValue> {
        match self {
            Self::Text => non_empty(value).map(|s| FieldValue::Text(s.to_owned())),
            Self::NullableText => match value {
                Json::Null => Some(FieldValue::NullableText(None)),
                Json::String(s) => Some(FieldValue::NullableText(Some(s.clone()))),
                _ => None,
            },
            Self::Slug => value
                .as_str()
                .filter(|s| is_valid_slug(s))
                .map(|s| FieldValue::Text(s.to_owned())),
            Self::Code => non_empty(value).map(|s| FieldValue::Text(s.to_uppercase())),
            Self::Currency => value
                .as_str()
                .map(str::trim)
                .filter(|s| s.len() == 3 && s.bytes().all(|b| b.is_ascii_alphabetic()))
                .map(|s| FieldValue::Text(s.to_ascii_uppercase())),
            Self::Money => money(value).map(FieldValue::Money),
            Self::NullableMoney => match value {
                Json::Null => Some(FieldValue::NullableMoney(None)),
                other => money(other).map(|d| FieldValue::NullableMoney(Some(d))),
            },
            Self::Percent => decimal(value)
                .map(round_money)
                .filter(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE_HUNDRED)
                .map(FieldValue::Decimal),
            Self::Integer => integer(value).map(FieldValue::Integer),
            Self::Count => integer(value).filter(|n| *n >= 0).map(FieldValue::Integer),
            Self::NullableInteger => match value {
                Json::Null => Some(FieldValue::NullableInteger(None)),
                other => integer(other).map(|n| FieldValue::NullableInteger(Some(n))),
            },
            Self::Boolean => value.as_bool().map(FieldValue::Boolean),
            Self::NullableUuid => match value {
                Json::Null => Some(FieldValue::NullableUuid(None)),
                Json::String(s) => Uuid::parse_str(s)
                    .ok()
                    .map(|id| FieldValue::NullableUuid(Some(id))),
                _ => None,
            },
            Self::NullableTimestamp => match value {
                Json::Null => Some(FieldValue::NullableTimestamp(None)),
                Json::String(s) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|ts| FieldValue::NullableTimestamp(Some(ts.with_timezone(&Utc)))),
                _ => None,
            },
            Self::JsonObject => value
                .is_object()
                .then(|| FieldValue::Json(value.clone())),
            Self::Enum(parse) => value
                .as_str()
                .and_then(parse)
                .map(|s| FieldValue::Text(s.to_owned())),
        }
    }
}

fn non_empty(value: &Json) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn decimal(value: &Json) -> Option<Decimal> {
    match value {
        Json::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Json::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn money(value: &Json) -> Option<Decimal> {
    let amount = round_money(decimal(value)?);
    is_storable_amount(amount).then_some(amount)
}

fn integer(value: &Json) -> Option<i32> {
    value.as_i64().and_then(|n| i32::try_from(n).ok())
}

/// A validated value ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    NullableText(Option<String>),
    Money(Decimal),
    NullableMoney(Option<Decimal>),
    Decimal(Decimal),
    Integer(i32),
    NullableInteger(Option<i32>),
    Boolean(bool),
    NullableUuid(Option<Uuid>),
    NullableTimestamp(Option<DateTime<Utc>>),
    Json(Json),
}

/// One updatable column.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub column: &'static str,
    pub kind: FieldKind,
}

impl Field {
    #[must_use]
    pub const fn new(column: &'static str, kind: FieldKind) -> Self {
        Self { column, kind }
    }
}

/// The set of columns a resource lets callers change.
#[derive(Debug, Clone, Copy)]
pub struct Whitelist {
    table: &'static str,
    fields: &'static [Field],
}

impl Whitelist {
    #[must_use]
    pub const fn new(table: &'static str, fields: &'static [Field]) -> Self {
        Self { table, fields }
    }

    /// Keep only whitelisted keys of `body`, validating each value.
    ///
    /// Unknown keys are dropped without error.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::InvalidValue` for the first whitelisted key whose
    /// value fails validation, or `UpdateError::Empty` if none remain.
    pub fn filter(&self, body: &Map<String, Json>) -> Result<PartialUpdate, UpdateError> {
        let mut assignments = Vec::new();

        for field in self.fields {
            let Some(raw) = body.get(field.column) else {
                continue;
            };
            let value = field.kind.parse(raw).ok_or(UpdateError::InvalidValue {
                field: field.column,
                expected: field.kind.expected(),
            })?;
            assignments.push((field.column, value));
        }

        if assignments.is_empty() {
            return Err(UpdateError::Empty);
        }

        Ok(PartialUpdate {
            table: self.table,
            assignments,
        })
    }
}

/// A non-empty set of validated column assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    table: &'static str,
    assignments: Vec<(&'static str, FieldValue)>,
}

impl PartialUpdate {
    /// Columns being assigned, in whitelist order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.assignments.iter().map(|(column, _)| *column)
    }

    /// The validated value for `column`, if it is being assigned.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.assignments
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, value)| value)
    }

    /// Text value for `column` (enum, slug and code fields included).
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            FieldValue::Text(s) | FieldValue::NullableText(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Render `UPDATE <table> SET ..., updated_at = NOW() WHERE id = $n`.
    ///
    /// Callers append further predicates (`AND shop_id = ...`) before
    /// building the query.
    #[must_use]
    pub fn into_query(self, id: Uuid) -> QueryBuilder<'static, Postgres> {
        self.into_query_by("id", id)
    }

    /// Like [`Self::into_query`], for tables keyed by another column
    /// (`shop_settings` is keyed by `shop_id`).
    #[must_use]
    pub fn into_query_by(self, key: &'static str, id: Uuid) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!("UPDATE {} SET ", self.table));

        for (column, value) in self.assignments {
            query.push(column).push(" = ");
            match value {
                FieldValue::Text(v) => query.push_bind(v),
                FieldValue::NullableText(v) => query.push_bind(v),
                FieldValue::Money(v) => query.push_bind(v),
                FieldValue::NullableMoney(v) => query.push_bind(v),
                FieldValue::Decimal(v) => query.push_bind(v),
                FieldValue::Integer(v) => query.push_bind(v),
                FieldValue::NullableInteger(v) => query.push_bind(v),
                FieldValue::Boolean(v) => query.push_bind(v),
                FieldValue::NullableUuid(v) => query.push_bind(v),
                FieldValue::NullableTimestamp(v) => query.push_bind(v),
                FieldValue::Json(v) => query.push_bind(v),
            };
            query.push(", ");
        }

        query
            .push("updated_at = NOW() WHERE ")
            .push(key)
            .push(" = ")
            .push_bind(id);
        query
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use shopforge_core::OrderStatus;

    use super::*;

    fn parse_order_status(s: &str) -> Option<&'static str> {
        s.parse::<OrderStatus>().ok().map(OrderStatus::as_str)
    }

    const PRODUCT: Whitelist = Whitelist::new(
        "products",
        &[
            Field::new("name", FieldKind::Text),
            Field::new("slug", FieldKind::Slug),
            Field::new("description", FieldKind::NullableText),
            Field::new("price", FieldKind::Money),
            Field::new("quantity", FieldKind::Integer),
            Field::new("is_active", FieldKind::Boolean),
            Field::new("category_id", FieldKind::NullableUuid),
        ],
    );

    const ORDER: Whitelist = Whitelist::new(
        "orders",
        &[Field::new("status", FieldKind::Enum(parse_order_status))],
    );

    fn body(value: serde_json::Value) -> Map<String, Json> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let update = PRODUCT
            .filter(&body(json!({
                "name": "Tea",
                "shop_id": "00000000-0000-0000-0000-000000000000",
                "total": 0,
                "is_admin": true
            })))
            .unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_only_unknown_fields_is_empty() {
        let err = PRODUCT
            .filter(&body(json!({"shop_id": "x", "id": 1})))
            .unwrap_err();
        assert_eq!(err, UpdateError::Empty);
        assert_eq!(err.to_string(), "No valid fields to update");
    }

    #[test]
    fn test_empty_body_is_empty() {
        assert_eq!(PRODUCT.filter(&Map::new()).unwrap_err(), UpdateError::Empty);
    }

    #[test]
    fn test_assignments_follow_whitelist_order() {
        let update = PRODUCT
            .filter(&body(json!({"is_active": false, "price": "12.5", "name": "Tea"})))
            .unwrap();
        assert_eq!(
            update.columns().collect::<Vec<_>>(),
            vec!["name", "price", "is_active"]
        );
        assert_eq!(
            update.get("price"),
            Some(&FieldValue::Money("12.50".parse().unwrap()))
        );
    }

    #[test]
    fn test_sql_uses_bound_parameters() {
        let update = PRODUCT
            .filter(&body(json!({"price": 9.99, "name": "Robert'); DROP TABLE products;--"})))
            .unwrap();
        let mut query = update.into_query(Uuid::nil());
        query.push(" AND shop_id = ").push_bind(Uuid::nil());
        assert_eq!(
            query.sql(),
            "UPDATE products SET name = $1, price = $2, updated_at = NOW() WHERE id = $3 AND shop_id = $4"
        );
    }

    #[test]
    fn test_type_mismatch_names_the_field() {
        let err = PRODUCT
            .filter(&body(json!({"quantity": "lots"})))
            .unwrap_err();
        assert_eq!(
            err,
            UpdateError::InvalidValue {
                field: "quantity",
                expected: "an integer"
            }
        );
    }

    #[test]
    fn test_money_rejects_negative() {
        assert!(PRODUCT.filter(&body(json!({"price": -1}))).is_err());
    }

    #[test]
    fn test_money_rejects_amounts_beyond_column() {
        for price in [json!(1e13), json!("10000000000"), json!("9999999999.999")] {
            let err = PRODUCT.filter(&body(json!({ "price": price }))).unwrap_err();
            assert!(matches!(err, UpdateError::InvalidValue { field: "price", .. }));
        }
        let update = PRODUCT
            .filter(&body(json!({"price": "9999999999.99"})))
            .unwrap();
        assert_eq!(
            update.get("price"),
            Some(&FieldValue::Money("9999999999.99".parse().unwrap()))
        );
    }

    #[test]
    fn test_nullable_fields_accept_null() {
        let update = PRODUCT
            .filter(&body(json!({"description": null, "category_id": null})))
            .unwrap();
        assert_eq!(update.get("description"), Some(&FieldValue::NullableText(None)));
        assert_eq!(update.get("category_id"), Some(&FieldValue::NullableUuid(None)));
    }

    #[test]
    fn test_text_rejects_blank() {
        assert!(PRODUCT.filter(&body(json!({"name": "   "}))).is_err());
        assert!(PRODUCT.filter(&body(json!({"slug": "Not A Slug"}))).is_err());
    }

    const SETTINGS: Whitelist = Whitelist::new(
        "shop_settings",
        &[
            Field::new("tax_rate", FieldKind::Percent),
            Field::new("low_stock_threshold", FieldKind::Count),
            Field::new("config", FieldKind::JsonObject),
        ],
    );

    #[test]
    fn test_percent_bounds() {
        let update = SETTINGS.filter(&body(json!({"tax_rate": 23}))).unwrap();
        assert_eq!(
            update.get("tax_rate"),
            Some(&FieldValue::Decimal("23".parse().unwrap()))
        );
        assert!(SETTINGS.filter(&body(json!({"tax_rate": 100.5}))).is_err());
        assert!(SETTINGS.filter(&body(json!({"tax_rate": "-1"}))).is_err());
    }

    #[test]
    fn test_count_rejects_negative() {
        assert!(SETTINGS.filter(&body(json!({"low_stock_threshold": 0}))).is_ok());
        let err = SETTINGS
            .filter(&body(json!({"low_stock_threshold": -5})))
            .unwrap_err();
        assert_eq!(
            err,
            UpdateError::InvalidValue {
                field: "low_stock_threshold",
                expected: "a non-negative integer"
            }
        );
    }

    #[test]
    fn test_json_object_only() {
        let config = json!({"goid": "8123456789", "client_id": "abc"});
        let update = SETTINGS.filter(&body(json!({ "config": config }))).unwrap();
        assert_eq!(update.get("config"), Some(&FieldValue::Json(config)));
        assert!(SETTINGS.filter(&body(json!({"config": "goid=1"}))).is_err());
        assert!(SETTINGS.filter(&body(json!({"config": null}))).is_err());
    }

    #[test]
    fn test_enum_field() {
        let update = ORDER.filter(&body(json!({"status": "shipped"}))).unwrap();
        assert_eq!(update.text("status"), Some("shipped"));
        assert!(ORDER.filter(&body(json!({"status": "teleported"}))).is_err());
    }
}
