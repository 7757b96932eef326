//! Coupon repository.

use sqlx::PgPool;

use shopforge_core::{CouponId, CouponKind, ShopId, round_money};

use super::RepositoryError;
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{Coupon, CreateCouponInput};

pub(crate) const COUPON_COLUMNS: &str = "id, shop_id, code, kind, value, min_order_value, \
     max_uses, used_count, starts_at, expires_at, is_active, created_at, updated_at";

fn parse_coupon_kind(s: &str) -> Option<&'static str> {
    s.parse::<CouponKind>().ok().map(CouponKind::as_str)
}

/// Columns an owner may change through `PUT .../coupons/{id}`.
///
/// `used_count` only ever moves through checkout.
pub const COUPON_UPDATE: Whitelist = Whitelist::new(
    "coupons",
    &[
        Field::new("code", FieldKind::Code),
        Field::new("kind", FieldKind::Enum(parse_coupon_kind)),
        Field::new("value", FieldKind::Money),
        Field::new("min_order_value", FieldKind::NullableMoney),
        Field::new("max_uses", FieldKind::NullableInteger),
        Field::new("starts_at", FieldKind::NullableTimestamp),
        Field::new("expires_at", FieldKind::NullableTimestamp),
        Field::new("is_active", FieldKind::Boolean),
    ],
);

const CODE_TAKEN: &str = "Coupon code already exists in this shop";

/// Canonical stored form of a coupon code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All coupons of a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, shop_id: ShopId) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE shop_id = $1 ORDER BY created_at DESC"
        ))
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(coupons)
    }

    /// Insert a coupon. The code is stored upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code exists in this shop.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        input: &CreateCouponInput,
    ) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO coupons (shop_id, code, kind, value, min_order_value, max_uses, \
                 starts_at, expires_at, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(normalize_code(&input.code))
        .bind(input.kind)
        .bind(round_money(input.value))
        .bind(input.min_order_value.map(round_money))
        .bind(input.max_uses)
        .bind(input.starts_at)
        .bind(input.expires_at)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, CODE_TAKEN))
    }

    /// Apply an owner update. `None` when the coupon is not in `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new code exists in this shop.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        id: CouponId,
        update: PartialUpdate,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(COUPON_COLUMNS);

        query
            .build_query_as::<Coupon>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_or_database(e, CODE_TAKEN))
    }

    /// Delete a coupon of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such coupon exists in the shop.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::update::FieldValue;

    #[test]
    fn test_code_is_upper_cased() {
        assert_eq!(normalize_code("  spring10 "), "SPRING10");

        let body = json!({"code": "summer", "used_count": 0});
        let update = COUPON_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.text("code"), Some("SUMMER"));
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["code"]);
    }

    #[test]
    fn test_kind_is_closed_set() {
        let ok = json!({"kind": "fixed"});
        assert_eq!(
            COUPON_UPDATE.filter(ok.as_object().unwrap()).unwrap().text("kind"),
            Some("fixed")
        );
        let bad = json!({"kind": "bogo"});
        assert!(COUPON_UPDATE.filter(bad.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_window_can_be_cleared() {
        let body = json!({"expires_at": null, "max_uses": null});
        let update = COUPON_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.get("expires_at"), Some(&FieldValue::NullableTimestamp(None)));
        assert_eq!(update.get("max_uses"), Some(&FieldValue::NullableInteger(None)));
    }
}
