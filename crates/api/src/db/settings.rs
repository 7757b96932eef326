//! Shop settings repository.
//!
//! Every shop has at most one settings row. It is created with the schema
//! defaults the first time anyone reads or writes it.

use sqlx::PgPool;

use shopforge_core::ShopId;

use super::RepositoryError;
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::ShopSettings;

const SETTINGS_COLUMNS: &str = "shop_id, company_name, ico, dic, ic_dph, bank_name, iban, swift, \
     invoice_prefix, invoice_next_number, invoice_footer, tax_rate, prices_include_tax, \
     min_order_value, order_notify_email, low_stock_threshold, terms_url, privacy_url, \
     created_at, updated_at";

/// Columns an owner may change through `PUT /shops/{shop_id}/settings`.
/// `invoice_next_number` only moves when an invoice is issued.
pub const SETTINGS_UPDATE: Whitelist = Whitelist::new(
    "shop_settings",
    &[
        Field::new("company_name", FieldKind::NullableText),
        Field::new("ico", FieldKind::NullableText),
        Field::new("dic", FieldKind::NullableText),
        Field::new("ic_dph", FieldKind::NullableText),
        Field::new("bank_name", FieldKind::NullableText),
        Field::new("iban", FieldKind::NullableText),
        Field::new("swift", FieldKind::NullableText),
        Field::new("invoice_prefix", FieldKind::Text),
        Field::new("invoice_footer", FieldKind::NullableText),
        Field::new("tax_rate", FieldKind::Percent),
        Field::new("prices_include_tax", FieldKind::Boolean),
        Field::new("min_order_value", FieldKind::NullableMoney),
        Field::new("order_notify_email", FieldKind::NullableText),
        Field::new("low_stock_threshold", FieldKind::Count),
        Field::new("terms_url", FieldKind::NullableText),
        Field::new("privacy_url", FieldKind::NullableText),
    ],
);

/// Repository for shop settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The shop's settings, inserting the defaults if none exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, shop_id: ShopId) -> Result<ShopSettings, RepositoryError> {
        self.ensure(shop_id).await?;

        let settings = sqlx::query_as::<_, ShopSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM shop_settings WHERE shop_id = $1"
        ))
        .bind(shop_id)
        .fetch_one(self.pool)
        .await?;

        Ok(settings)
    }

    /// Apply an owner update, creating the row first if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        update: PartialUpdate,
    ) -> Result<ShopSettings, RepositoryError> {
        self.ensure(shop_id).await?;

        let mut query = update.into_query_by("shop_id", shop_id.as_uuid());
        query.push(" RETURNING ").push(SETTINGS_COLUMNS);

        let settings = query
            .build_query_as::<ShopSettings>()
            .fetch_one(self.pool)
            .await?;

        Ok(settings)
    }

    async fn ensure(&self, shop_id: ShopId) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO shop_settings (shop_id) VALUES ($1) ON CONFLICT (shop_id) DO NOTHING")
            .bind(shop_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_invoice_counter_is_not_writable() {
        let body = json!({"invoice_next_number": 1, "invoice_prefix": "FV", "shop_id": "x"});
        let update = SETTINGS_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["invoice_prefix"]);
    }

    #[test]
    fn test_update_is_keyed_by_shop() {
        let body = json!({"tax_rate": "23", "prices_include_tax": false});
        let update = SETTINGS_UPDATE.filter(body.as_object().unwrap()).unwrap();
        let mut query = update.into_query_by("shop_id", uuid::Uuid::nil());
        query.push(" RETURNING ").push(SETTINGS_COLUMNS);
        assert!(query.sql().starts_with(
            "UPDATE shop_settings SET tax_rate = $1, prices_include_tax = $2, \
             updated_at = NOW() WHERE shop_id = $3 RETURNING shop_id, "
        ));
    }

    #[test]
    fn test_min_order_value_uses_money_bounds() {
        let body = json!({"min_order_value": "99999999999"});
        assert!(SETTINGS_UPDATE.filter(body.as_object().unwrap()).is_err());
    }
}
