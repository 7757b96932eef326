//! Payment method repository.

use serde_json::Value;
use sqlx::PgPool;

use shopforge_core::{PaymentMethodId, ShopId};

use super::RepositoryError;
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{CreatePaymentMethodInput, PaymentMethod, PublicPaymentMethod};

const PAYMENT_COLUMNS: &str = "id, shop_id, kind, name, description, config, is_active, \
     is_test_mode, position, created_at, updated_at";

/// Columns an owner may change through `PUT .../payment-methods/{id}`.
/// The provider is fixed once created.
pub const PAYMENT_UPDATE: Whitelist = Whitelist::new(
    "payment_methods",
    &[
        Field::new("name", FieldKind::Text),
        Field::new("description", FieldKind::NullableText),
        Field::new("config", FieldKind::JsonObject),
        Field::new("is_active", FieldKind::Boolean),
        Field::new("is_test_mode", FieldKind::Boolean),
        Field::new("position", FieldKind::Integer),
    ],
);

/// Repository for payment method database operations.
pub struct PaymentMethodRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentMethodRepository<'a> {
    /// Create a new payment method repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All payment methods of a shop in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, shop_id: ShopId) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_methods WHERE shop_id = $1 \
             ORDER BY position, created_at"
        ))
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(methods)
    }

    /// Insert a payment method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        input: &CreatePaymentMethodInput,
    ) -> Result<PaymentMethod, RepositoryError> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "INSERT INTO payment_methods (shop_id, kind, name, description, config, \
                 is_active, is_test_mode, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(input.kind)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(Value::Object(input.config.clone()))
        .bind(input.is_active)
        .bind(input.is_test_mode)
        .bind(input.position)
        .fetch_one(self.pool)
        .await?;

        Ok(method)
    }

    /// Apply an owner update. `None` when the method is not in `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        id: PaymentMethodId,
        update: PartialUpdate,
    ) -> Result<Option<PaymentMethod>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(PAYMENT_COLUMNS);

        let method = query
            .build_query_as::<PaymentMethod>()
            .fetch_optional(self.pool)
            .await?;

        Ok(method)
    }

    /// Delete a payment method of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such method exists in the shop.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, id: PaymentMethodId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active methods offered on the storefront. Never exposes `config`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        shop_id: ShopId,
    ) -> Result<Vec<PublicPaymentMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, PublicPaymentMethod>(
            "SELECT id, kind, name, description FROM payment_methods \
             WHERE shop_id = $1 AND is_active = TRUE ORDER BY position, created_at",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(methods)
    }
}
