//! Shipping method repository.

use sqlx::PgPool;

use shopforge_core::{ShippingMethodId, ShopId, round_money};

use super::RepositoryError;
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{CreateShippingMethodInput, PublicShippingMethod, ShippingMethod};

const SHIPPING_COLUMNS: &str = "id, shop_id, name, description, price, free_above, is_active, \
     position, created_at, updated_at";

/// Columns an owner may change through `PUT .../shipping-methods/{id}`.
pub const SHIPPING_UPDATE: Whitelist = Whitelist::new(
    "shipping_methods",
    &[
        Field::new("name", FieldKind::Text),
        Field::new("description", FieldKind::NullableText),
        Field::new("price", FieldKind::Money),
        Field::new("free_above", FieldKind::NullableMoney),
        Field::new("is_active", FieldKind::Boolean),
        Field::new("position", FieldKind::Integer),
    ],
);

/// Repository for shipping method database operations.
pub struct ShippingMethodRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingMethodRepository<'a> {
    /// Create a new shipping method repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shipping methods of a shop in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, shop_id: ShopId) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, ShippingMethod>(&format!(
            "SELECT {SHIPPING_COLUMNS} FROM shipping_methods WHERE shop_id = $1 \
             ORDER BY position, name"
        ))
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(methods)
    }

    /// Insert a shipping method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        input: &CreateShippingMethodInput,
    ) -> Result<ShippingMethod, RepositoryError> {
        let method = sqlx::query_as::<_, ShippingMethod>(&format!(
            "INSERT INTO shipping_methods (shop_id, name, description, price, free_above, \
                 is_active, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SHIPPING_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(round_money(input.price))
        .bind(input.free_above.map(round_money))
        .bind(input.is_active)
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
        id: ShippingMethodId,
        update: PartialUpdate,
    ) -> Result<Option<ShippingMethod>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(SHIPPING_COLUMNS);

        let method = query
            .build_query_as::<ShippingMethod>()
            .fetch_optional(self.pool)
            .await?;

        Ok(method)
    }

    /// Delete a shipping method of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such method exists in the shop.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, id: ShippingMethodId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shipping_methods WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active methods offered on the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        shop_id: ShopId,
    ) -> Result<Vec<PublicShippingMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, PublicShippingMethod>(
            "SELECT id, name, description, price, free_above FROM shipping_methods \
             WHERE shop_id = $1 AND is_active = TRUE ORDER BY position, name",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(methods)
    }
}
