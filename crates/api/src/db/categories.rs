//! Category repository.

use sqlx::PgPool;

use shopforge_core::{CategoryId, ShopId};

use super::RepositoryError;
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{Category, CreateCategoryInput, PublicCategory};

const CATEGORY_COLUMNS: &str = "id, shop_id, parent_id, name, slug, description, image, \
     position, is_active, created_at, updated_at";

/// Columns an owner may change through `PUT .../categories/{id}`.
pub const CATEGORY_UPDATE: Whitelist = Whitelist::new(
    "categories",
    &[
        Field::new("name", FieldKind::Text),
        Field::new("slug", FieldKind::Slug),
        Field::new("description", FieldKind::NullableText),
        Field::new("image", FieldKind::NullableText),
        Field::new("position", FieldKind::Integer),
        Field::new("is_active", FieldKind::Boolean),
    ],
);

const SLUG_TAKEN: &str = "Category slug already exists in this shop";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories of a shop in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, shop_id: ShopId) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE shop_id = $1 \
             ORDER BY position, name"
        ))
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Whether `id` is a category of `shop_id`.
    ///
    /// Used to keep product and parent references inside the tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn belongs_to(&self, shop_id: ShopId, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND shop_id = $2)",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Resolve an active category slug of a shop to its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn id_by_slug(
        &self,
        shop_id: ShopId,
        slug: &str,
    ) -> Result<Option<CategoryId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, CategoryId>(
            "SELECT id FROM categories WHERE shop_id = $1 AND slug = $2 AND is_active = TRUE",
        )
        .bind(shop_id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    /// Insert a category under `slug`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken in this shop.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        slug: &str,
        input: &CreateCategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (shop_id, parent_id, name, slug, description, image, \
                 position, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(input.parent_id)
        .bind(input.name.trim())
        .bind(slug)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.position)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, SLUG_TAKEN))
    }

    /// Apply an owner update. `None` when the category is not in `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        id: CategoryId,
        update: PartialUpdate,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(CATEGORY_COLUMNS);

        query
            .build_query_as::<Category>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_or_database(e, SLUG_TAKEN))
    }

    /// Delete a category. Its products are kept and lose the reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists in the shop.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active categories with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(&self, shop_id: ShopId) -> Result<Vec<PublicCategory>, RepositoryError> {
        let categories = sqlx::query_as::<_, PublicCategory>(
            "SELECT c.id, c.parent_id, c.name, c.slug, c.description, c.image, \
                    (SELECT COUNT(*) FROM products p \
                      WHERE p.category_id = c.id AND p.is_active = TRUE) AS product_count \
             FROM categories c \
             WHERE c.shop_id = $1 AND c.is_active = TRUE \
             ORDER BY c.position, c.name",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }
}
