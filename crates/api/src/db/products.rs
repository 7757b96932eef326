//! Product repository.

use serde::Deserialize;
use sqlx::PgPool;

use shopforge_core::{CategoryId, Page, PageRequest, ProductId, ShopId};

use super::RepositoryError;
use super::listing::{Filter, ListQuery};
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{CreateProductInput, Product, ProductExport, ProductListItem, PublicProduct};

const PRODUCT_COLUMNS: &str = "id, shop_id, category_id, name, slug, description, \
     short_description, price, compare_price, cost_price, sku, barcode, quantity, \
     track_inventory, allow_backorder, weight, meta_title, meta_description, \
     is_active, is_featured, created_at, updated_at";

/// Columns an owner may change through `PUT .../products/{id}`.
pub const PRODUCT_UPDATE: Whitelist = Whitelist::new(
    "products",
    &[
        Field::new("category_id", FieldKind::NullableUuid),
        Field::new("name", FieldKind::Text),
        Field::new("slug", FieldKind::Slug),
        Field::new("description", FieldKind::NullableText),
        Field::new("short_description", FieldKind::NullableText),
        Field::new("price", FieldKind::Money),
        Field::new("compare_price", FieldKind::NullableMoney),
        Field::new("cost_price", FieldKind::NullableMoney),
        Field::new("sku", FieldKind::NullableText),
        Field::new("barcode", FieldKind::NullableText),
        Field::new("quantity", FieldKind::Integer),
        Field::new("track_inventory", FieldKind::Boolean),
        Field::new("allow_backorder", FieldKind::Boolean),
        Field::new("weight", FieldKind::NullableMoney),
        Field::new("meta_title", FieldKind::NullableText),
        Field::new("meta_description", FieldKind::NullableText),
        Field::new("is_active", FieldKind::Boolean),
        Field::new("is_featured", FieldKind::Boolean),
    ],
);

const OWNER_LIST: ListQuery = ListQuery {
    from: "products p LEFT JOIN categories c ON c.id = p.category_id",
    columns: "p.id, p.shop_id, p.category_id, p.name, p.slug, p.description, \
              p.short_description, p.price, p.compare_price, p.cost_price, p.sku, p.barcode, \
              p.quantity, p.track_inventory, p.allow_backorder, p.weight, p.meta_title, \
              p.meta_description, p.is_active, p.is_featured, p.created_at, p.updated_at, \
              c.name AS category_name",
    order_by: "p.created_at DESC",
};

const PUBLIC_COLUMNS: &str = "p.id, p.category_id, p.name, p.slug, p.description, \
     p.short_description, p.price, p.compare_price, p.sku, \
     (p.quantity > 0 OR NOT p.track_inventory OR p.allow_backorder) AS in_stock, \
     p.is_featured, p.meta_title, p.meta_description";

const PUBLIC_LIST: ListQuery = ListQuery {
    from: "products p",
    columns: PUBLIC_COLUMNS,
    order_by: "p.created_at DESC",
};

const SLUG_TAKEN: &str = "Product slug already exists in this shop";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC",
            Self::PriceAsc => "p.price ASC, p.created_at DESC",
            Self::PriceDesc => "p.price DESC, p.created_at DESC",
            Self::Name => "p.name ASC",
        }
    }
}

/// `status` filter of the owner product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatusFilter {
    Active,
    Inactive,
    Featured,
}

/// Filters of the owner product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery<'q> {
    pub search: Option<&'q str>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatusFilter>,
    pub sort: ProductSort,
}

/// Filters of the storefront product listing. Only active products are
/// ever returned.
#[derive(Debug, Clone, Default)]
pub struct PublicProductQuery<'q> {
    pub search: Option<&'q str>,
    pub category_id: Option<CategoryId>,
    pub featured: bool,
    pub sort: ProductSort,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Owner listing with category names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        shop_id: ShopId,
        params: &ProductQuery<'_>,
        page: PageRequest,
    ) -> Result<Page<ProductListItem>, RepositoryError> {
        let mut filter = Filter::new()
            .uuid("p.shop_id", shop_id)
            .search(&["p.name", "p.sku"], params.search);
        if let Some(category_id) = params.category_id {
            filter = filter.uuid("p.category_id", category_id);
        }
        filter = match params.status {
            Some(ProductStatusFilter::Active) => filter.flag("p.is_active", true),
            Some(ProductStatusFilter::Inactive) => filter.flag("p.is_active", false),
            Some(ProductStatusFilter::Featured) => filter.flag("p.is_featured", true),
            None => filter,
        };

        let list = ListQuery {
            order_by: params.sort.order_by(),
            ..OWNER_LIST
        };
        list.fetch(self.pool, &filter, page).await
    }

    /// A product of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        shop_id: ShopId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND shop_id = $2"
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Whether `slug` is already used by a product of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, shop_id: ShopId, slug: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE shop_id = $1 AND slug = $2)",
        )
        .bind(shop_id)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a product under `slug`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken in this shop.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        slug: &str,
        input: &CreateProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (shop_id, category_id, name, slug, description, \
                 short_description, price, compare_price, cost_price, sku, barcode, \
                 quantity, meta_title, meta_description, is_active, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(slug)
        .bind(&input.description)
        .bind(&input.short_description)
        .bind(shopforge_core::round_money(input.price))
        .bind(input.compare_price.map(shopforge_core::round_money))
        .bind(input.cost_price.map(shopforge_core::round_money))
        .bind(&input.sku)
        .bind(&input.barcode)
        .bind(input.quantity)
        .bind(&input.meta_title)
        .bind(&input.meta_description)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, SLUG_TAKEN))
    }

    /// Every product of `shop_id` in export form, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn export(&self, shop_id: ShopId) -> Result<Vec<ProductExport>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductExport>(
            "SELECT name, slug, description, short_description, price, compare_price, sku, \
                 barcode, quantity, is_active, is_featured \
             FROM products WHERE shop_id = $1 ORDER BY created_at, name",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Apply an owner update. `None` when the product is not in `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        id: ProductId,
        update: PartialUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(PRODUCT_COLUMNS);

        query
            .build_query_as::<Product>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_or_database(e, SLUG_TAKEN))
    }

    /// Delete a product of `shop_id`. Order items keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists in the shop.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Storefront
    // =========================================================================

    /// Active products of a shop for the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_public(
        &self,
        shop_id: ShopId,
        params: &PublicProductQuery<'_>,
        page: PageRequest,
    ) -> Result<Page<PublicProduct>, RepositoryError> {
        let mut filter = Filter::new()
            .uuid("p.shop_id", shop_id)
            .flag("p.is_active", true)
            .search(&["p.name", "p.short_description"], params.search);
        if let Some(category_id) = params.category_id {
            filter = filter.uuid("p.category_id", category_id);
        }
        if params.featured {
            filter = filter.flag("p.is_featured", true);
        }

        let list = ListQuery {
            order_by: params.sort.order_by(),
            ..PUBLIC_LIST
        };
        list.fetch(self.pool, &filter, page).await
    }

    /// An active product of a shop by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public_by_slug(
        &self,
        shop_id: ShopId,
        slug: &str,
    ) -> Result<Option<PublicProduct>, RepositoryError> {
        let product = sqlx::query_as::<_, PublicProduct>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM products p \
             WHERE p.shop_id = $1 AND p.slug = $2 AND p.is_active = TRUE"
        ))
        .bind(shop_id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sort_changes_only_order_by() {
        let filter = Filter::new().uuid("p.shop_id", uuid::Uuid::nil());
        let list = ListQuery {
            order_by: ProductSort::PriceAsc.order_by(),
            ..OWNER_LIST
        };
        let sql = list.page_query(&filter, PageRequest::default()).into_sql();
        assert!(sql.contains(" WHERE p.shop_id = $1 ORDER BY p.price ASC, p.created_at DESC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_sort_parses_from_query_values() {
        let sort: ProductSort = serde_json::from_value(json!("price_desc")).unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert!(serde_json::from_value::<ProductSort>(json!("random")).is_err());
    }

    #[test]
    fn test_update_ignores_tenant_and_bookkeeping_columns() {
        let body = json!({
            "price": "19.90",
            "shop_id": "00000000-0000-0000-0000-000000000000",
            "id": "00000000-0000-0000-0000-000000000000",
            "created_at": "2020-01-01T00:00:00Z",
        });
        let update = PRODUCT_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["price"]);
    }
}
