//! Shop repository: the tenant root.
//!
//! Owner-facing lookups always carry both `id` and `user_id` in the same
//! `WHERE` clause, so a shop owned by someone else is indistinguishable from
//! one that does not exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use shopforge_core::{Page, PageRequest, ShopId, UserId, is_valid_slug};

use super::RepositoryError;
use super::listing::{Filter, ListQuery};
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::{AdminShopListItem, Shop, ShopSummary};

/// Name of the shipping method every new shop starts with.
pub const DEFAULT_SHIPPING_NAME: &str = "Doručenie kuriérom";
/// Description of the default shipping method.
pub const DEFAULT_SHIPPING_DESCRIPTION: &str = "Doručenie do 2-3 pracovných dní";

/// Price of the default shipping method.
#[must_use]
pub fn default_shipping_price() -> Decimal {
    Decimal::new(499, 2)
}

const SHOP_COLUMNS: &str = "id, user_id, name, slug, description, logo, currency, language, \
     email, phone, address, city, zip, country, meta_title, meta_description, \
     is_active, is_published, custom_domain, domain_verified, ssl_enabled, \
     created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `shops` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: ShopId,
    user_id: UserId,
    name: String,
    slug: String,
    description: Option<String>,
    logo: Option<String>,
    currency: String,
    language: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    zip: Option<String>,
    country: Option<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    is_active: bool,
    is_published: bool,
    custom_domain: Option<String>,
    domain_verified: bool,
    ssl_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        // Storefront URLs and order currency are built from these two.
        if !is_valid_slug(&row.slug) {
            return Err(RepositoryError::DataCorruption(format!(
                "invalid slug in database for shop {}: {:?}",
                row.id, row.slug
            )));
        }
        if !(row.currency.len() == 3 && row.currency.bytes().all(|b| b.is_ascii_uppercase())) {
            return Err(RepositoryError::DataCorruption(format!(
                "invalid currency in database for shop {}: {:?}",
                row.id, row.currency
            )));
        }

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            logo: row.logo,
            currency: row.currency,
            language: row.language,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            zip: row.zip,
            country: row.country,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            is_active: row.is_active,
            is_published: row.is_published,
            custom_domain: row.custom_domain,
            domain_verified: row.domain_verified,
            ssl_enabled: row.ssl_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_shop(row: Option<ShopRow>) -> Result<Option<Shop>, RepositoryError> {
    row.map(Shop::try_from).transpose()
}

// =============================================================================
// Repository
// =============================================================================

/// Columns an owner may change through `PUT /shops/{id}`.
pub const SHOP_UPDATE: Whitelist = Whitelist::new(
    "shops",
    &[
        Field::new("name", FieldKind::Text),
        Field::new("slug", FieldKind::Slug),
        Field::new("description", FieldKind::NullableText),
        Field::new("logo", FieldKind::NullableText),
        Field::new("currency", FieldKind::Currency),
        Field::new("language", FieldKind::Text),
        Field::new("email", FieldKind::NullableText),
        Field::new("phone", FieldKind::NullableText),
        Field::new("address", FieldKind::NullableText),
        Field::new("city", FieldKind::NullableText),
        Field::new("zip", FieldKind::NullableText),
        Field::new("country", FieldKind::NullableText),
        Field::new("meta_title", FieldKind::NullableText),
        Field::new("meta_description", FieldKind::NullableText),
        Field::new("is_active", FieldKind::Boolean),
        Field::new("is_published", FieldKind::Boolean),
        Field::new("custom_domain", FieldKind::NullableText),
    ],
);

/// Columns a super-admin may change through `PUT /admin/shops/{id}`.
pub const ADMIN_SHOP_UPDATE: Whitelist = Whitelist::new(
    "shops",
    &[
        Field::new("is_active", FieldKind::Boolean),
        Field::new("is_published", FieldKind::Boolean),
        Field::new("domain_verified", FieldKind::Boolean),
        Field::new("custom_domain", FieldKind::NullableText),
        Field::new("ssl_enabled", FieldKind::Boolean),
    ],
);

const ADMIN_SHOP_LIST: ListQuery = ListQuery {
    from: "shops s JOIN users u ON u.id = s.user_id",
    columns: "s.id, s.user_id, s.name, s.slug, s.custom_domain, s.domain_verified, \
              s.is_active, s.is_published, s.created_at, s.updated_at, \
              u.email AS user_email, u.name AS user_name, \
              (SELECT COUNT(*) FROM products p WHERE p.shop_id = s.id) AS products_count, \
              (SELECT COUNT(*) FROM orders o WHERE o.shop_id = s.id) AS orders_count, \
              (SELECT COALESCE(SUM(o.total), 0) FROM orders o \
                WHERE o.shop_id = s.id AND o.payment_status = 'paid') AS revenue",
    order_by: "s.created_at DESC",
};

const SLUG_TAKEN: &str = "Shop slug already taken";

/// Unique constraints on `shops` and the message each one surfaces as.
pub(crate) const SHOP_UNIQUE: &[(&str, &str)] = &[
    ("shops_slug_key", SLUG_TAKEN),
    ("shops_custom_domain_key", "Custom domain already in use"),
];

/// `status` filter of the super-admin shop listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatusFilter {
    Active,
    Inactive,
    Published,
    Unpublished,
}

impl ShopStatusFilter {
    fn apply(self, filter: Filter) -> Filter {
        match self {
            Self::Active => filter.flag("s.is_active", true),
            Self::Inactive => filter.flag("s.is_active", false),
            Self::Published => filter.flag("s.is_published", true),
            Self::Unpublished => filter.flag("s.is_published", false),
        }
    }
}

/// A shop about to be inserted. Slug and defaults are already resolved.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub user_id: UserId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub currency: String,
    pub language: String,
}

/// Repository for shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The shop `shop_id`, but only if `user_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn find_owned(
        &self,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1 AND user_id = $2"
        ))
        .bind(shop_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        into_shop(row)
    }

    /// A shop visible on the public storefront: active and published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn find_published(&self, slug: &str) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops \
             WHERE slug = $1 AND is_published = TRUE AND is_active = TRUE"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        into_shop(row)
    }

    /// All shops owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Shop>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether any shop already uses `slug`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shops WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// Insert a shop together with its default shipping method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn create(&self, shop: &NewShop) -> Result<Shop, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ShopRow>(&format!(
            "INSERT INTO shops (user_id, name, slug, description, currency, language) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SHOP_COLUMNS}"
        ))
        .bind(shop.user_id)
        .bind(&shop.name)
        .bind(&shop.slug)
        .bind(&shop.description)
        .bind(&shop.currency)
        .bind(&shop.language)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, SLUG_TAKEN))?;
        let created = Shop::try_from(created)?;

        sqlx::query(
            "INSERT INTO shipping_methods (shop_id, name, description, price, is_active, position) \
             VALUES ($1, $2, $3, $4, TRUE, 0)",
        )
        .bind(created.id)
        .bind(DEFAULT_SHIPPING_NAME)
        .bind(DEFAULT_SHIPPING_DESCRIPTION)
        .bind(default_shipping_price())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Apply an owner update. `None` when the shop is not owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new slug or custom domain
    /// is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        update: PartialUpdate,
    ) -> Result<Option<Shop>, RepositoryError> {
        let mut query = update.into_query(shop_id.as_uuid());
        query
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(SHOP_COLUMNS);

        let row = query
            .build_query_as::<ShopRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_by_constraint(e, SHOP_UNIQUE))?;

        into_shop(row)
    }

    /// Delete an owned shop and, by cascade, everything scoped to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop is not owned by `user_id`.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, shop_id: ShopId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shops WHERE id = $1 AND user_id = $2")
            .bind(shop_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Super-admin
    // =========================================================================

    /// Every shop on the platform with owner and counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(
        &self,
        search: Option<&str>,
        status: Option<ShopStatusFilter>,
        page: PageRequest,
    ) -> Result<Page<AdminShopListItem>, RepositoryError> {
        let mut filter =
            Filter::new().search(&["s.name", "s.slug", "s.custom_domain"], search);
        if let Some(status) = status {
            filter = status.apply(filter);
        }

        ADMIN_SHOP_LIST.fetch(self.pool, &filter, page).await
    }

    /// Shops owned by `user_id` with their counters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summaries_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ShopSummary>, RepositoryError> {
        let shops = sqlx::query_as::<_, ShopSummary>(
            "SELECT s.id, s.name, s.slug, s.custom_domain, s.is_active, s.is_published, \
                 s.created_at, \
                 (SELECT COUNT(*) FROM products p WHERE p.shop_id = s.id) AS products_count, \
                 (SELECT COUNT(*) FROM orders o WHERE o.shop_id = s.id) AS orders_count, \
                 (SELECT COALESCE(SUM(o.total), 0) FROM orders o \
                   WHERE o.shop_id = s.id AND o.payment_status = 'paid') AS revenue \
             FROM shops s WHERE s.user_id = $1 ORDER BY s.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(shops)
    }

    /// Apply a super-admin update to any shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the custom domain is taken.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn admin_update(
        &self,
        shop_id: ShopId,
        update: PartialUpdate,
    ) -> Result<Option<Shop>, RepositoryError> {
        let mut query = update.into_query(shop_id.as_uuid());
        query.push(" RETURNING ").push(SHOP_COLUMNS);

        let row = query
            .build_query_as::<ShopRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_by_constraint(e, SHOP_UNIQUE))?;

        into_shop(row)
    }

    /// Delete any shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn admin_delete(&self, shop_id: ShopId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
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

    fn row(slug: &str, currency: &str) -> ShopRow {
        let now = Utc::now();
        ShopRow {
            id: ShopId::random(),
            user_id: UserId::random(),
            name: "Čajovňa".to_string(),
            slug: slug.to_string(),
            description: None,
            logo: None,
            currency: currency.to_string(),
            language: "sk".to_string(),
            email: None,
            phone: None,
            address: None,
            city: None,
            zip: None,
            country: None,
            meta_title: None,
            meta_description: None,
            is_active: true,
            is_published: true,
            custom_domain: None,
            domain_verified: false,
            ssl_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_converts_to_shop() {
        let shop = Shop::try_from(row("cajovna", "EUR")).unwrap();
        assert_eq!(shop.slug, "cajovna");
        assert_eq!(shop.currency, "EUR");
        assert!(shop.is_open());
    }

    #[test]
    fn test_invalid_stored_slug_is_data_corruption() {
        let err = Shop::try_from(row("Čajovňa Bratislava", "EUR")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(ref msg) if msg.contains("invalid slug")));
    }

    #[test]
    fn test_invalid_stored_currency_is_data_corruption() {
        for currency in ["eur", "EURO", ""] {
            let err = Shop::try_from(row("cajovna", currency)).unwrap_err();
            assert!(matches!(err, RepositoryError::DataCorruption(ref msg) if msg.contains("invalid currency")));
        }
    }

    #[test]
    fn test_owner_cannot_touch_admin_columns() {
        let body = json!({
            "name": "Kaviareň",
            "user_id": "00000000-0000-0000-0000-000000000000",
            "domain_verified": true,
            "ssl_enabled": true
        });
        let update = SHOP_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_owner_update_is_scoped_to_owner() {
        let body = json!({"is_published": true});
        let update = SHOP_UPDATE.filter(body.as_object().unwrap()).unwrap();
        let mut query = update.into_query(uuid::Uuid::nil());
        query
            .push(" AND user_id = ")
            .push_bind(uuid::Uuid::nil())
            .push(" RETURNING ")
            .push(SHOP_COLUMNS);
        assert!(query.sql().starts_with(
            "UPDATE shops SET is_published = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3 RETURNING id, "
        ));
    }

    #[test]
    fn test_admin_whitelist() {
        let body = json!({"domain_verified": true, "name": "ignored"});
        let update = ADMIN_SHOP_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["domain_verified"]);
    }

    #[test]
    fn test_status_filter_renders_flag() {
        let filter = ShopStatusFilter::Unpublished.apply(Filter::new());
        let sql = ADMIN_SHOP_LIST.count_query(&filter).into_sql();
        assert!(sql.ends_with(" WHERE s.is_published = FALSE"));
    }

    #[test]
    fn test_unique_constraints_match_schema() {
        let schema = include_str!("../../migrations/20260101000001_initial.sql");
        assert!(schema.contains("slug              TEXT NOT NULL UNIQUE"));
        assert!(schema.contains("custom_domain     TEXT UNIQUE"));
        let names: Vec<_> = SHOP_UNIQUE.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["shops_slug_key", "shops_custom_domain_key"]);
    }

    #[test]
    fn test_default_shipping_price() {
        assert_eq!(default_shipping_price().to_string(), "4.99");
    }
}
