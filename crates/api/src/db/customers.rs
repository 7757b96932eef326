//! Customer repository.

use sqlx::PgPool;

use shopforge_core::{CustomerId, Page, PageRequest, ShopId};

use super::RepositoryError;
use super::listing::{Filter, ListQuery};
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, shop_id, email, first_name, last_name, phone, address, \
     city, zip, country, accepts_marketing, notes, created_at, updated_at";

/// Columns an owner may change through `PUT .../customers/{id}`.
///
/// The email is the customer's identity within the shop and stays fixed.
pub const CUSTOMER_UPDATE: Whitelist = Whitelist::new(
    "customers",
    &[
        Field::new("first_name", FieldKind::NullableText),
        Field::new("last_name", FieldKind::NullableText),
        Field::new("phone", FieldKind::NullableText),
        Field::new("address", FieldKind::NullableText),
        Field::new("city", FieldKind::NullableText),
        Field::new("zip", FieldKind::NullableText),
        Field::new("country", FieldKind::NullableText),
        Field::new("accepts_marketing", FieldKind::Boolean),
        Field::new("notes", FieldKind::NullableText),
    ],
);

const CUSTOMER_LIST: ListQuery = ListQuery {
    from: "customers",
    columns: CUSTOMER_COLUMNS,
    order_by: "created_at DESC",
};

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers of a shop, searchable by email and name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        shop_id: ShopId,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Customer>, RepositoryError> {
        let filter = Filter::new()
            .uuid("shop_id", shop_id)
            .search(&["email", "first_name", "last_name"], search);

        CUSTOMER_LIST.fetch(self.pool, &filter, page).await
    }

    /// A customer of `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        shop_id: ShopId,
        id: CustomerId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND shop_id = $2"
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Apply an owner update. `None` when the customer is not in `shop_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        shop_id: ShopId,
        id: CustomerId,
        update: PartialUpdate,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND shop_id = ")
            .push_bind(shop_id)
            .push(" RETURNING ")
            .push(CUSTOMER_COLUMNS);

        let customer = query
            .build_query_as::<Customer>()
            .fetch_optional(self.pool)
            .await?;

        Ok(customer)
    }
}
