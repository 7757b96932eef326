//! User repository.
//!
//! Accounts are created by the external login service or the CLI; the API
//! itself only reads them and lets a super-admin edit a few columns.

use sqlx::PgPool;

use shopforge_core::{Page, PageRequest, UserId, UserRole};

use super::RepositoryError;
use super::listing::{Filter, ListQuery};
use super::update::{Field, FieldKind, PartialUpdate, Whitelist};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, name, role, is_active, created_at, updated_at";

fn parse_user_role(s: &str) -> Option<&'static str> {
    s.parse::<UserRole>().ok().map(UserRole::as_str)
}

/// Columns a super-admin may change through `PUT /admin/users/{id}`.
pub const USER_UPDATE: Whitelist = Whitelist::new(
    "users",
    &[
        Field::new("name", FieldKind::Text),
        Field::new("role", FieldKind::Enum(parse_user_role)),
        Field::new("is_active", FieldKind::Boolean),
    ],
);

/// Columns a user may change on their own account through `PUT /me`.
/// Email and password belong to the login service.
pub const PROFILE_UPDATE: Whitelist =
    Whitelist::new("users", &[Field::new("name", FieldKind::Text)]);

const USER_LIST: ListQuery = ListQuery {
    from: "users",
    columns: USER_COLUMNS,
    order_by: "created_at DESC",
};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// All users, newest first, optionally filtered by role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<Page<User>, RepositoryError> {
        let mut filter = Filter::new().search(&["email", "name"], search);
        if let Some(role) = role {
            filter = filter.text("role", role.as_str());
        }

        USER_LIST.fetch(self.pool, &filter, page).await
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(email.trim().to_lowercase())
        .bind(name.trim())
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, "Email already registered"))
    }

    /// Change the role of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_role_by_email(
        &self,
        email: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1, updated_at = NOW() \
             WHERE LOWER(email) = LOWER($2) RETURNING {USER_COLUMNS}"
        ))
        .bind(role)
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Apply a super-admin update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: UserId,
        update: PartialUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query.push(" RETURNING ").push(USER_COLUMNS);

        let user = query
            .build_query_as::<User>()
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Apply a self-service profile update. `None` when the account is gone
    /// or deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: PartialUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = update.into_query(id.as_uuid());
        query
            .push(" AND is_active = TRUE RETURNING ")
            .push(USER_COLUMNS);

        let user = query
            .build_query_as::<User>()
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Delete a user and, by cascade, their shops. Super-admin accounts are
    /// never deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deletable user has that id.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role <> $2")
            .bind(id)
            .bind(UserRole::SuperAdmin)
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

    #[test]
    fn test_email_is_not_updatable() {
        let body = json!({"email": "x@example.com", "role": "super_admin"});
        let update = USER_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["role"]);
        assert_eq!(update.text("role"), Some("super_admin"));
    }

    #[test]
    fn test_profile_update_is_name_only() {
        let body = json!({"name": "Jana Nováková", "role": "super_admin", "is_active": true});
        let update = PROFILE_UPDATE.filter(body.as_object().unwrap()).unwrap();
        assert_eq!(update.columns().collect::<Vec<_>>(), vec!["name"]);

        let body = json!({"email": "jana@example.sk"});
        assert!(PROFILE_UPDATE.filter(body.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let body = json!({"role": "root"});
        assert!(USER_UPDATE.filter(body.as_object().unwrap()).is_err());
    }
}
