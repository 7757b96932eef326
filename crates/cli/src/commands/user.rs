//! User account commands.
//!
//! Accounts normally come from the login service; these commands cover
//! bootstrapping a fresh database and granting operator access.

use shopforge_api::db::{RepositoryError, UserRepository};
use shopforge_core::UserRole;
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, super_admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No user with email: {0}")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn validate_email(email: &str) -> Result<&str, UserError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(UserError::InvalidEmail(email.to_owned())),
    }
}

/// Create a user account.
pub async fn create(email: &str, name: &str, role: &str) -> Result<(), UserError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email = validate_email(email)?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool).create(email, name, role).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Grant `super_admin` to the account with `email`.
pub async fn promote(email: &str) -> Result<(), UserError> {
    let email = validate_email(email)?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .set_role_by_email(email, UserRole::SuperAdmin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(email.to_owned()),
            other => other.into(),
        })?;

    tracing::info!("{} is now a super admin", user.email);
    tracing::warn!("Existing sessions keep their old role until the user logs in again");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("  jana@obchod.sk ").ok(), Some("jana@obchod.sk"));
        assert!(validate_email("jana").is_err());
        assert!(validate_email("@obchod.sk").is_err());
        assert!(validate_email("jana@localhost").is_err());
    }
}
