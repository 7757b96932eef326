//! Tenant access guard.
//!
//! Every owner route that names a shop resolves it through [`owned_shop`]
//! before touching anything scoped to it. The lookup constrains both the
//! shop id and the caller in one query and runs on every request, so a
//! revoked or transferred shop stops being reachable immediately.

use async_trait::async_trait;

use shopforge_core::{ShopId, UserId};

use crate::db::{RepositoryError, ShopRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, Shop};

/// Lookup of shops by owner.
#[async_trait]
pub trait ShopDirectory: Send + Sync {
    /// The shop `shop_id` if and only if `user_id` owns it.
    async fn find_owned(
        &self,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<Option<Shop>, RepositoryError>;
}

#[async_trait]
impl ShopDirectory for ShopRepository<'_> {
    async fn find_owned(
        &self,
        shop_id: ShopId,
        user_id: UserId,
    ) -> Result<Option<Shop>, RepositoryError> {
        ShopRepository::find_owned(self, shop_id, user_id).await
    }
}

/// Prove that `caller` owns `shop_id` and return the shop.
///
/// Super-admins get no shortcut here; they use the `/admin` routes.
///
/// # Errors
///
/// Returns `AppError::NotFound("Shop not found")` when the shop does not
/// exist or belongs to someone else, and `AppError::Database` if the lookup
/// fails.
pub async fn owned_shop<D>(directory: &D, caller: &CurrentUser, shop_id: ShopId) -> Result<Shop, AppError>
where
    D: ShopDirectory + ?Sized,
{
    match directory.find_owned(shop_id, caller.id).await? {
        Some(shop) => Ok(shop),
        None => {
            tracing::debug!(%shop_id, user_id = %caller.id, "shop not owned by caller");
            Err(AppError::shop_not_found())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use shopforge_core::UserRole;

    use super::*;

    /// In-memory directory keyed by shop id.
    #[derive(Default)]
    struct MemoryDirectory {
        shops: Vec<Shop>,
        lookups: Mutex<u32>,
    }

    #[async_trait]
    impl ShopDirectory for MemoryDirectory {
        async fn find_owned(
            &self,
            shop_id: ShopId,
            user_id: UserId,
        ) -> Result<Option<Shop>, RepositoryError> {
            *self.lookups.lock().unwrap() += 1;
            Ok(self
                .shops
                .iter()
                .find(|s| s.id == shop_id && s.user_id == user_id)
                .cloned())
        }
    }

    fn shop(owner: UserId) -> Shop {
        let now = Utc::now();
        Shop {
            id: ShopId::random(),
            user_id: owner,
            name: "Čajovňa".to_string(),
            slug: "cajovna".to_string(),
            description: None,
            logo: None,
            currency: "EUR".to_string(),
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
            is_published: false,
            custom_domain: None,
            domain_verified: false,
            ssl_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn caller(id: UserId, role: UserRole) -> CurrentUser {
        CurrentUser { id, role }
    }

    #[tokio::test]
    async fn test_owner_gets_shop() {
        let owner = UserId::random();
        let s = shop(owner);
        let id = s.id;
        let directory = MemoryDirectory {
            shops: vec![s],
            ..Default::default()
        };

        let found = owned_shop(&directory, &caller(owner, UserRole::User), id)
            .await
            .unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn test_foreign_and_missing_shops_look_the_same() {
        let owner = UserId::random();
        let s = shop(owner);
        let foreign_id = s.id;
        let directory = MemoryDirectory {
            shops: vec![s],
            ..Default::default()
        };
        let intruder = caller(UserId::random(), UserRole::User);

        let foreign = owned_shop(&directory, &intruder, foreign_id).await.unwrap_err();
        let missing = owned_shop(&directory, &intruder, ShopId::random())
            .await
            .unwrap_err();

        assert!(matches!(&foreign, AppError::NotFound(msg) if msg == "Shop not found"));
        assert_eq!(foreign.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn test_super_admin_is_not_an_owner() {
        let s = shop(UserId::random());
        let id = s.id;
        let directory = MemoryDirectory {
            shops: vec![s],
            ..Default::default()
        };

        let err = owned_shop(&directory, &caller(UserId::random(), UserRole::SuperAdmin), id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_every_call_hits_the_directory() {
        let owner = UserId::random();
        let s = shop(owner);
        let id = s.id;
        let directory = MemoryDirectory {
            shops: vec![s],
            ..Default::default()
        };
        let me = caller(owner, UserRole::User);

        for _ in 0..3 {
            owned_shop(&directory, &me, id).await.unwrap();
        }
        assert_eq!(*directory.lookups.lock().unwrap(), 3);
    }
}
