//! Owner shop routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{ShopId, is_valid_slug, slugify, with_random_suffix};

use crate::db::{RepositoryError, ShopRepository};
use crate::db::shops::{NewShop, SHOP_UPDATE};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{CreateShopInput, Shop};
use crate::services::owned_shop;
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "EUR";
const DEFAULT_LANGUAGE: &str = "sk";

/// `GET /shops` - the caller's shops, newest first.
#[instrument(skip(state))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Shop>>, AppError> {
    let shops = ShopRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(shops))
}

/// `POST /shops`
#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateShopInput>,
) -> Result<(StatusCode, Json<Shop>), AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Shop name is required".to_string()));
    }

    let repo = ShopRepository::new(state.pool());
    let slug = requested_slug(input.slug.as_deref(), name)?;
    let slug = if repo.slug_exists(&slug).await? {
        with_random_suffix(&slug)
    } else {
        slug
    };

    let currency = match input.currency.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CURRENCY.to_string(),
        Some(code) if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        Some(_) => {
            return Err(AppError::BadRequest(
                "Currency must be a three-letter code".to_string(),
            ));
        }
    };
    let language = input
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    let shop = repo
        .create(&NewShop {
            user_id: user.id,
            name: name.to_string(),
            slug,
            description: input.description,
            currency,
            language,
        })
        .await?;

    tracing::info!(shop_id = %shop.id, slug = %shop.slug, "shop created");
    Ok((StatusCode::CREATED, Json(shop)))
}

/// `GET /shops/{shop_id}`
#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<Shop>, AppError> {
    let shop = owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;
    Ok(Json(shop))
}

/// `PUT /shops/{shop_id}` - whitelisted partial update.
#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Shop>, AppError> {
    let repo = ShopRepository::new(state.pool());
    owned_shop(&repo, &user, shop_id).await?;

    let update = SHOP_UPDATE.filter(&body)?;
    let shop = repo
        .update(shop_id, user.id, update)
        .await?
        .ok_or_else(AppError::shop_not_found)?;
    Ok(Json(shop))
}

/// `DELETE /shops/{shop_id}` - removes the shop and everything in it.
#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<StatusCode, AppError> {
    let repo = ShopRepository::new(state.pool());
    owned_shop(&repo, &user, shop_id).await?;

    repo.delete(shop_id, user.id).await.map_err(|err| match err {
        RepositoryError::NotFound => AppError::shop_not_found(),
        other => other.into(),
    })?;

    tracing::info!(%shop_id, "shop deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The slug a new resource should start from: the caller's (validated) or
/// one derived from its name.
pub(crate) fn requested_slug(requested: Option<&str>, name: &str) -> Result<String, AppError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(_) => Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits and dashes".to_string(),
        )),
        None => {
            let slug = slugify(name);
            if slug.is_empty() {
                Ok(with_random_suffix("item"))
            } else {
                Ok(slug)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_name() {
        assert_eq!(requested_slug(None, "Moja Čajovňa").unwrap(), "moja-cajovna");
        assert_eq!(requested_slug(Some("  "), "Kvety").unwrap(), "kvety");
    }

    #[test]
    fn test_explicit_slug_must_be_valid() {
        assert_eq!(requested_slug(Some("kvety-24"), "x").unwrap(), "kvety-24");
        assert!(requested_slug(Some("Kvety 24"), "x").is_err());
    }

    #[test]
    fn test_unsluggable_name_gets_random_slug() {
        let slug = requested_slug(None, "!!!").unwrap();
        assert!(slug.starts_with("item-"));
        assert!(is_valid_slug(&slug));
    }
}
