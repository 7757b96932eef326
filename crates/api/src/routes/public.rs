//! Public storefront routes.
//!
//! Everything here is addressed by the shop's public slug and only answers
//! for shops that are both active and published. No session is required.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

use shopforge_core::Page;

use crate::db::products::{ProductSort, PublicProductQuery};
use crate::db::{
    CategoryRepository, PaymentMethodRepository, ProductRepository, ShippingMethodRepository,
    ShopRepository,
};
use crate::error::{AppError, AppJson, AppPath, AppQuery};
use crate::models::{
    PublicCategory, PublicPaymentMethod, PublicProduct, PublicShippingMethod, PublicShop, Shop,
};
use crate::routes::not_found;
use crate::services::{Checkout, CheckoutRequest, OrderPlaced, PgCheckoutStore};
use crate::state::AppState;

/// Query parameters of `GET /shop/{slug}/products`.
#[derive(Debug, Default, Deserialize)]
pub struct StorefrontProductParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort: ProductSort,
}

async fn published(state: &AppState, slug: &str) -> Result<Shop, AppError> {
    ShopRepository::new(state.pool())
        .find_published(slug)
        .await?
        .ok_or_else(AppError::shop_not_found)
}

/// `GET /shop/{slug}` - the shop's public profile.
#[instrument(skip(state))]
pub async fn shop(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<PublicShop>, AppError> {
    let shop = published(&state, &slug).await?;
    Ok(Json(shop.into()))
}

/// `GET /shop/{slug}/products`
#[instrument(skip(state, params))]
pub async fn products(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppQuery(params): AppQuery<StorefrontProductParams>,
) -> Result<Json<Page<PublicProduct>>, AppError> {
    let shop = published(&state, &slug).await?;
    let page = state.page_request(params.page, params.limit);

    let category_id = match params.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => {
            let Some(id) = CategoryRepository::new(state.pool())
                .id_by_slug(shop.id, category)
                .await?
            else {
                return Ok(Json(Page::new(Vec::new(), page, 0)));
            };
            Some(id)
        }
        None => None,
    };

    let query = PublicProductQuery {
        search: params.search.as_deref(),
        category_id,
        featured: params.featured,
        sort: params.sort,
    };
    let products = ProductRepository::new(state.pool())
        .list_public(shop.id, &query, page)
        .await?;
    Ok(Json(products))
}

/// `GET /shop/{slug}/products/{product_slug}`
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    AppPath((slug, product_slug)): AppPath<(String, String)>,
) -> Result<Json<PublicProduct>, AppError> {
    let shop = published(&state, &slug).await?;

    let product = ProductRepository::new(state.pool())
        .public_by_slug(shop.id, &product_slug)
        .await?
        .ok_or_else(|| not_found("Product"))?;
    Ok(Json(product))
}

/// `GET /shop/{slug}/categories`
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Vec<PublicCategory>>, AppError> {
    let shop = published(&state, &slug).await?;
    let categories = CategoryRepository::new(state.pool())
        .list_public(shop.id)
        .await?;
    Ok(Json(categories))
}

/// `GET /shop/{slug}/shipping-methods`
#[instrument(skip(state))]
pub async fn shipping_methods(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Vec<PublicShippingMethod>>, AppError> {
    let shop = published(&state, &slug).await?;
    let methods = ShippingMethodRepository::new(state.pool())
        .list_public(shop.id)
        .await?;
    Ok(Json(methods))
}

/// `GET /shop/{slug}/payment-methods`
#[instrument(skip(state))]
pub async fn payment_methods(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Vec<PublicPaymentMethod>>, AppError> {
    let shop = published(&state, &slug).await?;
    let methods = PaymentMethodRepository::new(state.pool())
        .list_public(shop.id)
        .await?;
    Ok(Json(methods))
}

/// `POST /shop/{slug}/orders` - place an order.
#[instrument(skip(state, request))]
pub async fn checkout(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderPlaced>), AppError> {
    let store = PgCheckoutStore::new(state.pool());
    let placed = Checkout::new(&store, state.order_numbers(), state.config().price_tolerance)
        .place_order(&slug, request)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}
