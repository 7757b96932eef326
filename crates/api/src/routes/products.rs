//! Owner product routes.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{CategoryId, Page, ProductId, ShopId, is_storable_amount, with_random_suffix};

use crate::db::products::{PRODUCT_UPDATE, ProductQuery, ProductSort, ProductStatusFilter};
use crate::db::update::{FieldValue, PartialUpdate};
use crate::db::{CategoryRepository, ProductRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath, AppQuery};
use crate::middleware::RequireUser;
use crate::models::{
    CreateProductInput, ImportReport, Product, ProductCatalog, ProductExport, ProductListItem,
};
use crate::routes::shops::requested_slug;
use crate::routes::{missing, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

/// Most products one import request may carry.
pub const MAX_IMPORT: usize = 1000;

/// Query parameters of `GET /shops/{shop_id}/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatusFilter>,
    #[serde(default)]
    pub sort: ProductSort,
}

#[instrument(skip(state, params))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppQuery(params): AppQuery<ProductListParams>,
) -> Result<Json<Page<ProductListItem>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let page = state.page_request(params.page, params.limit);
    let query = ProductQuery {
        search: params.search.as_deref(),
        category_id: params.category_id,
        status: params.status,
        sort: params.sort,
    };
    let products = ProductRepository::new(state.pool())
        .list(shop_id, &query, page)
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state, input), fields(name = %input.name))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(input): AppJson<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let product = insert(&state, shop_id, &input).await?;
    tracing::info!(%shop_id, product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Insert each product of the body on its own; failures are reported per
/// product and do not roll back the others.
#[instrument(skip(state, catalog), fields(count = catalog.products.len()))]
pub async fn import(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(catalog): AppJson<ProductCatalog<CreateProductInput>>,
) -> Result<Json<ImportReport>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    if catalog.products.len() > MAX_IMPORT {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_IMPORT} products can be imported at once"
        )));
    }

    let mut report = ImportReport::default();
    for (index, input) in catalog.products.iter().enumerate() {
        let outcome = insert(&state, shop_id, input).await.map(|_| ());
        record(&mut report, index, input, outcome);
    }

    tracing::info!(
        %shop_id,
        imported = report.imported,
        failed = report.errors.len(),
        "products imported"
    );
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn export(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<impl IntoResponse, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let products = ProductRepository::new(state.pool()).export(shop_id).await?;
    Ok(export_response(products))
}

fn export_response(products: Vec<ProductExport>) -> impl IntoResponse {
    (
        [(header::CONTENT_DISPOSITION, "attachment; filename=products.json")],
        Json(ProductCatalog { products }),
    )
}

fn record(
    report: &mut ImportReport,
    index: usize,
    input: &CreateProductInput,
    outcome: Result<(), AppError>,
) {
    match outcome {
        Ok(()) => report.imported += 1,
        Err(err) => {
            if err.status().is_server_error() {
                tracing::warn!(index, error = %err, "product import failed");
            }
            report.errors.push(format!(
                "Product {} ({}): {}",
                index + 1,
                input.name.trim(),
                err.public_message()
            ));
        }
    }
}

/// Validate and insert one product, picking a free slug.
async fn insert(
    state: &AppState,
    shop_id: ShopId,
    input: &CreateProductInput,
) -> Result<Product, AppError> {
    validate(input)?;
    if let Some(category_id) = input.category_id {
        ensure_category(state, shop_id, category_id).await?;
    }

    let repo = ProductRepository::new(state.pool());
    let slug = requested_slug(input.slug.as_deref(), &input.name)?;
    let slug = if repo.slug_exists(shop_id, &slug).await? {
        with_random_suffix(&slug)
    } else {
        slug
    };

    Ok(repo.create(shop_id, &slug, input).await?)
}

#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, ProductId)>,
) -> Result<Json<Product>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let product = ProductRepository::new(state.pool())
        .get(shop_id, id)
        .await?
        .ok_or_else(|| not_found("Product"))?;
    Ok(Json(product))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, ProductId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Product>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = PRODUCT_UPDATE.filter(&body)?;
    if let Some(category_id) = assigned_category(&update) {
        ensure_category(&state, shop_id, category_id).await?;
    }

    let product = ProductRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Product"))?;
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, ProductId)>,
) -> Result<StatusCode, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    ProductRepository::new(state.pool())
        .delete(shop_id, id)
        .await
        .map_err(missing("Product"))?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &CreateProductInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }
    let prices = [Some(input.price), input.compare_price, input.cost_price];
    if !prices.into_iter().flatten().all(is_storable_amount) {
        return Err(AppError::BadRequest(
            "Prices must be between 0 and 9999999999.99".to_string(),
        ));
    }
    Ok(())
}

/// The category a partial update moves the product into, if any.
fn assigned_category(update: &PartialUpdate) -> Option<CategoryId> {
    match update.get("category_id")? {
        FieldValue::NullableUuid(Some(id)) => Some(CategoryId::new(*id)),
        _ => None,
    }
}

/// Reject category references that point outside the shop.
async fn ensure_category(
    state: &AppState,
    shop_id: ShopId,
    category_id: CategoryId,
) -> Result<(), AppError> {
    if CategoryRepository::new(state.pool())
        .belongs_to(shop_id, category_id)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::BadRequest("Unknown category".to_string()))
    }
}
