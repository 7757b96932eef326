//! Owner customer routes. Customers are read and edited here; they are
//! never created through the owner surface.

use axum::Json;
use axum::extract::State;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{CustomerId, Page, ShopId};

use crate::db::customers::CUSTOMER_UPDATE;
use crate::db::{CustomerRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath, AppQuery};
use crate::middleware::RequireUser;
use crate::models::Customer;
use crate::routes::{ListParams, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

#[instrument(skip(state, params))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Page<Customer>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let page = state.page_request(params.page, params.limit);
    let customers = CustomerRepository::new(state.pool())
        .list(shop_id, params.search.as_deref(), page)
        .await?;
    Ok(Json(customers))
}

#[instrument(skip(state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CustomerId)>,
) -> Result<Json<Customer>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let customer = CustomerRepository::new(state.pool())
        .get(shop_id, id)
        .await?
        .ok_or_else(|| not_found("Customer"))?;
    Ok(Json(customer))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CustomerId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Customer>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = CUSTOMER_UPDATE.filter(&body)?;
    let customer = CustomerRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Customer"))?;
    Ok(Json(customer))
}
