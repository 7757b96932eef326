//! Owner coupon routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::instrument;

use shopforge_core::{CouponId, CouponKind, ShopId, is_storable_amount};

use crate::db::coupons::COUPON_UPDATE;
use crate::db::{CouponRepository, ShopRepository};
use crate::error::{AppError, AppJson, AppPath};
use crate::middleware::RequireUser;
use crate::models::{Coupon, CreateCouponInput};
use crate::routes::{missing, not_found};
use crate::services::owned_shop;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let coupons = CouponRepository::new(state.pool()).list(shop_id).await?;
    Ok(Json(coupons))
}

#[instrument(skip(state, input), fields(code = %input.code))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(shop_id): AppPath<ShopId>,
    AppJson(input): AppJson<CreateCouponInput>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;
    validate(&input)?;

    let coupon = CouponRepository::new(state.pool())
        .create(shop_id, &input)
        .await?;

    tracing::info!(%shop_id, coupon_id = %coupon.id, "coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[instrument(skip(state, body))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CouponId)>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<Coupon>, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    let update = COUPON_UPDATE.filter(&body)?;
    let coupon = CouponRepository::new(state.pool())
        .update(shop_id, id, update)
        .await?
        .ok_or_else(|| not_found("Coupon"))?;
    Ok(Json(coupon))
}

#[instrument(skip(state))]
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath((shop_id, id)): AppPath<(ShopId, CouponId)>,
) -> Result<StatusCode, AppError> {
    owned_shop(&ShopRepository::new(state.pool()), &user, shop_id).await?;

    CouponRepository::new(state.pool())
        .delete(shop_id, id)
        .await
        .map_err(missing("Coupon"))?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &CreateCouponInput) -> Result<(), AppError> {
    let reject = |msg: &str| Err(AppError::BadRequest(msg.to_string()));

    if input.code.trim().is_empty() {
        return reject("Coupon code is required");
    }
    if !is_storable_amount(input.value) {
        return reject("Coupon value must be between 0 and 9999999999.99");
    }
    if input.kind == CouponKind::Percentage && input.value > Decimal::ONE_HUNDRED {
        return reject("Percentage coupons cannot exceed 100");
    }
    if input.min_order_value.is_some_and(|v| !is_storable_amount(v)) {
        return reject("Minimum order value must be between 0 and 9999999999.99");
    }
    if input.max_uses.is_some_and(|n| n < 0) {
        return reject("Maximum uses must not be negative");
    }
    if let (Some(start), Some(end)) = (input.starts_at, input.expires_at)
        && end <= start
    {
        return reject("Coupon must expire after it starts");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rstest::rstest;

    use super::*;

    fn input(kind: CouponKind, value: Decimal) -> CreateCouponInput {
        CreateCouponInput {
            code: "leto10".to_string(),
            kind,
            value,
            min_order_value: None,
            max_uses: None,
            starts_at: None,
            expires_at: None,
            is_active: true,
        }
    }

    #[rstest]
    #[case::full_percentage(CouponKind::Percentage, Decimal::ONE_HUNDRED, true)]
    #[case::fixed(CouponKind::Fixed, Decimal::new(250, 0), true)]
    #[case::free_fixed(CouponKind::Fixed, Decimal::ZERO, true)]
    #[case::over_hundred_percent(CouponKind::Percentage, Decimal::new(10001, 2), false)]
    #[case::negative(CouponKind::Fixed, Decimal::new(-1, 0), false)]
    #[case::beyond_money_column(CouponKind::Fixed, Decimal::new(10_000_000_000, 0), false)]
    fn test_coupon_value(#[case] kind: CouponKind, #[case] value: Decimal, #[case] valid: bool) {
        assert_eq!(validate(&input(kind, value)).is_ok(), valid);
    }

    #[test]
    fn test_min_order_value_beyond_money_column() {
        let mut coupon = input(CouponKind::Fixed, Decimal::new(5, 0));
        coupon.min_order_value = Some(Decimal::new(1_000_000_000_000, 2));
        assert!(validate(&coupon).is_err());
    }

    #[test]
    fn test_blank_code_rejected() {
        let mut coupon = input(CouponKind::Fixed, Decimal::new(5, 0));
        coupon.code = "   ".to_string();
        assert!(validate(&coupon).is_err());
    }

    #[test]
    fn test_window_must_be_ordered() {
        let now = Utc::now();
        let mut coupon = input(CouponKind::Fixed, Decimal::new(5, 0));
        coupon.starts_at = Some(now);
        coupon.expires_at = Some(now - Duration::days(1));
        assert!(validate(&coupon).is_err());

        coupon.expires_at = Some(now + Duration::days(1));
        assert!(validate(&coupon).is_ok());
    }
}
