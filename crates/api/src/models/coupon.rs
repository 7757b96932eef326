//! Discount coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopforge_core::{CouponId, CouponKind, ShopId, percent_of, round_money};

/// A shop's discount code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub shop_id: ShopId,
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_order_value: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a coupon cannot be applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon is not valid")]
    Unknown,
    #[error("Coupon is not active")]
    Inactive,
    #[error("Coupon is not valid yet")]
    NotStarted,
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon usage limit reached")]
    UsageLimitReached,
    #[error("Minimum order value for this coupon is {0}")]
    BelowMinimum(Decimal),
}

impl Coupon {
    /// Discount this coupon grants on `subtotal` at `now`.
    ///
    /// The discount never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first failed condition: active flag, start/expiry window,
    /// usage cap, minimum order value.
    pub fn discount_for(
        &self,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.starts_at.is_some_and(|starts| now < starts) {
            return Err(CouponRejection::NotStarted);
        }
        if self.expires_at.is_some_and(|expires| now >= expires) {
            return Err(CouponRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(CouponRejection::UsageLimitReached);
        }
        if let Some(minimum) = self.min_order_value
            && subtotal < minimum
        {
            return Err(CouponRejection::BelowMinimum(minimum));
        }

        let discount = match self.kind {
            CouponKind::Percentage => percent_of(subtotal, self.value),
            CouponKind::Fixed => round_money(self.value),
        };
        Ok(discount.min(subtotal))
    }
}

/// Body of `POST /shops/{shop_id}/coupons`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCouponInput {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    #[serde(default)]
    pub max_uses: Option<i32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}
