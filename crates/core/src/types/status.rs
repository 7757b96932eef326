//! Status enums for orders, payments, coupons and users.
//!
//! All of these are stored as `TEXT` columns guarded by `CHECK` constraints,
//! so the `sqlx` impls go through `&str` rather than a Postgres enum type.
//! Order and payment statuses carry explicit transition tables; anything not
//! listed there is rejected with [`TransitionError`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// A status change that the transition table does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot change {kind} from {from} to {to}")]
pub struct TransitionError {
    pub kind: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// Implements `Display`, `FromStr` and the text-backed `sqlx` traits for a
/// status enum that exposes `as_str()` and `parse_str()`.
macro_rules! text_status {
    ($name:ident, $kind:literal) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_str(s).ok_or_else(|| ParseStatusError {
                    kind: $kind,
                    value: s.to_owned(),
                })
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

// =============================================================================
// Order status
// =============================================================================

/// Fulfilment status of an order.
///
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │             │
///    └─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// `true` for statuses nothing can move out of.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the transition table allows `self -> next`.
    ///
    /// Re-applying the current status is always allowed (a no-op).
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next
            || matches!(
                (self, next),
                (Self::Pending, Self::Processing | Self::Cancelled)
                    | (Self::Processing, Self::Shipped | Self::Cancelled)
                    | (Self::Shipped, Self::Delivered)
            )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the table does not allow `self -> next`.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                kind: "order status",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

text_status!(OrderStatus, "order status");

// =============================================================================
// Payment status
// =============================================================================

/// Payment status of an order.
///
/// `completed` is accepted on input as an alias of `paid`; it is never
/// written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    #[serde(alias = "completed")]
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        if s == "completed" {
            return Some(Self::Paid);
        }
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Whether the transition table allows `self -> next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next
            || matches!(
                (self, next),
                (Self::Pending, Self::Paid | Self::Failed)
                    | (Self::Failed, Self::Pending | Self::Paid)
                    | (Self::Paid, Self::Refunded)
            )
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the table does not allow `self -> next`.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                kind: "payment status",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

text_status!(PaymentStatus, "payment status");

// =============================================================================
// Coupon kind
// =============================================================================

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` percent of the subtotal.
    Percentage,
    /// `value` off the subtotal, in the shop's currency.
    Fixed,
}

impl CouponKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

text_status!(CouponKind, "coupon kind");

// =============================================================================
// Payment provider
// =============================================================================

/// Provider behind a shop's payment method. Only the choice is stored here;
/// talking to the gateway is someone else's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Gopay,
    Stripe,
    Comgate,
    /// Cash on delivery.
    Cod,
    BankTransfer,
}

impl PaymentProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gopay => "gopay",
            Self::Stripe => "stripe",
            Self::Comgate => "comgate",
            Self::Cod => "cod",
            Self::BankTransfer => "bank_transfer",
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        match s {
            "gopay" => Some(Self::Gopay),
            "stripe" => Some(Self::Stripe),
            "comgate" => Some(Self::Comgate),
            "cod" => Some(Self::Cod),
            "bank_transfer" => Some(Self::BankTransfer),
            _ => None,
        }
    }
}

text_status!(PaymentProvider, "payment provider");

// =============================================================================
// User role
// =============================================================================

/// Platform role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shop owner; sees only their own shops.
    #[default]
    User,
    /// Platform operator with access to the `/admin` routes.
    SuperAdmin,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::SuperAdmin => "super_admin",
        }
    }

    fn parse_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }
}

text_status!(UserRole, "user role");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Processing)]
    #[case(OrderStatus::Pending, OrderStatus::Cancelled)]
    #[case(OrderStatus::Processing, OrderStatus::Shipped)]
    #[case(OrderStatus::Processing, OrderStatus::Cancelled)]
    #[case(OrderStatus::Shipped, OrderStatus::Delivered)]
    fn test_order_allowed_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        assert_eq!(from.transition_to(to), Ok(to));
    }

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Delivered)]
    #[case(OrderStatus::Shipped, OrderStatus::Cancelled)]
    #[case(OrderStatus::Delivered, OrderStatus::Pending)]
    #[case(OrderStatus::Cancelled, OrderStatus::Processing)]
    fn test_order_rejected_transitions(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        let err = from.transition_to(to).unwrap_err();
        assert_eq!(err.from, from.as_str());
        assert_eq!(err.to, to.as_str());
    }

    #[test]
    fn test_terminal_statuses_only_allow_themselves() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in OrderStatus::ALL {
                assert_eq!(terminal.can_transition_to(next), next == terminal);
            }
        }
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Failed.can_transition_to(PaymentStatus::Pending));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn test_payment_completed_alias() {
        assert_eq!("completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        let parsed: PaymentStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Paid);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"paid\"");
    }

    #[test]
    fn test_parse_unknown_status() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::SuperAdmin.to_string(), "super_admin");
        assert_eq!("user".parse::<UserRole>(), Ok(UserRole::User));
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_payment_provider_spelling_matches_serde() {
        for provider in [
            PaymentProvider::Gopay,
            PaymentProvider::Stripe,
            PaymentProvider::Comgate,
            PaymentProvider::Cod,
            PaymentProvider::BankTransfer,
        ] {
            let json = serde_json::to_value(provider).unwrap();
            assert_eq!(json, provider.as_str());
            assert_eq!(provider.as_str().parse::<PaymentProvider>(), Ok(provider));
        }
        assert!("paypal".parse::<PaymentProvider>().is_err());
    }
}
