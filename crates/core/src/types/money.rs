//! Decimal money helpers.
//!
//! Amounts are plain [`Decimal`] values in the shop's currency (the currency
//! code lives on the shop, not on every amount). All stored money has two
//! decimal places, so every computed amount passes through [`round_money`]
//! before it is persisted or returned.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for every money column.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(12,2)` money column holds: `9999999999.99`.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Round an amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether `amount` is non-negative and fits a money column.
#[must_use]
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_MONEY
}

/// Total for one order line: `unit_price * quantity`, rounded.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// `percent`% of `amount`, rounded.
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec("2.005")), dec("2.01"));
        assert_eq!(round_money(dec("2.004")), dec("2.00"));
        assert_eq!(round_money(dec("-2.005")), dec("-2.01"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("10.00"), 2), dec("20.00"));
        assert_eq!(line_total(dec("0.333"), 3), dec("1.00"));
    }

    #[test]
    fn test_max_money_matches_column_limit() {
        assert_eq!(MAX_MONEY, dec("9999999999.99"));
    }

    #[test]
    fn test_is_storable_amount() {
        assert!(is_storable_amount(Decimal::ZERO));
        assert!(is_storable_amount(dec("9999999999.99")));
        assert!(!is_storable_amount(dec("10000000000.00")));
        assert!(!is_storable_amount(dec("-0.01")));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("25.00"), dec("10")), dec("2.50"));
        assert_eq!(percent_of(dec("19.99"), dec("15")), dec("3.00"));
    }
}
