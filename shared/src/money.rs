//! Money helpers built on rust_decimal
//!
//! All arithmetic is done on `Decimal`. Storage uses integer minor units
//! (hundredths) so the database never sees a binary float.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Currency precision
pub const DECIMAL_PLACES: u32 = 2;

/// Default flat tax rate (5%)
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Round to currency precision, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the value is non-negative and carries at most two decimal places
pub fn is_valid_price(value: Decimal) -> bool {
    !value.is_sign_negative() && value.normalize().scale() <= DECIMAL_PLACES
}

/// Convert to integer minor units. Returns `None` if the value has more than
/// two decimal places or does not fit in i64.
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    if value.normalize().scale() > DECIMAL_PLACES {
        return None;
    }
    (value * Decimal::ONE_HUNDRED).to_i64()
}

/// Convert integer minor units back to a two-place decimal
#[inline]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, DECIMAL_PLACES)
}

/// Monetary breakdown of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    /// subtotal = Σ line totals; tax = round(subtotal × rate);
    /// total = subtotal + tax + shipping.
    pub fn compute(
        line_totals: impl IntoIterator<Item = Decimal>,
        tax_rate: Decimal,
        shipping_cost: Decimal,
    ) -> Self {
        let subtotal = round_money(line_totals.into_iter().sum());
        let tax_amount = round_money(subtotal * tax_rate);
        let shipping_cost = round_money(shipping_cost);
        Self {
            subtotal,
            tax_amount,
            shipping_cost,
            total_amount: subtotal + tax_amount + shipping_cost,
        }
    }
}

/// unit price × quantity, rounded to currency precision
#[inline]
pub fn line_total(unit_price: Decimal, quantity: i64) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_reference_cart_totals() {
        let totals = OrderTotals::compute([line_total(dec("100.00"), 2)], DEFAULT_TAX_RATE, Decimal::ZERO);
        assert_eq!(totals.subtotal, dec("200.00"));
        assert_eq!(totals.tax_amount, dec("10.00"));
        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("210.00"));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.10 * 5% = 0.005 -> 0.01
        let totals = OrderTotals::compute([dec("0.10")], DEFAULT_TAX_RATE, Decimal::ZERO);
        assert_eq!(totals.tax_amount, dec("0.01"));
        // 12.34 * 5% = 0.617 -> 0.62
        let totals = OrderTotals::compute([dec("12.34")], DEFAULT_TAX_RATE, Decimal::ZERO);
        assert_eq!(totals.tax_amount, dec("0.62"));
        assert_eq!(totals.total_amount, dec("12.96"));
    }

    #[test]
    fn test_total_is_exact_sum() {
        let lines = [line_total(dec("19.99"), 3), line_total(dec("7.45"), 1)];
        let totals = OrderTotals::compute(lines, DEFAULT_TAX_RATE, dec("2.50"));
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount + totals.shipping_cost
        );
    }

    #[test]
    fn test_is_valid_price() {
        assert!(is_valid_price(dec("0")));
        assert!(is_valid_price(dec("100.00")));
        assert!(is_valid_price(dec("12.500")));
        assert!(!is_valid_price(dec("-0.01")));
        assert!(!is_valid_price(dec("1.234")));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec("123.45")), Some(12345));
        assert_eq!(to_minor_units(dec("1.005")), None);
        assert_eq!(from_minor_units(12345), dec("123.45"));
    }
}
