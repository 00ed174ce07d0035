//! Rounding rules applied at every monetary output boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for currency amounts.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Rounds a currency amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use bizcalc_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("10.005").unwrap()), Decimal::from_str("10.01").unwrap());
/// assert_eq!(round_money(Decimal::from_str("10.004").unwrap()), Decimal::from_str("10.00").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a quantity to whole units, half away from zero.
pub fn round_units(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_money_midpoint_goes_up() {
        assert_eq!(round_money(dec("531.245")), dec("531.25"));
        assert_eq!(round_money(dec("0.125")), dec("0.13"));
    }

    #[test]
    fn test_round_money_negative_midpoint_goes_away_from_zero() {
        assert_eq!(round_money(dec("-2.345")), dec("-2.35"));
    }

    #[test]
    fn test_round_money_keeps_exact_cents() {
        assert_eq!(round_money(dec("4083.75")), dec("4083.75"));
    }

    #[test]
    fn test_round_units() {
        assert_eq!(round_units(dec("119.5")), dec("120"));
        assert_eq!(round_units(dec("119.49")), dec("119"));
        assert_eq!(round_units(dec("0.4")), dec("0"));
    }
}
