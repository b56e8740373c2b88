use rust_decimal::{Decimal, RoundingStrategy};

/// Round a retail amount to two decimal places, half-up.
///
/// Every customer-facing price in the catalog goes through this before it is
/// persisted, so comparisons against stored prices are exact.
pub fn retail_round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rounds_half_up() {
        let raw = Decimal::from_str("12.985").unwrap();
        assert_eq!(retail_round(raw), Decimal::from_str("12.99").unwrap());

        let raw = Decimal::from_str("12.984").unwrap();
        assert_eq!(retail_round(raw), Decimal::from_str("12.98").unwrap());
    }

    #[test]
    fn test_whole_amounts_keep_scale() {
        let raw = Decimal::from_str("13.000").unwrap();
        assert_eq!(retail_round(raw), Decimal::from_str("13.00").unwrap());
    }
}
