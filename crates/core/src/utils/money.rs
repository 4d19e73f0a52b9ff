use rust_decimal::Decimal;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Formats an amount for chat messages: `€10` for whole amounts, `€12.50` otherwise.
pub fn format_amount(currency_symbol: &str, amount: Decimal) -> String {
    if amount.fract().is_zero() {
        format!("{}{}", currency_symbol, amount.trunc())
    } else {
        let rounded = amount.round_dp(DISPLAY_DECIMAL_PRECISION);
        format!("{}{:.2}", currency_symbol, rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("€", dec!(10)), "€10");
        assert_eq!(format_amount("€", dec!(10.00)), "€10");
        assert_eq!(format_amount("€", dec!(12.5)), "€12.50");
        assert_eq!(format_amount("$", dec!(3.456)), "$3.46");
    }
}
