use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Render a number with `,` between every group of three integer digits.
pub fn format_with_commas(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Thousands-separated strings for the values a front end shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAmounts {
    pub down_payment: String,
    pub emi: String,
    pub total_down_payment: String,
    pub total_repayment: String,
}

impl DisplayAmounts {
    pub fn new(
        down_payment: Money,
        emi: Money,
        total_down_payment: Money,
        total_repayment: Money,
    ) -> Self {
        Self {
            down_payment: format_with_commas(down_payment),
            emi: format_with_commas(emi),
            total_down_payment: format_with_commas(total_down_payment),
            total_repayment: format_with_commas(total_repayment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_groups_thousands() {
        assert_eq!(format_with_commas(dec!(1_200_000)), "1,200,000");
        assert_eq!(format_with_commas(dec!(91_667)), "91,667");
        assert_eq!(format_with_commas(dec!(100_000)), "100,000");
    }

    #[test]
    fn test_short_numbers_untouched() {
        assert_eq!(format_with_commas(dec!(0)), "0");
        assert_eq!(format_with_commas(dec!(999)), "999");
    }

    #[test]
    fn test_fraction_and_sign() {
        assert_eq!(format_with_commas(dec!(12345.50)), "12,345.5");
        assert_eq!(format_with_commas(dec!(-1234567)), "-1,234,567");
    }
}
