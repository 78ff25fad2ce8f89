use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::EmiError;
use crate::types::{Money, Rate};
use crate::EmiResult;

/// Growth factor (1 + rate)^nper
pub fn compound_factor(rate: Rate, nper: u32) -> EmiResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(nper as i64)
        .ok_or_else(|| EmiError::overflow("compound factor"))
}

/// Payment (PMT) for a level-pay annuity, Excel sign convention.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> EmiResult<Money> {
    if nper == 0 {
        return Err(EmiError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        let total = present_value
            .checked_add(future_value)
            .ok_or_else(|| EmiError::overflow("PMT principal"))?;
        return Ok(-total / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| EmiError::overflow("PMT annuity factor"))?;

    if annuity_factor.is_zero() {
        return Err(EmiError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let payment = present_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(future_value))
        .and_then(|v| v.checked_div(annuity_factor))
        .ok_or_else(|| EmiError::overflow("PMT payment"))?;
    Ok(-payment)
}
