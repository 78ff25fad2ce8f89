//! EMI engine: monthly installment from (principal, down payment, rate, tenure)
//! and the inverse solve for down payment given a target installment.
//!
//! Both directions are pure. A zero principal means "no loan configured": the
//! primitives return `Ok(None)` instead of computing on it. All math in
//! `rust_decimal::Decimal`, results rounded to whole currency units.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{RateConvention, MAX_PERCENT};
use crate::emi::format::DisplayAmounts;
use crate::error::EmiError;
use crate::time_value::{compound_factor, pmt};
use crate::types::{with_metadata, ComputationOutput, Money, Months, Percent, Rate};
use crate::EmiResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Inputs for a full EMI quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiQuoteInput {
    /// Total cost of the asset.
    pub principal: Money,
    /// Amount paid upfront.
    #[serde(default)]
    pub down_payment: Money,
    /// Annual interest rate in percent (10 = 10%).
    pub interest_rate: Percent,
    /// Processing fee in percent of the financed amount.
    #[serde(default)]
    pub processing_fee: Percent,
    pub tenure_months: Months,
    #[serde(default)]
    pub convention: RateConvention,
}

/// Inputs for solving the down payment that yields a target EMI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentInput {
    pub principal: Money,
    pub target_emi: Money,
    pub interest_rate: Percent,
    #[serde(default)]
    pub processing_fee: Percent,
    pub tenure_months: Months,
    #[serde(default)]
    pub convention: RateConvention,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Bounds of the EMI control: full down payment to zero down payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiRange {
    pub min_emi: Money,
    pub max_emi: Money,
}

impl EmiRange {
    pub fn clamp(&self, emi: Money) -> Money {
        emi.max(self.min_emi).min(self.max_emi)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiQuote {
    pub loan_amount: Money,
    pub down_payment: Money,
    pub emi: Money,
    pub min_emi: Money,
    pub max_emi: Money,
    /// Down payment plus the processing fee on the financed amount.
    pub total_down_payment: Money,
    /// EMI times tenure.
    pub total_repayment: Money,
    pub display: DisplayAmounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentSolution {
    pub down_payment: Money,
    pub down_payment_pct: Percent,
    pub target_emi: Money,
    /// EMI recomputed from the solved down payment.
    pub implied_emi: Money,
    pub min_emi: Money,
    pub max_emi: Money,
    pub total_down_payment: Money,
    pub total_repayment: Money,
    pub display: DisplayAmounts,
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Round to whole currency units, half away from zero.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp a percentage input into [0, 100].
pub fn clamp_percent(value: Percent) -> Percent {
    let clamped = value.max(Decimal::ZERO).min(MAX_PERCENT);
    if clamped != value {
        log::debug!("clamped percentage {value} to {clamped}");
    }
    clamped
}

/// Monthly installment under the default convention.
///
/// Returns `Ok(None)` when principal is zero.
pub fn compute_emi(
    principal: Money,
    down_payment: Money,
    annual_rate_pct: Percent,
    tenure_months: Months,
) -> EmiResult<Option<Money>> {
    compute_emi_with(
        RateConvention::default(),
        principal,
        down_payment,
        annual_rate_pct,
        tenure_months,
    )
}

/// Monthly installment under an explicit rate convention.
pub fn compute_emi_with(
    convention: RateConvention,
    principal: Money,
    down_payment: Money,
    annual_rate_pct: Percent,
    tenure_months: Months,
) -> EmiResult<Option<Money>> {
    validate_terms(principal, annual_rate_pct, tenure_months)?;
    if principal.is_zero() {
        return Ok(None);
    }
    if down_payment < Decimal::ZERO {
        return Err(EmiError::invalid("down_payment", "Down payment cannot be negative"));
    }
    if down_payment > principal {
        return Err(EmiError::invalid(
            "down_payment",
            format!("Down payment {down_payment} exceeds principal {principal}"),
        ));
    }

    let loan_amount = principal - down_payment;
    let rate = annual_rate_pct / HUNDRED;

    let monthly = if rate.is_zero() {
        straight_line(loan_amount, tenure_months)
    } else {
        match convention {
            RateConvention::AnnualRateYearlyExponent => {
                annual_installment(loan_amount, rate, tenure_months)? / MONTHS_PER_YEAR
            }
            RateConvention::MonthlyCompounding => {
                -pmt(rate / MONTHS_PER_YEAR, tenure_months, loan_amount, Decimal::ZERO)?
            }
        }
    };

    Ok(Some(round_whole(monthly)))
}

/// Down payment that produces `target_emi` under the default convention.
///
/// Returns `Ok(None)` when principal is zero or the zero-down-payment EMI is zero.
pub fn compute_down_payment(
    principal: Money,
    target_emi: Money,
    annual_rate_pct: Percent,
    tenure_months: Months,
) -> EmiResult<Option<Money>> {
    compute_down_payment_with(
        RateConvention::default(),
        principal,
        target_emi,
        annual_rate_pct,
        tenure_months,
    )
}

pub fn compute_down_payment_with(
    convention: RateConvention,
    principal: Money,
    target_emi: Money,
    annual_rate_pct: Percent,
    tenure_months: Months,
) -> EmiResult<Option<Money>> {
    if target_emi < Decimal::ZERO {
        return Err(EmiError::invalid("target_emi", "Target EMI cannot be negative"));
    }
    let full_emi = match compute_emi_with(
        convention,
        principal,
        Decimal::ZERO,
        annual_rate_pct,
        tenure_months,
    )? {
        Some(emi) if !emi.is_zero() => emi,
        _ => return Ok(None),
    };

    let down_payment_pct = target_emi
        .checked_div(full_emi)
        .and_then(|share| share.checked_mul(HUNDRED))
        .and_then(|emi_pct| HUNDRED.checked_sub(emi_pct))
        .ok_or_else(|| EmiError::overflow("down payment share"))?;
    let down_payment = principal
        .checked_mul(down_payment_pct / HUNDRED)
        .map(round_whole)
        .ok_or_else(|| EmiError::overflow("down payment"))?;

    // Targets outside the achievable range land outside [0, principal].
    let clamped = down_payment.max(Decimal::ZERO).min(principal);
    if clamped != down_payment {
        log::debug!("target EMI {target_emi} outside range; down payment clamped to {clamped}");
    }
    Ok(Some(clamped))
}

/// EMI bounds for the given terms, or `None` when principal is zero.
pub fn emi_range(
    convention: RateConvention,
    principal: Money,
    annual_rate_pct: Percent,
    tenure_months: Months,
) -> EmiResult<Option<EmiRange>> {
    let min = compute_emi_with(convention, principal, principal, annual_rate_pct, tenure_months)?;
    let max = compute_emi_with(
        convention,
        principal,
        Decimal::ZERO,
        annual_rate_pct,
        tenure_months,
    )?;
    Ok(min.zip(max).map(|(min_emi, max_emi)| EmiRange { min_emi, max_emi }))
}

/// Down payment plus processing fee charged on the remaining loan balance.
pub fn total_down_payment(
    principal: Money,
    down_payment: Money,
    fee_pct: Percent,
) -> EmiResult<Money> {
    (principal - down_payment)
        .checked_mul(fee_pct / HUNDRED)
        .and_then(|fee| fee.checked_add(down_payment))
        .map(round_whole)
        .ok_or_else(|| EmiError::overflow("total down payment"))
}

/// Total paid over the tenure.
pub fn total_repayment(emi: Money, tenure_months: Months) -> EmiResult<Money> {
    emi.checked_mul(Decimal::from(tenure_months))
        .ok_or_else(|| EmiError::overflow("total repayment"))
}

// ---------------------------------------------------------------------------
// Enveloped operations
// ---------------------------------------------------------------------------

/// Full EMI quote: installment, slider bounds and totals.
pub fn quote_emi(input: &EmiQuoteInput) -> EmiResult<ComputationOutput<EmiQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let rate = clamp_with_warning("Interest rate", input.interest_rate, &mut warnings);
    let fee = clamp_with_warning("Processing fee", input.processing_fee, &mut warnings);
    if rate.is_zero() {
        warnings.push(ZERO_RATE_WARNING.into());
    }

    let emi = compute_emi_with(
        input.convention,
        input.principal,
        input.down_payment,
        rate,
        input.tenure_months,
    )?;
    let range = emi_range(input.convention, input.principal, rate, input.tenure_months)?;

    let quote = match (emi, range) {
        (Some(emi), Some(range)) => {
            let total_dp = total_down_payment(input.principal, input.down_payment, fee)?;
            let total_paid = total_repayment(emi, input.tenure_months)?;
            EmiQuote {
                loan_amount: input.principal - input.down_payment,
                down_payment: input.down_payment,
                emi,
                min_emi: range.min_emi,
                max_emi: range.max_emi,
                total_down_payment: total_dp,
                total_repayment: total_paid,
                display: DisplayAmounts::new(input.down_payment, emi, total_dp, total_paid),
            }
        }
        _ => {
            warnings.push(UNSET_PRINCIPAL_WARNING.into());
            uninitialized_quote()
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(input.convention),
        input,
        warnings,
        elapsed,
        quote,
    ))
}

/// Solve the down payment for a target EMI, with totals at the solution.
pub fn solve_down_payment(
    input: &DownPaymentInput,
) -> EmiResult<ComputationOutput<DownPaymentSolution>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal.is_zero() {
        return Err(EmiError::invalid(
            "principal",
            "Principal must be set to solve for a down payment",
        ));
    }

    let rate = clamp_with_warning("Interest rate", input.interest_rate, &mut warnings);
    let fee = clamp_with_warning("Processing fee", input.processing_fee, &mut warnings);
    if rate.is_zero() {
        warnings.push(ZERO_RATE_WARNING.into());
    }

    let range = emi_range(input.convention, input.principal, rate, input.tenure_months)?
    .ok_or_else(|| EmiError::invalid("principal", "Principal must be greater than zero"))?;

    if input.target_emi < range.min_emi || input.target_emi > range.max_emi {
        warnings.push(format!(
            "Target EMI {} outside achievable range [{}, {}]; down payment clamped",
            input.target_emi, range.min_emi, range.max_emi
        ));
    }

    let down_payment = compute_down_payment_with(
        input.convention,
        input.principal,
        input.target_emi,
        rate,
        input.tenure_months,
    )?
    .ok_or_else(|| EmiError::DivisionByZero {
        context: "down payment solve: zero-down-payment EMI is zero".into(),
    })?;

    let implied_emi = compute_emi_with(
        input.convention,
        input.principal,
        down_payment,
        rate,
        input.tenure_months,
    )?
    .unwrap_or(Decimal::ZERO);

    let total_dp = total_down_payment(input.principal, down_payment, fee)?;
    let total_paid = total_repayment(implied_emi, input.tenure_months)?;

    let solution = DownPaymentSolution {
        down_payment,
        down_payment_pct: (down_payment / input.principal * HUNDRED).round_dp(2),
        target_emi: input.target_emi,
        implied_emi,
        min_emi: range.min_emi,
        max_emi: range.max_emi,
        total_down_payment: total_dp,
        total_repayment: total_paid,
        display: DisplayAmounts::new(down_payment, implied_emi, total_dp, total_paid),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Down payment solve (inverse EMI, linear in loan amount)",
        input,
        warnings,
        elapsed,
        solution,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ZERO_RATE_WARNING: &str = "Zero interest rate: straight-line installment (loan / tenure)";
const UNSET_PRINCIPAL_WARNING: &str = "Principal not set; down payment and EMI forced to 0";

fn clamp_with_warning(label: &str, value: Percent, warnings: &mut Vec<String>) -> Percent {
    let clamped = clamp_percent(value);
    if clamped != value {
        warnings.push(format!("{label} {value} clamped to {clamped}"));
    }
    clamped
}

fn methodology(convention: RateConvention) -> &'static str {
    match convention {
        RateConvention::AnnualRateYearlyExponent => {
            "EMI: annual rate over tenure in years, annual installment / 12"
        }
        RateConvention::MonthlyCompounding => "EMI: monthly-compounding level payment",
    }
}

fn validate_terms(principal: Money, annual_rate_pct: Percent, tenure_months: Months) -> EmiResult<()> {
    if principal < Decimal::ZERO {
        return Err(EmiError::invalid("principal", "Principal cannot be negative"));
    }
    if annual_rate_pct < Decimal::ZERO || annual_rate_pct > MAX_PERCENT {
        return Err(EmiError::invalid(
            "interest_rate",
            format!("Interest rate must be within [0, 100], got {annual_rate_pct}"),
        ));
    }
    if tenure_months == 0 {
        return Err(EmiError::invalid("tenure_months", "Tenure must be at least one month"));
    }
    Ok(())
}

fn straight_line(loan_amount: Money, tenure_months: Months) -> Money {
    loan_amount / Decimal::from(tenure_months)
}

/// L * r * (1+r)^n / ((1+r)^n - 1) with n = tenure in years.
fn annual_installment(loan_amount: Money, rate: Rate, tenure_months: Months) -> EmiResult<Money> {
    let factor = if tenure_months % 12 == 0 {
        compound_factor(rate, tenure_months / 12)?
    } else {
        let years = Decimal::from(tenure_months) / MONTHS_PER_YEAR;
        (Decimal::ONE + rate)
            .checked_powd(years)
            .ok_or_else(|| EmiError::overflow("compound factor"))?
    };

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(EmiError::DivisionByZero {
            context: "EMI compound factor".into(),
        });
    }
    loan_amount
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| EmiError::overflow("annual installment"))
}

fn uninitialized_quote() -> EmiQuote {
    EmiQuote {
        loan_amount: Decimal::ZERO,
        down_payment: Decimal::ZERO,
        emi: Decimal::ZERO,
        min_emi: Decimal::ZERO,
        max_emi: Decimal::ZERO,
        total_down_payment: Decimal::ZERO,
        total_repayment: Decimal::ZERO,
        display: DisplayAmounts::new(
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
