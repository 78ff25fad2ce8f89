use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use emi_core::emi::engine::{self, clamp_percent, DownPaymentInput, EmiQuoteInput};
use emi_core::{CalculatorConfig, RateConvention};

use crate::input;

/// EMI formula variant
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConventionArg {
    /// Annual rate, tenure in years as exponent, annual installment / 12
    Annual,
    /// Standard monthly-compounding EMI
    Monthly,
}

impl From<ConventionArg> for RateConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Annual => RateConvention::AnnualRateYearlyExponent,
            ConventionArg::Monthly => RateConvention::MonthlyCompounding,
        }
    }
}

/// Arguments for an EMI quote
#[derive(Args)]
pub struct ComputeArgs {
    /// Path to JSON file with quote input
    #[arg(long)]
    pub input: Option<String>,

    /// Total cost of the asset
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Amount paid upfront
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent (clamped to 0-100; config default if omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Processing fee in percent (clamped to 0-100; config default if omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub fee: Option<Decimal>,

    /// Tenure in months (must be a configured option)
    #[arg(long)]
    pub tenure: Option<u32>,

    /// EMI formula variant (config default if omitted)
    #[arg(long)]
    pub convention: Option<ConventionArg>,
}

/// Arguments for the down payment solve
#[derive(Args)]
pub struct DownPaymentArgs {
    /// Path to JSON file with solve input
    #[arg(long)]
    pub input: Option<String>,

    /// Total cost of the asset
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Desired monthly installment
    #[arg(long)]
    pub target_emi: Option<Decimal>,

    /// Annual interest rate in percent (clamped to 0-100)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Processing fee in percent (clamped to 0-100)
    #[arg(long, allow_hyphen_values = true)]
    pub fee: Option<Decimal>,

    /// Tenure in months (must be a configured option)
    #[arg(long)]
    pub tenure: Option<u32>,

    /// EMI formula variant
    #[arg(long)]
    pub convention: Option<ConventionArg>,
}

/// Tenure must be one of the configured options, whichever way it arrived.
fn check_tenure(months: u32, config: &CalculatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.is_tenure_option(months) {
        return Err(format!(
            "Tenure {} is not one of the configured options {:?}",
            months, config.tenure_options
        )
        .into());
    }
    Ok(())
}

pub fn run_compute(
    args: ComputeArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: EmiQuoteInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(principal) = args.principal {
        EmiQuoteInput {
            principal,
            down_payment: args.down_payment,
            interest_rate: clamp_percent(args.rate.unwrap_or(config.default_interest_rate)),
            processing_fee: clamp_percent(args.fee.unwrap_or(config.default_processing_fee)),
            tenure_months: args.tenure.unwrap_or(config.default_tenure),
            convention: args.convention.map(Into::into).unwrap_or(config.convention),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--principal, --input <file.json> or stdin required for EMI quote".into());
    };
    check_tenure(quote_input.tenure_months, config)?;

    let result = engine::quote_emi(&quote_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_down_payment(
    args: DownPaymentArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let solve_input: DownPaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let (Some(principal), Some(target_emi)) = (args.principal, args.target_emi) {
        DownPaymentInput {
            principal,
            target_emi,
            interest_rate: clamp_percent(args.rate.unwrap_or(config.default_interest_rate)),
            processing_fee: clamp_percent(args.fee.unwrap_or(config.default_processing_fee)),
            tenure_months: args.tenure.unwrap_or(config.default_tenure),
            convention: args.convention.map(Into::into).unwrap_or(config.convention),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "--principal and --target-emi, --input <file.json> or stdin required for down payment solve"
                .into(),
        );
    };
    check_tenure(solve_input.tenure_months, config)?;

    let result = engine::solve_down_payment(&solve_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tenures(config: &CalculatorConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let rows: Vec<Value> = config
        .tenure_options
        .iter()
        .map(|months| {
            json!({
                "months": months,
                "years": Decimal::from(*months) / Decimal::from(12u32),
                "default": *months == config.default_tenure,
            })
        })
        .collect();
    Ok(json!({ "results": rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn compute_args(principal: Decimal) -> ComputeArgs {
        ComputeArgs {
            input: None,
            principal: Some(principal),
            down_payment: dec!(200_000),
            rate: None,
            fee: None,
            tenure: None,
            convention: None,
        }
    }

    #[test]
    fn test_compute_uses_config_defaults() {
        let value = run_compute(compute_args(dec!(1_200_000)), &CalculatorConfig::default()).unwrap();
        assert_eq!(value["result"]["emi"], "91667");
        assert_eq!(value["result"]["total_down_payment"], "210000");
    }

    #[test]
    fn test_compute_clamps_rate_flag() {
        let args = ComputeArgs {
            rate: Some(dec!(250)),
            down_payment: Decimal::ZERO,
            ..compute_args(dec!(1_200_000))
        };
        let value = run_compute(args, &CalculatorConfig::default()).unwrap();
        // 100%: 1.2M * 1 * 2 / 1 / 12
        assert_eq!(value["result"]["emi"], "200000");
    }

    #[test]
    fn test_compute_rejects_unknown_tenure() {
        let args = ComputeArgs {
            tenure: Some(18),
            ..compute_args(dec!(1_200_000))
        };
        assert!(run_compute(args, &CalculatorConfig::default()).is_err());
    }

    #[test]
    fn test_compute_rejects_unknown_tenure_from_file() {
        let path = std::env::temp_dir().join("emi_cli_quote_tenure_18.json");
        std::fs::write(
            &path,
            r#"{"principal": "1200000", "interest_rate": 10, "tenure_months": 18}"#,
        )
        .unwrap();
        let args = ComputeArgs {
            input: Some(path.to_string_lossy().into_owned()),
            principal: None,
            ..compute_args(Decimal::ZERO)
        };
        let err = run_compute(args, &CalculatorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Tenure 18"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_down_payment_rejects_unknown_tenure_from_file() {
        let path = std::env::temp_dir().join("emi_cli_solve_tenure_18.json");
        std::fs::write(
            &path,
            r#"{"principal": "1200000", "target_emi": "50000", "interest_rate": 10, "tenure_months": 18}"#,
        )
        .unwrap();
        let args = DownPaymentArgs {
            input: Some(path.to_string_lossy().into_owned()),
            principal: None,
            target_emi: None,
            rate: None,
            fee: None,
            tenure: None,
            convention: None,
        };
        assert!(run_down_payment(args, &CalculatorConfig::default()).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_down_payment_from_flags() {
        let args = DownPaymentArgs {
            input: None,
            principal: Some(dec!(1_200_000)),
            target_emi: Some(dec!(55_000)),
            rate: Some(dec!(10)),
            fee: None,
            tenure: Some(12),
            convention: Some(ConventionArg::Annual),
        };
        let value = run_down_payment(args, &CalculatorConfig::default()).unwrap();
        assert_eq!(value["result"]["down_payment"], "600000");
    }

    #[test]
    fn test_tenures_listing() {
        let value = run_tenures(&CalculatorConfig::default()).unwrap();
        let rows = value["results"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["months"], 12);
        assert_eq!(rows[0]["default"], true);
        assert_eq!(rows[4]["months"], 60);
    }
}
