//! Calculator configuration: input defaults, the tenure option set and the
//! EMI formula convention. Loadable from JSON or YAML.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EmiError;
use crate::types::{Months, Percent};
use crate::EmiResult;

/// Tenure choices offered by the calculator, in months.
pub const TENURE_OPTIONS: [Months; 5] = [12, 24, 36, 48, 60];

pub const DEFAULT_INTEREST_RATE: Percent = dec!(10);
pub const DEFAULT_PROCESSING_FEE: Percent = dec!(1);
pub const DEFAULT_TENURE: Months = 12;

/// Upper bound for rate and fee inputs, in percent.
pub const MAX_PERCENT: Percent = dec!(100);

/// Which EMI formula variant to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateConvention {
    /// Annual rate as the periodic rate, tenure in years as the exponent,
    /// annual installment divided by 12.
    #[default]
    AnnualRateYearlyExponent,
    /// Standard monthly-compounding EMI: rate / 12 per month over tenure months.
    MonthlyCompounding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub default_interest_rate: Percent,
    pub default_processing_fee: Percent,
    pub default_tenure: Months,
    pub tenure_options: Vec<Months>,
    pub convention: RateConvention,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_interest_rate: DEFAULT_INTEREST_RATE,
            default_processing_fee: DEFAULT_PROCESSING_FEE,
            default_tenure: DEFAULT_TENURE,
            tenure_options: TENURE_OPTIONS.to_vec(),
            convention: RateConvention::default(),
        }
    }
}

impl CalculatorConfig {
    /// Load a configuration file. `.yaml`/`.yml` are parsed as YAML,
    /// everything else as JSON.
    pub fn from_path(path: &Path) -> EmiResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EmiError::Config(format!("Failed to read '{}': {}", path.display(), e)))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: CalculatorConfig = if is_yaml {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        config.validate()?;
        log::debug!("loaded calculator config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> EmiResult<()> {
        if self.tenure_options.is_empty() {
            return Err(EmiError::Config("tenure_options must not be empty".into()));
        }
        if self.tenure_options.contains(&0) {
            return Err(EmiError::Config("tenure_options must be positive month counts".into()));
        }
        if !self.tenure_options.contains(&self.default_tenure) {
            return Err(EmiError::Config(format!(
                "default_tenure {} is not one of the tenure options {:?}",
                self.default_tenure, self.tenure_options
            )));
        }
        for (field, value) in [
            ("default_interest_rate", self.default_interest_rate),
            ("default_processing_fee", self.default_processing_fee),
        ] {
            if value < Decimal::ZERO || value > MAX_PERCENT {
                return Err(EmiError::Config(format!(
                    "{field} must be within [0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn is_tenure_option(&self, months: Months) -> bool {
        self.tenure_options.contains(&months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CalculatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tenure_options, vec![12, 24, 36, 48, 60]);
        assert_eq!(config.convention, RateConvention::AnnualRateYearlyExponent);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: CalculatorConfig =
            serde_json::from_str(r#"{"default_interest_rate": "8.5"}"#).unwrap();
        assert_eq!(config.default_interest_rate, dec!(8.5));
        assert_eq!(config.default_tenure, DEFAULT_TENURE);
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "tenure_options: [6, 12]\ndefault_tenure: 6\nconvention: monthly_compounding\n";
        let config: CalculatorConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.convention, RateConvention::MonthlyCompounding);
        assert!(config.is_tenure_option(6));
        assert!(!config.is_tenure_option(24));
    }

    #[test]
    fn test_default_tenure_must_be_an_option() {
        let config = CalculatorConfig {
            default_tenure: 18,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EmiError::Config(_))));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let config = CalculatorConfig {
            default_interest_rate: dec!(120),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = CalculatorConfig::from_path(Path::new("/nonexistent/emi.yaml")).unwrap_err();
        assert!(matches!(err, EmiError::Config(_)));
    }
}
