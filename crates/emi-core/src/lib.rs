pub mod config;
pub mod emi;
pub mod error;
pub mod time_value;
pub mod types;

pub use config::{CalculatorConfig, RateConvention};
pub use error::EmiError;
pub use types::*;

/// Standard result type for all EMI operations
pub type EmiResult<T> = Result<T, EmiError>;
