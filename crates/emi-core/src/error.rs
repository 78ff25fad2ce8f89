use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmiError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EmiError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        EmiError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Decimal arithmetic left the representable range.
    pub(crate) fn overflow(context: &str) -> Self {
        EmiError::InvalidInput {
            field: "amount".into(),
            reason: format!("{context} overflowed decimal range"),
        }
    }
}

impl From<serde_json::Error> for EmiError {
    fn from(e: serde_json::Error) -> Self {
        EmiError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for EmiError {
    fn from(e: serde_yaml::Error) -> Self {
        EmiError::SerializationError(e.to_string())
    }
}
