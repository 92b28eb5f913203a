use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "monthly budget {budget:.2} does not cover minimum payments {minimum_due:.2} (short by {shortfall:.2})"
    )]
    InsufficientPayment {
        budget: f64,
        minimum_due: f64,
        shortfall: f64,
    },

    #[error("unknown rewards program `{program}`")]
    UnknownProgram { program: String },
}

impl EngineError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
