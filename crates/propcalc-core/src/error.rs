use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropCalcError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid allocation: partner shares sum to {total}%, expected 100%")]
    InvalidAllocation { total: Decimal },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (last NPV: {last_npv}, best effort: {best_effort})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_npv: Decimal,
        /// Rate (decimal fraction) the solver had reached when it gave up
        best_effort: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Policy configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropCalcError {
    fn from(e: serde_json::Error) -> Self {
        PropCalcError::SerializationError(e.to_string())
    }
}
