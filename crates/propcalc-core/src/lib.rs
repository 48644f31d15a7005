pub mod amortization;
pub mod config;
pub mod error;
pub mod metrics;
pub mod projection;
pub mod time_value;
pub mod types;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "partners")]
pub mod partners;

pub use config::PolicyConfig;
pub use error::PropCalcError;
pub use types::*;

/// Standard result type for all propcalc operations
pub type PropCalcResult<T> = Result<T, PropCalcError>;
