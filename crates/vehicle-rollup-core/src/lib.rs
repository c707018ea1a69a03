pub mod error;
pub mod types;

#[cfg(feature = "rollup")]
pub mod rollup;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "ingest")]
pub mod ingest;

#[cfg(feature = "business_model")]
pub mod business_model;

pub use error::RollupError;
pub use types::*;

/// Standard result type for all rollup operations
pub type RollupResult<T> = Result<T, RollupError>;
