use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollupError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Forecast failure: {0}")]
    ForecastFailure(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RollupError {
    /// Arithmetic on `field` left the representable decimal range.
    pub fn overflow(field: &str) -> Self {
        RollupError::InvalidInput {
            field: field.to_string(),
            reason: "overflow".into(),
        }
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(e: serde_json::Error) -> Self {
        RollupError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "ingest")]
impl From<csv::Error> for RollupError {
    fn from(e: csv::Error) -> Self {
        RollupError::SerializationError(e.to_string())
    }
}
