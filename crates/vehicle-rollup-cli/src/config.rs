//! CLI configuration loaded from an optional TOML file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use vehicle_rollup_core::forecast::adapter::DEFAULT_HORIZON;
use vehicle_rollup_core::forecast::trend::DEFAULT_CONFIDENCE;
use vehicle_rollup_core::scenarios::sensitivity::{TYPICAL_MAX_MULTIPLIER, TYPICAL_MIN_MULTIPLIER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file error: {0}")]
    FileError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

/// Defaults applied when a command-line flag is not given.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Future years requested from the forecaster
    pub forecast_horizon: usize,
    /// Prediction interval width for the linear trend forecaster
    pub confidence: f64,
    pub sweep_min: Decimal,
    pub sweep_max: Decimal,
    pub sweep_step: Decimal,
    /// Prefix for money columns in table output
    pub currency_symbol: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            forecast_horizon: DEFAULT_HORIZON,
            confidence: DEFAULT_CONFIDENCE,
            sweep_min: TYPICAL_MIN_MULTIPLIER,
            sweep_max: TYPICAL_MAX_MULTIPLIER,
            sweep_step: dec!(0.25),
            currency_symbol: "$".to_string(),
        }
    }
}

impl CliConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CliConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast_horizon == 0 {
            return Err(ConfigError::InvalidValue {
                key: "forecast_horizon".into(),
                reason: "must be at least 1".into(),
            });
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "confidence".into(),
                reason: format!("must lie strictly between 0 and 1, got {}", self.confidence),
            });
        }
        if self.sweep_step <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                key: "sweep_step".into(),
                reason: "must be positive".into(),
            });
        }
        if self.sweep_min <= Decimal::ZERO || self.sweep_min > self.sweep_max {
            return Err(ConfigError::InvalidValue {
                key: "sweep_min".into(),
                reason: format!(
                    "must be positive and no greater than sweep_max ({})",
                    self.sweep_max
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.forecast_horizon, 3);
        assert_eq!(config.sweep_max, dec!(2.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = CliConfig::from_toml("log_level = \"debug\"\ncurrency_symbol = \"EUR \"\n").unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.currency_symbol, "EUR ");
        assert_eq!(config.forecast_horizon, 3);
    }

    #[test]
    fn test_decimal_sweep_values() {
        let config = CliConfig::from_toml("sweep_min = 0.25\nsweep_max = 3\nsweep_step = \"0.5\"\n").unwrap();
        assert_eq!(config.sweep_min, dec!(0.25));
        assert_eq!(config.sweep_max, dec!(3));
        assert_eq!(config.sweep_step, dec!(0.5));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CliConfig::from_toml("log_level = \"loud\""),
            Err(ConfigError::FileError(_))
        ));
        match CliConfig::from_toml("forecast_horizon = 0") {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "forecast_horizon"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
        assert!(CliConfig::from_toml("confidence = 1.5").is_err());
        assert!(CliConfig::from_toml("sweep_min = 3.0").is_err());
        assert!(CliConfig::from_toml("unknown_key = 1").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = CliConfig::load(Path::new("/nonexistent/vrollup.toml")).unwrap();
        assert_eq!(config.currency_symbol, "$");
    }
}
