use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed on a 0-100 scale (50.5 = 50.5%).
pub type Percent = Decimal;

/// Multiplicative factors applied to an input field (1.2 = +20%).
pub type Multiplier = Decimal;

/// Sales market of a vehicle configuration.
///
/// Equality, ordering and hashing follow the market code, so
/// `Market::Other("EU".into())` is the same market as `Market::EU`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Market {
    EU,
    CN,
    US,
    Other(String),
}

impl Market {
    pub fn as_str(&self) -> &str {
        match self {
            Market::EU => "EU",
            Market::CN => "CN",
            Market::US => "US",
            Market::Other(code) => code,
        }
    }
}

impl PartialEq for Market {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Market {}

impl PartialOrd for Market {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Market {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for Market {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<String> for Market {
    fn from(code: String) -> Self {
        match code.as_str() {
            "EU" => Market::EU,
            "CN" => Market::CN,
            "US" => Market::US,
            _ => Market::Other(code),
        }
    }
}

impl From<&str> for Market {
    fn from(code: &str) -> Self {
        Market::from(code.to_string())
    }
}

impl From<Market> for String {
    fn from(market: Market) -> Self {
        market.as_str().to_string()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_known_codes() {
        assert_eq!(Market::from("EU"), Market::EU);
        assert_eq!(Market::from("CN"), Market::CN);
        assert_eq!(Market::from("US"), Market::US);
    }

    #[test]
    fn test_market_other_code_round_trips() {
        let market = Market::from("JP");
        assert_eq!(market, Market::Other("JP".into()));
        assert_eq!(market.to_string(), "JP");
        let json = serde_json::to_string(&market).unwrap();
        assert_eq!(json, "\"JP\"");
    }

    #[test]
    fn test_market_codes_are_case_sensitive() {
        assert_eq!(Market::from("eu"), Market::Other("eu".into()));
        assert_ne!(Market::from("eu"), Market::EU);
    }

    #[test]
    fn test_market_orders_by_code() {
        let mut markets = vec![Market::US, Market::EU, Market::from("JP"), Market::CN];
        markets.sort();
        let codes: Vec<&str> = markets.iter().map(|m| m.as_str()).collect();
        assert_eq!(codes, vec!["CN", "EU", "JP", "US"]);
    }
}
