use serde::{Deserialize, Serialize};

use crate::types::{Market, Money};

/// One sellable vehicle configuration (market + powertrain + year) with its
/// pricing, cost and volume inputs.
///
/// Wire keys match the source table exactly and are case-sensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    #[serde(rename = "Market")]
    pub market: Market,
    /// Powertrain identifier, e.g. "BEV 90kWh EAWD"
    #[serde(rename = "Powertrain")]
    pub powertrain: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Units sold
    #[serde(rename = "Volume")]
    pub volume: i64,
    /// Base sticker price
    #[serde(rename = "MSRP")]
    pub msrp: Money,
    /// Customer-facing option add-on price
    #[serde(rename = "OptionPrice")]
    pub option_price: Money,
    /// Manufacturer cost of options
    #[serde(rename = "OptionCost")]
    pub option_cost: Money,
    #[serde(rename = "PowertrainCost")]
    pub powertrain_cost: Money,
    /// Base manufacturing cost
    #[serde(rename = "BaseCost")]
    pub base_cost: Money,
}

impl ConfigurationRecord {
    /// Grouping label `market | powertrain`. Shared by every year of the
    /// same configuration, so it is not a unique identifier.
    pub fn configuration_key(&self) -> String {
        format!("{} | {}", self.market, self.powertrain)
    }
}

/// Anything that can be placed in a market / powertrain / year segment.
pub trait Segmented {
    fn market(&self) -> &Market;
    fn powertrain(&self) -> &str;
    fn year(&self) -> i32;
}

impl Segmented for ConfigurationRecord {
    fn market(&self) -> &Market {
        &self.market
    }

    fn powertrain(&self) -> &str {
        &self.powertrain
    }

    fn year(&self) -> i32 {
        self.year
    }
}
