use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RollupError;
use crate::rollup::record::{ConfigurationRecord, Segmented};
use crate::types::{Market, Money, Percent};
use crate::RollupResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financial rollup of a single configuration record.
///
/// Only ever produced by [`compute_metrics`]; there is no way to set a
/// derived field independently of its source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DerivedMetrics {
    /// (MSRP + OptionPrice) * Volume
    pub revenue: Money,
    /// BaseCost + OptionCost + PowertrainCost
    pub unit_cost: Money,
    /// UnitCost * Volume
    pub total_cost: Money,
    /// Revenue - TotalCost
    pub profit: Money,
    /// Profit / Revenue * 100; `None` when revenue is zero
    pub profit_margin: Option<Percent>,
    /// `market | powertrain`
    pub configuration_key: String,
}

/// A configuration record with its derived metrics attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledUpRecord {
    #[serde(flatten)]
    pub record: ConfigurationRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

impl Segmented for RolledUpRecord {
    fn market(&self) -> &Market {
        &self.record.market
    }

    fn powertrain(&self) -> &str {
        &self.record.powertrain
    }

    fn year(&self) -> i32 {
        self.record.year
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn require_non_negative(field: &str, value: Decimal) -> RollupResult<()> {
    if value < Decimal::ZERO {
        return Err(RollupError::InvalidInput {
            field: field.to_string(),
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}

/// Check that volume and every monetary field are non-negative.
pub fn validate_record(record: &ConfigurationRecord) -> RollupResult<()> {
    if record.volume < 0 {
        return Err(RollupError::InvalidInput {
            field: "Volume".into(),
            reason: format!("must be non-negative, got {}", record.volume),
        });
    }
    require_non_negative("MSRP", record.msrp)?;
    require_non_negative("OptionPrice", record.option_price)?;
    require_non_negative("OptionCost", record.option_cost)?;
    require_non_negative("PowertrainCost", record.powertrain_cost)?;
    require_non_negative("BaseCost", record.base_cost)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Rollup
// ---------------------------------------------------------------------------

/// Derive revenue, cost, profit and margin for one record.
///
/// Arithmetic is exact decimal; nothing is rounded here.
pub fn compute_metrics(record: &ConfigurationRecord) -> RollupResult<DerivedMetrics> {
    validate_record(record)?;

    let volume = Decimal::from(record.volume);
    let revenue = record
        .msrp
        .checked_add(record.option_price)
        .and_then(|price| price.checked_mul(volume))
        .ok_or_else(|| RollupError::overflow("Revenue"))?;
    let unit_cost = record
        .base_cost
        .checked_add(record.option_cost)
        .and_then(|cost| cost.checked_add(record.powertrain_cost))
        .ok_or_else(|| RollupError::overflow("UnitCost"))?;
    let total_cost = unit_cost
        .checked_mul(volume)
        .ok_or_else(|| RollupError::overflow("TotalCost"))?;
    // Both operands are non-negative, so the difference always fits
    let profit = revenue - total_cost;

    let profit_margin = if revenue.is_zero() {
        None
    } else {
        Some(
            profit
                .checked_div(revenue)
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .ok_or_else(|| RollupError::overflow("ProfitMargin"))?,
        )
    };

    Ok(DerivedMetrics {
        revenue,
        unit_cost,
        total_cost,
        profit,
        profit_margin,
        configuration_key: record.configuration_key(),
    })
}

/// Roll up a whole record set, preserving input order.
///
/// The first invalid record fails the batch.
pub fn roll_up(records: &[ConfigurationRecord]) -> RollupResult<Vec<RolledUpRecord>> {
    records
        .iter()
        .map(|record| {
            Ok(RolledUpRecord {
                record: record.clone(),
                metrics: compute_metrics(record)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reference_record() -> ConfigurationRecord {
        ConfigurationRecord {
            market: Market::EU,
            powertrain: "BEV 90kWh EAWD".into(),
            year: 2024,
            volume: 10_000,
            msrp: dec!(500000),
            option_price: dec!(25000),
            option_cost: dec!(20000),
            powertrain_cost: dec!(40000),
            base_cost: dec!(200000),
        }
    }

    #[test]
    fn test_reference_record_rollup() {
        let m = compute_metrics(&reference_record()).unwrap();
        assert_eq!(m.revenue, dec!(5250000000));
        assert_eq!(m.unit_cost, dec!(260000));
        assert_eq!(m.total_cost, dec!(2600000000));
        assert_eq!(m.profit, dec!(2650000000));
        let margin = m.profit_margin.unwrap();
        assert!(
            (margin - dec!(50.476190476)).abs() < dec!(0.000001),
            "Expected margin ~50.48%, got {margin}"
        );
        assert_eq!(m.configuration_key, "EU | BEV 90kWh EAWD");
    }

    #[test]
    fn test_zero_revenue_margin_is_undefined() {
        let mut record = reference_record();
        record.msrp = Decimal::ZERO;
        record.option_price = Decimal::ZERO;
        record.volume = 100;
        let m = compute_metrics(&record).unwrap();
        assert_eq!(m.revenue, Decimal::ZERO);
        assert_eq!(m.profit, dec!(-26000000));
        assert!(m.profit_margin.is_none());
    }

    #[test]
    fn test_zero_volume_margin_is_undefined() {
        let mut record = reference_record();
        record.volume = 0;
        let m = compute_metrics(&record).unwrap();
        assert_eq!(m.revenue, Decimal::ZERO);
        assert_eq!(m.total_cost, Decimal::ZERO);
        assert!(m.profit_margin.is_none());
    }

    #[test]
    fn test_loss_making_record_has_negative_margin() {
        let mut record = reference_record();
        record.msrp = dec!(200000);
        record.option_price = Decimal::ZERO;
        let m = compute_metrics(&record).unwrap();
        assert_eq!(m.profit, dec!(-600000000));
        assert_eq!(m.profit_margin, Some(dec!(-30)));
    }

    #[test]
    fn test_negative_volume_rejected() {
        let mut record = reference_record();
        record.volume = -1;
        match compute_metrics(&record) {
            Err(RollupError::InvalidInput { field, .. }) => assert_eq!(field, "Volume"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut record = reference_record();
        record.option_cost = dec!(-0.01);
        match compute_metrics(&record) {
            Err(RollupError::InvalidInput { field, .. }) => assert_eq!(field, "OptionCost"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_revenue_is_an_error() {
        let mut record = reference_record();
        record.volume = i64::MAX;
        record.msrp = dec!(100000000000);
        match compute_metrics(&record) {
            Err(RollupError::InvalidInput { field, reason }) => {
                assert_eq!(field, "Revenue");
                assert_eq!(reason, "overflow");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_margin_is_an_error() {
        let mut record = reference_record();
        record.volume = 1;
        record.msrp = dec!(0.0000000000000000000000000001);
        record.option_price = Decimal::ZERO;
        record.base_cost = dec!(10000000000000000000000000000);
        assert!(matches!(
            compute_metrics(&record),
            Err(RollupError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_roll_up_preserves_order() {
        let mut second = reference_record();
        second.year = 2025;
        second.market = Market::CN;
        let rolled = roll_up(&[reference_record(), second.clone()]).unwrap();
        assert_eq!(rolled.len(), 2);
        assert_eq!(rolled[0].record, reference_record());
        assert_eq!(rolled[1].record, second);
        assert_eq!(rolled[1].metrics.configuration_key, "CN | BEV 90kWh EAWD");
    }

    #[test]
    fn test_roll_up_fails_on_any_invalid_record() {
        let mut bad = reference_record();
        bad.msrp = dec!(-1);
        assert!(roll_up(&[reference_record(), bad]).is_err());
    }

    #[test]
    fn test_rolled_up_record_flattens_on_the_wire() {
        let rolled = roll_up(&[reference_record()]).unwrap();
        let value = serde_json::to_value(&rolled[0]).unwrap();
        assert_eq!(value["Market"], "EU");
        assert!(value.get("Revenue").is_some());
        assert!(value.get("ProfitMargin").is_some());
        assert_eq!(value["ConfigurationKey"], "EU | BEV 90kWh EAWD");
    }
}
