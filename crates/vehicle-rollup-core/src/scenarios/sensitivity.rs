use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::RollupError;
use crate::rollup::aggregate::{aggregate, summarize, AggregateRow, Dimension, RollupTotals};
use crate::rollup::metrics::{roll_up, RolledUpRecord};
use crate::rollup::record::ConfigurationRecord;
use crate::types::*;
use crate::RollupResult;

/// Lower edge of the multiplier range offered by interactive callers.
pub const TYPICAL_MIN_MULTIPLIER: Decimal = dec!(0.5);
/// Upper edge of the multiplier range offered by interactive callers.
pub const TYPICAL_MAX_MULTIPLIER: Decimal = dec!(2.0);
/// Largest multiplier grid a sweep will evaluate.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Input field a sensitivity run perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityField {
    #[serde(alias = "optionCost", alias = "OptionCost")]
    OptionCost,
    #[serde(alias = "Volume")]
    Volume,
}

impl FromStr for SensitivityField {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(&['-', '_'][..], "").as_str() {
            "optioncost" => Ok(SensitivityField::OptionCost),
            "volume" => Ok(SensitivityField::Volume),
            other => Err(RollupError::InvalidInput {
                field: "field".into(),
                reason: format!("'{other}' cannot be perturbed, expected option_cost or volume"),
            }),
        }
    }
}

impl fmt::Display for SensitivityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityField::OptionCost => f.write_str("option_cost"),
            SensitivityField::Volume => f.write_str("volume"),
        }
    }
}

/// What-if request: multiply `field` on every record by `multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRequest {
    pub field: SensitivityField,
    pub multiplier: Multiplier,
}

/// Perturbed records rolled up, with their totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub request: SensitivityRequest,
    pub records: Vec<RolledUpRecord>,
    pub totals: RollupTotals,
}

/// Simulation compared against the unperturbed baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub request: SensitivityRequest,
    pub baseline: RollupTotals,
    pub simulated: RollupTotals,
    /// simulated - baseline revenue
    pub revenue_change: Money,
    /// simulated - baseline profit
    pub profit_change: Money,
    /// profit_change / |baseline profit| * 100; `None` when baseline profit is zero
    pub profit_change_pct: Option<Percent>,
    /// Simulated rows grouped by the requested dimensions
    pub groups: Vec<AggregateRow>,
    pub records: Vec<RolledUpRecord>,
}

/// Multiplier grid for a sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivitySweep {
    pub field: SensitivityField,
    pub min: Multiplier,
    pub max: Multiplier,
    pub step: Multiplier,
}

/// Totals at one grid multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub multiplier: Multiplier,
    pub totals: RollupTotals,
    pub profit_change: Money,
}

/// Profit curve across a multiplier grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub field: SensitivityField,
    pub baseline: RollupTotals,
    pub points: Vec<SweepPoint>,
}

fn validate_multiplier(multiplier: Multiplier) -> RollupResult<()> {
    if multiplier <= Decimal::ZERO {
        return Err(RollupError::InvalidInput {
            field: "multiplier".into(),
            reason: format!("must be positive, got {multiplier}"),
        });
    }
    Ok(())
}

fn scale_volume(volume: i64, multiplier: Multiplier) -> RollupResult<i64> {
    Decimal::from(volume)
        .checked_mul(multiplier)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| RollupError::overflow("Volume"))
}

fn scale_option_cost(option_cost: Money, multiplier: Multiplier) -> RollupResult<Money> {
    option_cost
        .checked_mul(multiplier)
        .ok_or_else(|| RollupError::overflow("OptionCost"))
}

fn change(simulated: Money, baseline: Money, field: &str) -> RollupResult<Money> {
    simulated
        .checked_sub(baseline)
        .ok_or_else(|| RollupError::overflow(field))
}

/// Build a new record set with the requested field scaled.
///
/// Volume is rounded to the nearest whole unit (halves away from zero).
/// The input records are untouched.
pub fn perturb(
    records: &[ConfigurationRecord],
    request: &SensitivityRequest,
) -> RollupResult<Vec<ConfigurationRecord>> {
    validate_multiplier(request.multiplier)?;
    records
        .iter()
        .map(|record| {
            let mut perturbed = record.clone();
            match request.field {
                SensitivityField::OptionCost => {
                    perturbed.option_cost =
                        scale_option_cost(record.option_cost, request.multiplier)?
                }
                SensitivityField::Volume => {
                    perturbed.volume = scale_volume(record.volume, request.multiplier)?
                }
            }
            Ok(perturbed)
        })
        .collect()
}

/// Perturb, roll up and total a record set.
pub fn simulate(
    records: &[ConfigurationRecord],
    request: &SensitivityRequest,
) -> RollupResult<SimulationResult> {
    let perturbed = perturb(records, request)?;
    let rolled = roll_up(&perturbed)?;
    let totals = summarize(&rolled)?;
    Ok(SimulationResult {
        request: request.clone(),
        records: rolled,
        totals,
    })
}

fn profit_change_pct(change: Money, baseline_profit: Money) -> RollupResult<Option<Percent>> {
    if baseline_profit.is_zero() {
        return Ok(None);
    }
    change
        .checked_div(baseline_profit.abs())
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(Some)
        .ok_or_else(|| RollupError::overflow("profit_change_pct"))
}

/// Run a what-if simulation and compare it with the unperturbed baseline.
pub fn run_sensitivity(
    records: &[ConfigurationRecord],
    request: &SensitivityRequest,
    group_by: &[Dimension],
) -> RollupResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let baseline = summarize(&roll_up(records)?)?;
    let simulation = simulate(records, request)?;

    if request.multiplier < TYPICAL_MIN_MULTIPLIER || request.multiplier > TYPICAL_MAX_MULTIPLIER {
        warnings.push(format!(
            "Multiplier {} lies outside the typical range {}..={}",
            request.multiplier, TYPICAL_MIN_MULTIPLIER, TYPICAL_MAX_MULTIPLIER
        ));
    }
    if records.is_empty() {
        warnings.push("Selection is empty; simulated totals are zero".to_string());
    }

    let profit_change = change(
        simulation.totals.sum_profit,
        baseline.sum_profit,
        "profit_change",
    )?;
    let output = SensitivityOutput {
        request: request.clone(),
        revenue_change: change(
            simulation.totals.sum_revenue,
            baseline.sum_revenue,
            "revenue_change",
        )?,
        profit_change,
        profit_change_pct: profit_change_pct(profit_change, baseline.sum_profit)?,
        groups: aggregate(&simulation.records, group_by)?,
        baseline,
        simulated: simulation.totals,
        records: simulation.records,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-Factor Sensitivity Simulation",
        &serde_json::json!({
            "field": request.field,
            "multiplier": request.multiplier.to_string(),
            "records": records.len(),
            "volume_rounding": "nearest unit, halves away from zero",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Generate the sweep values from min to max with step; max is always included.
///
/// Grids longer than [`MAX_SWEEP_POINTS`] are rejected.
fn generate_sweep_values(sweep: &SensitivitySweep) -> RollupResult<Vec<Multiplier>> {
    if sweep.step <= Decimal::ZERO {
        return Err(RollupError::InvalidInput {
            field: "step".into(),
            reason: "Step must be positive".into(),
        });
    }
    validate_multiplier(sweep.min)?;
    if sweep.min > sweep.max {
        return Err(RollupError::InvalidInput {
            field: "min".into(),
            reason: "Min must be <= max".into(),
        });
    }

    let span = sweep.max - sweep.min;
    let intervals = span
        .checked_div(sweep.step)
        .map(|n| n.floor())
        .and_then(|n| n.to_usize())
        // min, every interior step and max
        .filter(|n| *n + 2 <= MAX_SWEEP_POINTS)
        .ok_or_else(|| RollupError::InvalidInput {
            field: "step".into(),
            reason: format!(
                "grid from {} to {} by {} exceeds {MAX_SWEEP_POINTS} points",
                sweep.min, sweep.max, sweep.step
            ),
        })?;

    let mut values = Vec::with_capacity(intervals + 2);
    let mut current = sweep.min;
    while current <= sweep.max {
        values.push(current);
        current = match current.checked_add(sweep.step) {
            Some(next) => next,
            None => break,
        };
    }
    if let Some(&last) = values.last() {
        if last < sweep.max {
            values.push(sweep.max);
        }
    }

    Ok(values)
}

/// Evaluate the simulation at every multiplier of the sweep grid.
pub fn sweep_sensitivity(
    records: &[ConfigurationRecord],
    sweep: &SensitivitySweep,
) -> RollupResult<ComputationOutput<SweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let multipliers = generate_sweep_values(sweep)?;
    let baseline = summarize(&roll_up(records)?)?;

    let mut points = Vec::with_capacity(multipliers.len());
    for multiplier in multipliers {
        let request = SensitivityRequest {
            field: sweep.field,
            multiplier,
        };
        let simulation = simulate(records, &request)?;
        points.push(SweepPoint {
            multiplier,
            profit_change: change(
                simulation.totals.sum_profit,
                baseline.sum_profit,
                "profit_change",
            )?,
            totals: simulation.totals,
        });
    }

    if records.is_empty() {
        warnings.push("Selection is empty; every sweep point is zero".to_string());
    }

    let output = SweepOutput {
        field: sweep.field,
        baseline,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-Factor Sensitivity Sweep",
        &serde_json::json!({
            "field": sweep.field,
            "min": sweep.min.to_string(),
            "max": sweep.max.to_string(),
            "step": sweep.step.to_string(),
            "records": records.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
