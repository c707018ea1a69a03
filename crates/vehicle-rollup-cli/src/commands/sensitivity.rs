use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

use vehicle_rollup_core::rollup::aggregate::Dimension;
use vehicle_rollup_core::scenarios::sensitivity::{
    self, SensitivityField, SensitivityRequest, SensitivitySweep,
};

use super::RecordArgs;
use crate::config::CliConfig;

/// Arguments for a single what-if simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Field to perturb: option-cost or volume
    #[arg(long)]
    pub field: SensitivityField,

    /// Multiplier applied to the field on every record (e.g. 1.2)
    #[arg(long)]
    pub multiplier: Decimal,

    /// Group the simulated records by these dimensions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub group_by: Vec<Dimension>,

    /// Include every simulated record in the output
    #[arg(long)]
    pub with_records: bool,
}

/// Arguments for a multiplier sweep
#[derive(Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Field to perturb: option-cost or volume
    #[arg(long)]
    pub field: SensitivityField,

    /// Smallest multiplier (default from config, 0.5)
    #[arg(long)]
    pub min: Option<Decimal>,

    /// Largest multiplier, always evaluated (default from config, 2.0)
    #[arg(long)]
    pub max: Option<Decimal>,

    /// Grid step (default from config, 0.25)
    #[arg(long)]
    pub step: Option<Decimal>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let request = SensitivityRequest {
        field: args.field,
        multiplier: args.multiplier,
    };
    info!(field = %request.field, multiplier = %request.multiplier, "running sensitivity");

    let mut output = sensitivity::run_sensitivity(&selected, &request, &args.group_by)?;
    for w in &output.warnings {
        warn!("{}", w);
    }
    if !args.with_records {
        output.result.records.clear();
    }
    Ok(serde_json::to_value(output)?)
}

pub fn run_sweep(args: SweepArgs, config: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let sweep = SensitivitySweep {
        field: args.field,
        min: args.min.unwrap_or(config.sweep_min),
        max: args.max.unwrap_or(config.sweep_max),
        step: args.step.unwrap_or(config.sweep_step),
    };
    info!(
        field = %sweep.field,
        min = %sweep.min,
        max = %sweep.max,
        step = %sweep.step,
        "running sweep"
    );

    let output = sensitivity::sweep_sensitivity(&selected, &sweep)?;
    Ok(serde_json::to_value(output)?)
}
