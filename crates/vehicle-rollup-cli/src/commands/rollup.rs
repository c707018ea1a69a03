use clap::Args;
use serde_json::Value;
use tracing::info;

use vehicle_rollup_core::rollup::metrics;

use super::RecordArgs;

/// Arguments for per-record rollup
#[derive(Args)]
pub struct RollupArgs {
    #[command(flatten)]
    pub source: RecordArgs,
}

pub fn run_rollup(args: RollupArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let rolled = metrics::roll_up(&selected)?;
    let undefined = rolled
        .iter()
        .filter(|r| r.metrics.profit_margin.is_none())
        .count();
    if undefined > 0 {
        info!(undefined, "records with zero revenue have no margin");
    }
    Ok(serde_json::to_value(rolled)?)
}
