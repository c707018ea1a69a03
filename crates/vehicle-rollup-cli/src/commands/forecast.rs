use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use vehicle_rollup_core::forecast::adapter;
use vehicle_rollup_core::forecast::trend::LinearTrendForecaster;
use vehicle_rollup_core::rollup::metrics;

use super::RecordArgs;
use crate::config::CliConfig;

/// Arguments for the yearly revenue forecast
#[derive(Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Future years to predict (default from config, 3)
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Prediction interval width, strictly between 0 and 1 (default from config, 0.80)
    #[arg(long)]
    pub confidence: Option<f64>,
}

pub fn run_forecast(args: ForecastArgs, config: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let rolled = metrics::roll_up(&selected)?;
    let history = adapter::yearly_revenue(&rolled)?;
    debug!(years = history.len(), "built yearly revenue history");

    let horizon = args.horizon.unwrap_or(config.forecast_horizon);
    let forecaster = LinearTrendForecaster::new(args.confidence.unwrap_or(config.confidence))?;
    info!(
        forecaster = "linear_trend",
        confidence = forecaster.confidence(),
        horizon,
        "forecasting revenue"
    );

    let output = adapter::forecast_revenue(&history, horizon, &forecaster)?;
    Ok(serde_json::to_value(output)?)
}
