use clap::Args;
use serde_json::{json, Map, Value};
use tracing::debug;

use vehicle_rollup_core::rollup::aggregate::{self, Dimension, Measure};
use vehicle_rollup_core::rollup::metrics;

use super::RecordArgs;

/// Arguments for grouped aggregation
#[derive(Args)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Dimensions to group by: year, market, powertrain, configuration_key
    /// (comma separated; omit for whole-set totals)
    #[arg(long, value_delimiter = ',')]
    pub group_by: Vec<Dimension>,
}

/// Arguments for a two-dimensional cross-tab
#[derive(Args)]
pub struct CrossTabArgs {
    #[command(flatten)]
    pub source: RecordArgs,

    /// Row dimension
    #[arg(long, default_value = "market")]
    pub rows: Dimension,

    /// Column dimension
    #[arg(long, default_value = "year")]
    pub columns: Dimension,

    /// Measure shown in each cell (e.g. sum-revenue, sum-profit, mean-profit-margin)
    #[arg(long, default_value = "mean-profit-margin")]
    pub measure: Measure,
}

pub fn run_aggregate(args: AggregateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let rolled = metrics::roll_up(&selected)?;
    debug!(group_by = ?args.group_by, "aggregating");
    let report = aggregate::aggregate_report(&rolled, &args.group_by)?;
    Ok(serde_json::to_value(report)?)
}

pub fn run_cross_tab(args: CrossTabArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selected = args.source.select()?;
    let rolled = metrics::roll_up(&selected)?;
    debug!(rows = %args.rows, columns = %args.columns, measure = ?args.measure, "cross-tab");
    let tab = aggregate::cross_tab(&rolled, args.rows, args.columns, args.measure)?;

    // One object per row label keyed by column label, for table and CSV output
    let table: Vec<Value> = tab
        .row_labels
        .iter()
        .zip(&tab.cells)
        .map(|(label, cells)| {
            let mut row = Map::new();
            row.insert(tab.row_dimension.to_string(), json!(label));
            for (column, cell) in tab.column_labels.iter().zip(cells) {
                row.insert(column.clone(), json!(cell.map(|c| c.round_dp(2).to_string())));
            }
            Value::Object(row)
        })
        .collect();

    let mut value = serde_json::to_value(&tab)?;
    if let Value::Object(ref mut map) = value {
        map.insert("table".to_string(), Value::Array(table));
    }
    Ok(json!({ "result": value }))
}
