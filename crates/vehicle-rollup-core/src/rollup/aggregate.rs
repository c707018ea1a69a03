use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::RollupError;
use crate::rollup::metrics::RolledUpRecord;
use crate::types::{with_metadata, ComputationOutput, Market, Money, Percent};
use crate::RollupResult;

// ---------------------------------------------------------------------------
// Grouping keys
// ---------------------------------------------------------------------------

/// A dimension records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Market,
    Powertrain,
    ConfigurationKey,
}

impl FromStr for Dimension {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(Dimension::Year),
            "market" => Ok(Dimension::Market),
            "powertrain" => Ok(Dimension::Powertrain),
            "configuration_key" | "configuration-key" | "configuration" => {
                Ok(Dimension::ConfigurationKey)
            }
            other => Err(RollupError::InvalidInput {
                field: "dimension".into(),
                reason: format!(
                    "unknown dimension '{other}', expected year, market, powertrain or configuration_key"
                ),
            }),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Year => "year",
            Dimension::Market => "market",
            Dimension::Powertrain => "powertrain",
            Dimension::ConfigurationKey => "configuration_key",
        };
        f.write_str(name)
    }
}

/// Value of one dimension for one group. Orders years numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DimensionValue {
    Year(i32),
    Market(Market),
    Text(String),
}

impl fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionValue::Year(year) => write!(f, "{year}"),
            DimensionValue::Market(market) => write!(f, "{market}"),
            DimensionValue::Text(text) => f.write_str(text),
        }
    }
}

/// Key of an aggregate group. Only the requested dimensions are populated.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GroupKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powertrain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_key: Option<String>,
}

impl GroupKey {
    pub fn of(item: &RolledUpRecord, group_by: &[Dimension]) -> Self {
        let mut key = GroupKey::default();
        for dimension in group_by {
            match dimension {
                Dimension::Year => key.year = Some(item.record.year),
                Dimension::Market => key.market = Some(item.record.market.clone()),
                Dimension::Powertrain => key.powertrain = Some(item.record.powertrain.clone()),
                Dimension::ConfigurationKey => {
                    key.configuration_key = Some(item.metrics.configuration_key.clone())
                }
            }
        }
        key
    }

    pub fn value(&self, dimension: Dimension) -> Option<DimensionValue> {
        match dimension {
            Dimension::Year => self.year.map(DimensionValue::Year),
            Dimension::Market => self.market.clone().map(DimensionValue::Market),
            Dimension::Powertrain => self.powertrain.clone().map(DimensionValue::Text),
            Dimension::ConfigurationKey => {
                self.configuration_key.clone().map(DimensionValue::Text)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Aggregate measures for one group of rolled-up records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(flatten)]
    pub key: GroupKey,
    pub record_count: usize,
    pub sum_volume: i64,
    pub sum_revenue: Money,
    pub sum_total_cost: Money,
    pub sum_profit: Money,
    pub mean_unit_cost: Money,
    pub mean_base_cost: Money,
    pub mean_option_cost: Money,
    pub mean_powertrain_cost: Money,
    /// Mean of defined per-record margins; `None` when none are defined
    pub mean_profit_margin: Option<Percent>,
}

/// Whole-set totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupTotals {
    pub record_count: usize,
    pub sum_volume: i64,
    pub sum_revenue: Money,
    pub sum_total_cost: Money,
    pub sum_profit: Money,
    pub mean_profit_margin: Option<Percent>,
    /// Records whose margin is undefined (zero revenue)
    pub undefined_margin_count: usize,
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    volume: i64,
    revenue: Decimal,
    total_cost: Decimal,
    profit: Decimal,
    unit_cost: Decimal,
    base_cost: Decimal,
    option_cost: Decimal,
    powertrain_cost: Decimal,
    margin_sum: Decimal,
    margin_count: usize,
}

fn checked_sum(total: Decimal, value: Decimal, field: &str) -> RollupResult<Decimal> {
    match total.checked_add(value) {
        Some(sum) => Ok(sum),
        None => Err(RollupError::overflow(field)),
    }
}

impl Accumulator {
    fn add(&mut self, item: &RolledUpRecord) -> RollupResult<()> {
        self.volume = match self.volume.checked_add(item.record.volume) {
            Some(volume) => volume,
            None => return Err(RollupError::overflow("sum_volume")),
        };
        self.revenue = checked_sum(self.revenue, item.metrics.revenue, "sum_revenue")?;
        self.total_cost = checked_sum(self.total_cost, item.metrics.total_cost, "sum_total_cost")?;
        self.profit = checked_sum(self.profit, item.metrics.profit, "sum_profit")?;
        self.unit_cost = checked_sum(self.unit_cost, item.metrics.unit_cost, "mean_unit_cost")?;
        self.base_cost = checked_sum(self.base_cost, item.record.base_cost, "mean_base_cost")?;
        self.option_cost =
            checked_sum(self.option_cost, item.record.option_cost, "mean_option_cost")?;
        self.powertrain_cost = checked_sum(
            self.powertrain_cost,
            item.record.powertrain_cost,
            "mean_powertrain_cost",
        )?;
        if let Some(margin) = item.metrics.profit_margin {
            self.margin_sum = checked_sum(self.margin_sum, margin, "mean_profit_margin")?;
            self.margin_count += 1;
        }
        self.count += 1;
        Ok(())
    }

    fn mean(&self, sum: Decimal) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            sum / Decimal::from(self.count)
        }
    }

    fn mean_margin(&self) -> Option<Percent> {
        if self.margin_count == 0 {
            None
        } else {
            Some(self.margin_sum / Decimal::from(self.margin_count))
        }
    }

    fn into_row(self, key: GroupKey) -> AggregateRow {
        AggregateRow {
            key,
            record_count: self.count,
            sum_volume: self.volume,
            sum_revenue: self.revenue,
            sum_total_cost: self.total_cost,
            sum_profit: self.profit,
            mean_unit_cost: self.mean(self.unit_cost),
            mean_base_cost: self.mean(self.base_cost),
            mean_option_cost: self.mean(self.option_cost),
            mean_powertrain_cost: self.mean(self.powertrain_cost),
            mean_profit_margin: self.mean_margin(),
        }
    }

    fn into_totals(self) -> RollupTotals {
        RollupTotals {
            record_count: self.count,
            sum_volume: self.volume,
            sum_revenue: self.revenue,
            sum_total_cost: self.total_cost,
            sum_profit: self.profit,
            mean_profit_margin: self.mean_margin(),
            undefined_margin_count: self.count - self.margin_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group rolled-up records by `group_by` and compute sums and means.
///
/// Rows come back ordered by key. An empty record set yields no rows.
/// Fails when a group sum leaves the decimal range.
pub fn aggregate(
    records: &[RolledUpRecord],
    group_by: &[Dimension],
) -> RollupResult<Vec<AggregateRow>> {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for item in records {
        groups
            .entry(GroupKey::of(item, group_by))
            .or_default()
            .add(item)?;
    }
    Ok(groups
        .into_iter()
        .map(|(key, acc)| acc.into_row(key))
        .collect())
}

/// Totals over the whole record set. Zero sums and undefined margin when empty.
pub fn summarize(records: &[RolledUpRecord]) -> RollupResult<RollupTotals> {
    let mut acc = Accumulator::default();
    for item in records {
        acc.add(item)?;
    }
    Ok(acc.into_totals())
}

// ---------------------------------------------------------------------------
// Cross-tab
// ---------------------------------------------------------------------------

/// Measure read from an [`AggregateRow`] into a cross-tab cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    SumVolume,
    SumRevenue,
    SumTotalCost,
    SumProfit,
    MeanUnitCost,
    MeanBaseCost,
    MeanOptionCost,
    MeanPowertrainCost,
    MeanProfitMargin,
}

impl Measure {
    pub fn value(&self, row: &AggregateRow) -> Option<Decimal> {
        match self {
            Measure::SumVolume => Some(Decimal::from(row.sum_volume)),
            Measure::SumRevenue => Some(row.sum_revenue),
            Measure::SumTotalCost => Some(row.sum_total_cost),
            Measure::SumProfit => Some(row.sum_profit),
            Measure::MeanUnitCost => Some(row.mean_unit_cost),
            Measure::MeanBaseCost => Some(row.mean_base_cost),
            Measure::MeanOptionCost => Some(row.mean_option_cost),
            Measure::MeanPowertrainCost => Some(row.mean_powertrain_cost),
            Measure::MeanProfitMargin => row.mean_profit_margin,
        }
    }
}

impl FromStr for Measure {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sum_volume" | "volume" => Ok(Measure::SumVolume),
            "sum_revenue" | "revenue" => Ok(Measure::SumRevenue),
            "sum_total_cost" | "total_cost" => Ok(Measure::SumTotalCost),
            "sum_profit" | "profit" => Ok(Measure::SumProfit),
            "mean_unit_cost" | "unit_cost" => Ok(Measure::MeanUnitCost),
            "mean_base_cost" | "base_cost" => Ok(Measure::MeanBaseCost),
            "mean_option_cost" | "option_cost" => Ok(Measure::MeanOptionCost),
            "mean_powertrain_cost" | "powertrain_cost" => Ok(Measure::MeanPowertrainCost),
            "mean_profit_margin" | "profit_margin" | "margin" => Ok(Measure::MeanProfitMargin),
            other => Err(RollupError::InvalidInput {
                field: "measure".into(),
                reason: format!("unknown measure '{other}'"),
            }),
        }
    }
}

/// Dense two-dimensional view of one measure.
///
/// `cells[i][j]` is the measure for `row_labels[i]` x `column_labels[j]`;
/// `None` means no data (no records in that combination, or an undefined
/// margin), never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub measure: Measure,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<Option<Decimal>>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<Decimal> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.column_labels.iter().position(|l| l == column)?;
        self.cells[i][j]
    }
}

/// Aggregate by two dimensions and lay `measure` out as a dense table.
pub fn cross_tab(
    records: &[RolledUpRecord],
    rows: Dimension,
    columns: Dimension,
    measure: Measure,
) -> RollupResult<CrossTab> {
    if rows == columns {
        return Err(RollupError::InvalidInput {
            field: "columns".into(),
            reason: format!("row and column dimensions must differ, both are '{rows}'"),
        });
    }

    let mut row_values: BTreeSet<DimensionValue> = BTreeSet::new();
    let mut column_values: BTreeSet<DimensionValue> = BTreeSet::new();
    let mut values: BTreeMap<(DimensionValue, DimensionValue), Option<Decimal>> = BTreeMap::new();

    for row in aggregate(records, &[rows, columns])? {
        if let (Some(r), Some(c)) = (row.key.value(rows), row.key.value(columns)) {
            row_values.insert(r.clone());
            column_values.insert(c.clone());
            values.insert((r, c), measure.value(&row));
        }
    }

    let cells = row_values
        .iter()
        .map(|r| {
            column_values
                .iter()
                .map(|c| values.get(&(r.clone(), c.clone())).copied().flatten())
                .collect()
        })
        .collect();

    Ok(CrossTab {
        row_dimension: rows,
        column_dimension: columns,
        measure,
        row_labels: row_values.iter().map(|v| v.to_string()).collect(),
        column_labels: column_values.iter().map(|v| v.to_string()).collect(),
        cells,
    })
}

// ---------------------------------------------------------------------------
// Report envelope
// ---------------------------------------------------------------------------

/// Grouped rows plus whole-set totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub group_by: Vec<Dimension>,
    pub rows: Vec<AggregateRow>,
    pub totals: RollupTotals,
}

/// Aggregate `records` by `group_by` and wrap the rows and totals in the
/// standard output envelope.
pub fn aggregate_report(
    records: &[RolledUpRecord],
    group_by: &[Dimension],
) -> RollupResult<ComputationOutput<AggregateReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let distinct: BTreeSet<Dimension> = group_by.iter().copied().collect();
    if distinct.len() != group_by.len() {
        return Err(RollupError::InvalidInput {
            field: "group_by".into(),
            reason: "each dimension may appear only once".into(),
        });
    }

    let rows = aggregate(records, group_by)?;
    let totals = summarize(records)?;

    if records.is_empty() {
        warnings.push("Selection is empty; no aggregate rows produced".to_string());
    }
    if totals.undefined_margin_count > 0 {
        warnings.push(format!(
            "{} record(s) have zero revenue; their margin is undefined and excluded from margin means",
            totals.undefined_margin_count
        ));
    }

    let output = AggregateReport {
        group_by: group_by.to_vec(),
        rows,
        totals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Segment Rollup Aggregation",
        &serde_json::json!({
            "group_by": group_by,
            "records": records.len(),
            "margin_mean": "unweighted mean of defined per-record margins",
        }),
        warnings,
        elapsed,
        output,
    ))
}
