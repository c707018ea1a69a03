use serde::Deserialize;
use std::io::Read;

use crate::error::RollupError;
use crate::rollup::metrics::validate_record;
use crate::rollup::record::ConfigurationRecord;
use crate::types::{Market, Money};
use crate::RollupResult;

/// CSV row as written in the file. Money columns are parsed from their
/// text so no digit is lost to a float on the way in.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Market")]
    market: Market,
    #[serde(rename = "Powertrain")]
    powertrain: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Volume")]
    volume: i64,
    #[serde(rename = "MSRP", deserialize_with = "rust_decimal::serde::str::deserialize")]
    msrp: Money,
    #[serde(rename = "OptionPrice", deserialize_with = "rust_decimal::serde::str::deserialize")]
    option_price: Money,
    #[serde(rename = "OptionCost", deserialize_with = "rust_decimal::serde::str::deserialize")]
    option_cost: Money,
    #[serde(rename = "PowertrainCost", deserialize_with = "rust_decimal::serde::str::deserialize")]
    powertrain_cost: Money,
    #[serde(rename = "BaseCost", deserialize_with = "rust_decimal::serde::str::deserialize")]
    base_cost: Money,
}

impl From<CsvRow> for ConfigurationRecord {
    fn from(row: CsvRow) -> Self {
        ConfigurationRecord {
            market: row.market,
            powertrain: row.powertrain,
            year: row.year,
            volume: row.volume,
            msrp: row.msrp,
            option_price: row.option_price,
            option_cost: row.option_cost,
            powertrain_cost: row.powertrain_cost,
            base_cost: row.base_cost,
        }
    }
}

fn validate_row(row: usize, record: &ConfigurationRecord) -> RollupResult<()> {
    validate_record(record).map_err(|e| match e {
        RollupError::InvalidInput { field, reason } => RollupError::InvalidInput {
            field: format!("row {row}: {field}"),
            reason,
        },
        other => other,
    })
}

fn validate_all(records: Vec<ConfigurationRecord>) -> RollupResult<Vec<ConfigurationRecord>> {
    for (i, record) in records.iter().enumerate() {
        validate_row(i + 1, record)?;
    }
    Ok(records)
}

/// Load configuration records from CSV with a header row.
///
/// Headers are matched case-sensitively against `Market, Powertrain, Year,
/// Volume, MSRP, OptionPrice, OptionCost, PowertrainCost, BaseCost`; extra
/// columns are ignored. Rows are numbered from 1, excluding the header.
pub fn read_csv<R: Read>(reader: R) -> RollupResult<Vec<ConfigurationRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = ConfigurationRecord::from(row?);
        validate_row(i + 1, &record)?;
        records.push(record);
    }
    Ok(records)
}

/// Load configuration records from a JSON array of row objects.
pub fn read_json(json: &str) -> RollupResult<Vec<ConfigurationRecord>> {
    let records: Vec<ConfigurationRecord> = serde_json::from_str(json)?;
    validate_all(records)
}

/// Load configuration records from an already parsed JSON array.
pub fn from_value(value: serde_json::Value) -> RollupResult<Vec<ConfigurationRecord>> {
    let records: Vec<ConfigurationRecord> = serde_json::from_value(value)?;
    validate_all(records)
}
