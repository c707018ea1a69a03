pub mod aggregate;
pub mod business_model;
pub mod forecast;
pub mod rollup;
pub mod sensitivity;

use clap::Args;
use tracing::{debug, info};

use vehicle_rollup_core::rollup::record::ConfigurationRecord;
use vehicle_rollup_core::rollup::segment::SegmentFilter;
use vehicle_rollup_core::Market;

use crate::input;

/// Record source and segment selection shared by every record command
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Path to a CSV, JSON or YAML file of configuration records (stdin if omitted)
    #[arg(long)]
    pub records: Option<String>,

    /// Keep only these years (comma separated; default: every year present)
    #[arg(long, value_delimiter = ',')]
    pub years: Option<Vec<i32>>,

    /// Keep only these markets (comma separated; default: every market present)
    #[arg(long, value_delimiter = ',')]
    pub markets: Option<Vec<String>>,

    /// Keep only these powertrains (comma separated; default: every powertrain present)
    #[arg(long, value_delimiter = ',')]
    pub powertrains: Option<Vec<String>>,
}

impl RecordArgs {
    fn load(&self) -> Result<Vec<ConfigurationRecord>, Box<dyn std::error::Error>> {
        let records = if let Some(ref path) = self.records {
            input::file::read_records(path)?
        } else if let Some(records) = input::stdin::read_stdin_records()? {
            records
        } else {
            return Err("--records <file> or piped records on stdin required".into());
        };
        info!(count = records.len(), source = self.records.as_deref().unwrap_or("stdin"), "loaded records");
        Ok(records)
    }

    fn filter(&self, records: &[ConfigurationRecord]) -> SegmentFilter {
        let mut filter = SegmentFilter::all_of(records);
        if let Some(ref years) = self.years {
            filter = filter.with_years(years.iter().copied());
        }
        if let Some(ref markets) = self.markets {
            filter = filter.with_markets(markets.iter().map(|m| Market::from(m.trim())));
        }
        if let Some(ref powertrains) = self.powertrains {
            filter = filter.with_powertrains(powertrains.iter().map(|p| p.trim().to_string()));
        }
        filter
    }

    /// Load the records and apply the segment selection.
    pub fn select(&self) -> Result<Vec<ConfigurationRecord>, Box<dyn std::error::Error>> {
        let records = self.load()?;
        let filter = self.filter(&records);
        debug!(
            years = ?filter.years,
            markets = ?filter.markets,
            powertrains = ?filter.powertrains,
            "segment filter"
        );
        let selected = filter.apply(&records);
        info!(selected = selected.len(), of = records.len(), "applied segment filter");
        Ok(selected)
    }
}
