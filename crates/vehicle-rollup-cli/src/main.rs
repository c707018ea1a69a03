mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::aggregate::{AggregateArgs, CrossTabArgs};
use commands::business_model::BusinessModelArgs;
use commands::forecast::ForecastArgs;
use commands::rollup::RollupArgs;
use commands::sensitivity::{SensitivityArgs, SweepArgs};
use config::CliConfig;

/// Vehicle configuration profitability rollups
#[derive(Parser)]
#[command(
    name = "vrollup",
    version,
    about = "Vehicle configuration profitability rollups",
    long_about = "A CLI for rolling up vehicle sales configurations into revenue, cost, \
                  profit and margin with decimal precision. Supports segment filters, \
                  grouped aggregation, cross-tabs, option-cost and volume sensitivity, \
                  and yearly revenue forecasts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to the TOML configuration file (missing file means defaults)
    #[arg(long, default_value = "vrollup.toml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive revenue, cost, profit and margin for every selected record
    Rollup(RollupArgs),
    /// Group rolled-up records by dimensions and total them
    Aggregate(AggregateArgs),
    /// Lay one measure out by two dimensions
    CrossTab(CrossTabArgs),
    /// Simulate a multiplier on option cost or volume against the baseline
    Sensitivity(SensitivityArgs),
    /// Evaluate the sensitivity simulation over a multiplier grid
    Sweep(SweepArgs),
    /// Forecast yearly revenue with a linear trend
    Forecast(ForecastArgs),
    /// Company-level profit across new, used and fleet sales
    BusinessModel(BusinessModelArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Log to stderr; `RUST_LOG` wins over the configured level.
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(&config);
    tracing::debug!(config = %cli.config.display(), ?config, "configuration loaded");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Rollup(args) => commands::rollup::run_rollup(args),
        Commands::Aggregate(args) => commands::aggregate::run_aggregate(args),
        Commands::CrossTab(args) => commands::aggregate::run_cross_tab(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Sweep(args) => commands::sensitivity::run_sweep(args, &config),
        Commands::Forecast(args) => commands::forecast::run_forecast(args, &config),
        Commands::BusinessModel(args) => commands::business_model::run_business_model(args),
        Commands::Version => {
            println!("vrollup {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value, &config.currency_symbol);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
