use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use vehicle_rollup_core::business_model::{self, BusinessModelInput};

use crate::input;

/// Arguments for the company-level business model
#[derive(Args)]
pub struct BusinessModelArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// New cars sold per year
    #[arg(long)]
    pub cars_sold: Option<Decimal>,

    /// Average base price per new car
    #[arg(long)]
    pub avg_base_price: Option<Decimal>,

    /// Average option add-on per new car
    #[arg(long)]
    pub avg_option_price: Option<Decimal>,

    /// All-in cost of building one new car
    #[arg(long)]
    pub cost_per_car: Option<Decimal>,

    /// Financing and leasing revenue per new car
    #[arg(long)]
    pub financing_revenue_per_car: Option<Decimal>,

    /// After-sales services revenue per new car
    #[arg(long)]
    pub service_revenue_per_car: Option<Decimal>,

    /// Connected services revenue per new car
    #[arg(long)]
    pub subscription_revenue_per_car: Option<Decimal>,

    /// Used cars sold per year
    #[arg(long)]
    pub used_cars_sold: Option<Decimal>,

    /// Profit per used car
    #[arg(long)]
    pub used_car_profit: Option<Decimal>,

    /// Fleet cars sold per year
    #[arg(long)]
    pub fleet_cars_sold: Option<Decimal>,

    /// Profit per fleet car
    #[arg(long)]
    pub fleet_profit_per_car: Option<Decimal>,
}

fn from_flags(args: &BusinessModelArgs) -> Result<BusinessModelInput, Box<dyn std::error::Error>> {
    Ok(BusinessModelInput {
        cars_sold: args.cars_sold.ok_or("--cars-sold is required (or provide --input)")?,
        avg_base_price: args
            .avg_base_price
            .ok_or("--avg-base-price is required (or provide --input)")?,
        avg_option_price: args.avg_option_price.unwrap_or(Decimal::ZERO),
        cost_per_car: args
            .cost_per_car
            .ok_or("--cost-per-car is required (or provide --input)")?,
        financing_revenue_per_car: args.financing_revenue_per_car.unwrap_or(Decimal::ZERO),
        service_revenue_per_car: args.service_revenue_per_car.unwrap_or(Decimal::ZERO),
        subscription_revenue_per_car: args.subscription_revenue_per_car.unwrap_or(Decimal::ZERO),
        used_cars_sold: args.used_cars_sold.unwrap_or(Decimal::ZERO),
        used_car_profit: args.used_car_profit.unwrap_or(Decimal::ZERO),
        fleet_cars_sold: args.fleet_cars_sold.unwrap_or(Decimal::ZERO),
        fleet_profit_per_car: args.fleet_profit_per_car.unwrap_or(Decimal::ZERO),
    })
}

pub fn run_business_model(args: BusinessModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bm_input: BusinessModelInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.cars_sold.is_some() {
        from_flags(&args)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file>, individual flags or stdin required for the business model".into());
    };
    let result = business_model::evaluate_business_model(&bm_input)?;
    Ok(serde_json::to_value(result)?)
}
