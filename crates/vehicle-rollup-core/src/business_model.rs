use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RollupError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::RollupResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Company-level assumptions for a car maker's annual profit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessModelInput {
    /// New cars sold per year
    pub cars_sold: Decimal,
    pub avg_base_price: Money,
    /// Average option add-on per new car
    pub avg_option_price: Money,
    /// All-in cost of building one new car
    pub cost_per_car: Money,
    /// Financing and leasing revenue per new car
    #[serde(default)]
    pub financing_revenue_per_car: Money,
    /// After-sales services revenue per new car
    #[serde(default)]
    pub service_revenue_per_car: Money,
    /// Connected services (software, subscriptions) revenue per new car
    #[serde(default)]
    pub subscription_revenue_per_car: Money,
    #[serde(default)]
    pub used_cars_sold: Decimal,
    #[serde(default)]
    pub used_car_profit: Money,
    #[serde(default)]
    pub fleet_cars_sold: Decimal,
    #[serde(default)]
    pub fleet_profit_per_car: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessModelOutput {
    /// avg_base_price + avg_option_price
    pub selling_price: Money,
    /// selling_price - cost_per_car
    pub profit_per_car: Money,
    /// cars_sold * selling_price
    pub total_revenue: Money,
    /// cars_sold * (profit_per_car + financing + service + subscription)
    pub new_car_profit: Money,
    pub used_car_profit_total: Money,
    pub fleet_profit_total: Money,
    pub total_profit: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Annual revenue and profit across new, used and fleet sales plus
/// per-car ancillary streams.
pub fn evaluate_business_model(
    input: &BusinessModelInput,
) -> RollupResult<ComputationOutput<BusinessModelOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(input)?;

    let selling_price = input.avg_base_price + input.avg_option_price;
    let profit_per_car = selling_price - input.cost_per_car;
    let total_revenue = input.cars_sold * selling_price;

    let ancillary_per_car = input.financing_revenue_per_car
        + input.service_revenue_per_car
        + input.subscription_revenue_per_car;
    let new_car_profit = input.cars_sold * (profit_per_car + ancillary_per_car);
    let used_car_profit_total = input.used_cars_sold * input.used_car_profit;
    let fleet_profit_total = input.fleet_cars_sold * input.fleet_profit_per_car;
    let total_profit = new_car_profit + used_car_profit_total + fleet_profit_total;

    if profit_per_car < Decimal::ZERO {
        warnings.push(format!(
            "Cost per car exceeds selling price by {}; each new car sells at a loss",
            -profit_per_car
        ));
    }

    let output = BusinessModelOutput {
        selling_price,
        profit_per_car,
        total_revenue,
        new_car_profit,
        used_car_profit_total,
        fleet_profit_total,
        total_profit,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Vehicle Business Model Profit Simulation",
        &serde_json::json!({
            "cars_sold": input.cars_sold.to_string(),
            "used_cars_sold": input.used_cars_sold.to_string(),
            "fleet_cars_sold": input.fleet_cars_sold.to_string(),
            "revenue_scope": "new-car sales only; ancillary streams enter profit",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate(input: &BusinessModelInput) -> RollupResult<()> {
    let fields = [
        ("cars_sold", input.cars_sold),
        ("avg_base_price", input.avg_base_price),
        ("avg_option_price", input.avg_option_price),
        ("cost_per_car", input.cost_per_car),
        ("financing_revenue_per_car", input.financing_revenue_per_car),
        ("service_revenue_per_car", input.service_revenue_per_car),
        ("subscription_revenue_per_car", input.subscription_revenue_per_car),
        ("used_cars_sold", input.used_cars_sold),
        ("used_car_profit", input.used_car_profit),
        ("fleet_cars_sold", input.fleet_cars_sold),
        ("fleet_profit_per_car", input.fleet_profit_per_car),
    ];
    for (field, value) in fields {
        if value < Decimal::ZERO {
            return Err(RollupError::InvalidInput {
                field: field.to_string(),
                reason: "cannot be negative".to_string(),
            });
        }
    }
    Ok(())
}
