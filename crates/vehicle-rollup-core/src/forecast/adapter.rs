use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RollupError;
use crate::rollup::aggregate::{aggregate, Dimension};
use crate::rollup::metrics::RolledUpRecord;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::RollupResult;

/// Number of future periods requested when the caller does not say.
pub const DEFAULT_HORIZON: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Total revenue of one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRevenue {
    pub year: i32,
    pub revenue: Money,
}

/// One observation of a calendar-anchored series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// January 1 of the observed year
    pub period: NaiveDate,
    pub value: Decimal,
}

/// One predicted future period with its confidence bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: NaiveDate,
    pub predicted: Decimal,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
}

/// Time-series prediction capability.
///
/// Implementations receive a validated series (at least two points, strictly
/// increasing periods) and return `horizon` future points.
pub trait Forecaster {
    /// Short identifier recorded in the output assumptions.
    fn name(&self) -> &str;

    fn forecast(&self, series: &[SeriesPoint], horizon: usize) -> RollupResult<Vec<ForecastPoint>>;
}

/// Revenue history and the collaborator's forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub forecaster: String,
    pub horizon: usize,
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<ForecastPoint>,
}

// ---------------------------------------------------------------------------
// Series construction
// ---------------------------------------------------------------------------

/// Total revenue per year, ordered by year.
pub fn yearly_revenue(records: &[RolledUpRecord]) -> RollupResult<Vec<YearlyRevenue>> {
    Ok(aggregate(records, &[Dimension::Year])?
        .into_iter()
        .filter_map(|row| {
            row.key.year.map(|year| YearlyRevenue {
                year,
                revenue: row.sum_revenue,
            })
        })
        .collect())
}

fn year_start(year: i32) -> RollupResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| RollupError::InvalidInput {
        field: "year".into(),
        reason: format!("{year} is not a representable calendar year"),
    })
}

/// Anchor each year at January 1 and check the history can support a trend.
///
/// Years need not be contiguous but must be strictly increasing, and at least
/// two distinct years are required.
pub fn build_series(history: &[YearlyRevenue]) -> RollupResult<Vec<SeriesPoint>> {
    let mut years: Vec<i32> = history.iter().map(|h| h.year).collect();
    years.sort_unstable();
    years.dedup();
    if years.len() < 2 {
        return Err(RollupError::InsufficientData(format!(
            "At least 2 distinct years required for a trend forecast, got {}",
            years.len()
        )));
    }

    for pair in history.windows(2) {
        if pair[1].year <= pair[0].year {
            return Err(RollupError::InvalidInput {
                field: "year".into(),
                reason: format!(
                    "years must be strictly increasing, {} follows {}",
                    pair[1].year, pair[0].year
                ),
            });
        }
    }

    history
        .iter()
        .map(|h| {
            Ok(SeriesPoint {
                period: year_start(h.year)?,
                value: h.revenue,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Validate the revenue history, hand it to `forecaster` and return its
/// predictions unmodified.
pub fn forecast_revenue<F: Forecaster + ?Sized>(
    history: &[YearlyRevenue],
    horizon: usize,
    forecaster: &F,
) -> RollupResult<ComputationOutput<ForecastOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if horizon == 0 {
        return Err(RollupError::InvalidInput {
            field: "horizon".into(),
            reason: "At least one future period must be requested".into(),
        });
    }

    let series = build_series(history)?;
    let forecast = forecaster.forecast(&series, horizon)?;

    let gaps = history
        .windows(2)
        .filter(|pair| pair[1].year - pair[0].year > 1)
        .count();
    if gaps > 0 {
        warnings.push(format!("Revenue history has {gaps} gap(s) between observed years"));
    }
    if forecast.len() != horizon {
        warnings.push(format!(
            "Forecaster '{}' returned {} period(s) for a horizon of {}",
            forecaster.name(),
            forecast.len(),
            horizon
        ));
    }

    let output = ForecastOutput {
        forecaster: forecaster.name().to_string(),
        horizon,
        history: series,
        forecast,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Yearly Revenue Forecast (delegated)",
        &serde_json::json!({
            "forecaster": forecaster.name(),
            "horizon": horizon,
            "first_year": output.history.first().map(|p| p.period.year()),
            "last_year": output.history.last().map(|p| p.period.year()),
            "anchor": "January 1 of each year",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Repeats the last observation with a fixed +/- band.
    struct LastValue;

    impl Forecaster for LastValue {
        fn name(&self) -> &str {
            "last_value"
        }

        fn forecast(
            &self,
            series: &[SeriesPoint],
            horizon: usize,
        ) -> RollupResult<Vec<ForecastPoint>> {
            let last = series.last().unwrap();
            Ok((1..=horizon as i32)
                .map(|k| ForecastPoint {
                    period: NaiveDate::from_ymd_opt(last.period.year() + k, 1, 1).unwrap(),
                    predicted: last.value,
                    lower_bound: last.value - dec!(10),
                    upper_bound: last.value + dec!(10),
                })
                .collect())
        }
    }

    struct Failing;

    impl Forecaster for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn forecast(&self, _: &[SeriesPoint], _: usize) -> RollupResult<Vec<ForecastPoint>> {
            Err(RollupError::ForecastFailure("model did not fit".into()))
        }
    }

    fn history(points: &[(i32, Decimal)]) -> Vec<YearlyRevenue> {
        points
            .iter()
            .map(|&(year, revenue)| YearlyRevenue { year, revenue })
            .collect()
    }

    #[test]
    fn test_series_anchored_at_january_first() {
        let series = build_series(&history(&[(2022, dec!(1)), (2024, dec!(2))])).unwrap();
        assert_eq!(series[0].period, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(series[1].period, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series[1].value, dec!(2));
    }

    #[test]
    fn test_single_year_is_insufficient() {
        let result = forecast_revenue(&history(&[(2024, dec!(100))]), 3, &LastValue);
        assert!(matches!(result, Err(RollupError::InsufficientData(_))));
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let result = forecast_revenue(&[], DEFAULT_HORIZON, &LastValue);
        assert!(matches!(result, Err(RollupError::InsufficientData(_))));
    }

    #[test]
    fn test_repeated_year_is_insufficient() {
        let result = build_series(&history(&[(2024, dec!(1)), (2024, dec!(2))]));
        assert!(matches!(result, Err(RollupError::InsufficientData(_))));
    }

    #[test]
    fn test_unordered_years_rejected() {
        let result = build_series(&history(&[(2024, dec!(1)), (2023, dec!(2))]));
        match result {
            Err(RollupError::InvalidInput { field, .. }) => assert_eq!(field, "year"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let h = history(&[(2023, dec!(1)), (2024, dec!(2))]);
        assert!(forecast_revenue(&h, 0, &LastValue).is_err());
    }

    #[test]
    fn test_collaborator_output_surfaced_unmodified() {
        let h = history(&[(2022, dec!(100)), (2023, dec!(120)), (2024, dec!(150))]);
        let out = forecast_revenue(&h, DEFAULT_HORIZON, &LastValue).unwrap();
        let expected = LastValue.forecast(&build_series(&h).unwrap(), 3).unwrap();
        assert_eq!(out.result.forecast, expected);
        assert_eq!(out.result.forecaster, "last_value");
        assert_eq!(out.result.history.len(), 3);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_gaps_are_warned_not_rejected() {
        let h = history(&[(2020, dec!(100)), (2024, dec!(150))]);
        let out = forecast_revenue(&h, 1, &LastValue).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("gap"));
    }

    #[test]
    fn test_collaborator_failure_propagates() {
        let h = history(&[(2023, dec!(1)), (2024, dec!(2))]);
        assert!(matches!(
            forecast_revenue(&h, 3, &Failing),
            Err(RollupError::ForecastFailure(_))
        ));
    }

    #[test]
    fn test_dyn_forecaster_accepted() {
        let h = history(&[(2023, dec!(1)), (2024, dec!(2))]);
        let forecaster: Box<dyn Forecaster> = Box::new(LastValue);
        assert!(forecast_revenue(&h, 2, forecaster.as_ref()).is_ok());
    }
}
