use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::RollupError;
use crate::forecast::adapter::{ForecastPoint, Forecaster, SeriesPoint};
use crate::RollupResult;

/// Default width of the prediction interval.
pub const DEFAULT_CONFIDENCE: f64 = 0.80;

/// Least-squares linear trend of value against calendar year.
///
/// Bounds come from the Student-t prediction interval of a new observation.
/// With only two points there are no residual degrees of freedom and the
/// bounds collapse onto the prediction.
#[derive(Debug, Clone, Copy)]
pub struct LinearTrendForecaster {
    confidence: f64,
}

impl Default for LinearTrendForecaster {
    fn default() -> Self {
        LinearTrendForecaster {
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl LinearTrendForecaster {
    pub fn new(confidence: f64) -> RollupResult<Self> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(RollupError::InvalidInput {
                field: "confidence".into(),
                reason: format!("must lie strictly between 0 and 1, got {confidence}"),
            });
        }
        Ok(LinearTrendForecaster { confidence })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn to_decimal(value: f64) -> RollupResult<Decimal> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| RollupError::ForecastFailure(format!("{value} is not representable")))
}

impl Forecaster for LinearTrendForecaster {
    fn name(&self) -> &str {
        "linear_trend"
    }

    fn forecast(&self, series: &[SeriesPoint], horizon: usize) -> RollupResult<Vec<ForecastPoint>> {
        if series.len() < 2 {
            return Err(RollupError::InsufficientData(
                "Linear trend needs at least 2 observations".into(),
            ));
        }

        let xs: Vec<f64> = series.iter().map(|p| f64::from(p.period.year())).collect();
        let ys: Vec<f64> = series
            .iter()
            .map(|p| {
                p.value
                    .to_f64()
                    .ok_or_else(|| RollupError::ForecastFailure(format!("{} is not finite", p.value)))
            })
            .collect::<RollupResult<_>>()?;

        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;
        let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();
        if sxx == 0.0 {
            return Err(RollupError::InsufficientData(
                "All observations share one period".into(),
            ));
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let dof = xs.len() - 2;
        let (std_err, t_crit) = if dof == 0 {
            (0.0, 0.0)
        } else {
            let sse: f64 = xs
                .iter()
                .zip(&ys)
                .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
                .sum();
            let dist = StudentsT::new(0.0, 1.0, dof as f64)
                .map_err(|e| RollupError::ForecastFailure(e.to_string()))?;
            (
                (sse / dof as f64).sqrt(),
                dist.inverse_cdf(0.5 + self.confidence / 2.0),
            )
        };

        let last_year = series[series.len() - 1].period.year();
        (1..=horizon)
            .map(|k| {
                let year = last_year + k as i32;
                let x = f64::from(year);
                let predicted = intercept + slope * x;
                let half_width =
                    t_crit * std_err * (1.0 + 1.0 / n + (x - x_mean).powi(2) / sxx).sqrt();
                let period = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
                    RollupError::ForecastFailure(format!("{year} is not a representable year"))
                })?;
                Ok(ForecastPoint {
                    period,
                    predicted: to_decimal(predicted)?,
                    lower_bound: to_decimal(predicted - half_width)?,
                    upper_bound: to_decimal(predicted + half_width)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(points: &[(i32, Decimal)]) -> Vec<SeriesPoint> {
        points
            .iter()
            .map(|&(year, value)| SeriesPoint {
                period: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                value,
            })
            .collect()
    }

    #[test]
    fn test_exact_line_extrapolates_with_zero_width() {
        let s = series(&[
            (2020, dec!(1000)),
            (2021, dec!(1100)),
            (2022, dec!(1200)),
            (2023, dec!(1300)),
        ]);
        let out = LinearTrendForecaster::default().forecast(&s, 3).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].period, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(out[0].predicted, dec!(1400));
        assert_eq!(out[2].predicted, dec!(1600));
        for p in &out {
            assert_eq!(p.lower_bound, p.predicted);
            assert_eq!(p.upper_bound, p.predicted);
        }
    }

    #[test]
    fn test_two_points_collapse_bounds() {
        let s = series(&[(2022, dec!(100)), (2024, dec!(140))]);
        let out = LinearTrendForecaster::default().forecast(&s, 1).unwrap();
        assert_eq!(out[0].period, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(out[0].predicted, dec!(160));
        assert_eq!(out[0].lower_bound, out[0].upper_bound);
    }

    #[test]
    fn test_noisy_series_has_widening_bounds() {
        let s = series(&[
            (2019, dec!(100)),
            (2020, dec!(130)),
            (2021, dec!(115)),
            (2022, dec!(160)),
            (2023, dec!(150)),
        ]);
        let out = LinearTrendForecaster::default().forecast(&s, 3).unwrap();
        for p in &out {
            assert!(p.lower_bound < p.predicted && p.predicted < p.upper_bound);
        }
        let width = |p: &ForecastPoint| p.upper_bound - p.lower_bound;
        assert!(width(&out[0]) < width(&out[2]));
    }

    #[test]
    fn test_higher_confidence_widens_interval() {
        let s = series(&[
            (2019, dec!(100)),
            (2020, dec!(130)),
            (2021, dec!(115)),
            (2022, dec!(160)),
        ]);
        let narrow = LinearTrendForecaster::new(0.5).unwrap().forecast(&s, 1).unwrap();
        let wide = LinearTrendForecaster::new(0.95).unwrap().forecast(&s, 1).unwrap();
        assert!(
            wide[0].upper_bound - wide[0].lower_bound > narrow[0].upper_bound - narrow[0].lower_bound
        );
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        assert!(LinearTrendForecaster::new(0.0).is_err());
        assert!(LinearTrendForecaster::new(1.0).is_err());
        assert!(LinearTrendForecaster::new(f64::NAN).is_err());
    }
}
