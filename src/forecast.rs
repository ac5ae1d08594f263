use crate::config::AnalysisConfig;
use crate::error::{LedgerError, Result};
use crate::schema::{Granularity, Ledger};
use crate::seasonality::{components_for, seasonal_features, SeasonalComponent, SeasonalityMode};
use crate::stats::{percentile_sorted, solve_linear_system};
use crate::utils::{bucket_range, bucket_start, days_between, month_start, next_bucket};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ridge penalty applied to Fourier coefficients, relative to the scaled target.
const SEASONAL_RIDGE: f64 = 1e-2;

/// Summed amounts per bucket, contiguous from the first to the last observed bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSeries {
    pub granularity: Granularity,
    pub points: BTreeMap<NaiveDate, f64>,
}

impl TimeSeries {
    /// Buckets raw `(date, amount)` pairs and fills missing buckets with 0.
    pub fn from_points<I>(granularity: Granularity, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, amount) in points {
            *totals.entry(bucket_start(date, granularity)).or_insert(0.0) += amount;
        }

        if let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) {
            for bucket in bucket_range(first, last, granularity) {
                totals.entry(bucket).or_insert(0.0);
            }
        }

        Self {
            granularity,
            points: totals,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_bucket(&self) -> Option<NaiveDate> {
        self.points.keys().next().copied()
    }

    pub fn last_bucket(&self) -> Option<NaiveDate> {
        self.points.keys().next_back().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.values().next_back().copied()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    /// Re-buckets by month. A week counts towards the month its Monday falls in.
    pub fn to_monthly(&self) -> TimeSeries {
        if self.granularity == Granularity::Month {
            return self.clone();
        }
        TimeSeries::from_points(
            Granularity::Month,
            self.points.iter().map(|(&d, &v)| (month_start(d), v)),
        )
    }
}

/// Sums signed spend per bucket at the given granularity. Income counts negative whatever
/// the sign of its amount (see [`crate::schema::Transaction::outflow`]).
pub fn aggregate(ledger: &Ledger, granularity: Granularity) -> TimeSeries {
    TimeSeries::from_points(
        granularity,
        ledger.transactions().iter().map(|t| (t.date, t.outflow())),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_amount: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// True only for buckets after the last observed one
    pub is_prediction: bool,
}

/// Linear trend plus Fourier seasonality, fitted by least squares.
#[derive(Debug, Clone)]
pub struct Forecaster {
    interval_width: f64,
    uncertainty_samples: usize,
    seasonality_mode: SeasonalityMode,
    seed: u64,
}

/// Coefficients of a fitted model on the scaled series.
struct FittedModel {
    components: Vec<SeasonalComponent>,
    mode: SeasonalityMode,
    trend: Vec<f64>,
    seasonal: Vec<f64>,
    sigma: f64,
    slope_se: f64,
}

impl FittedModel {
    fn predict(&self, t: f64, t_days: f64) -> f64 {
        let trend = self.trend[0] + self.trend[1] * t;
        let seasonal: f64 = seasonal_features(&self.components, t_days)
            .iter()
            .zip(&self.seasonal)
            .map(|(x, b)| x * b)
            .sum();

        match self.mode {
            SeasonalityMode::Additive => trend + seasonal,
            SeasonalityMode::Multiplicative => trend * (1.0 + seasonal),
        }
    }
}

impl Forecaster {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            interval_width: config.interval_width,
            uncertainty_samples: config.uncertainty_samples,
            seasonality_mode: config.seasonality_mode,
            seed: config.random_seed,
        }
    }

    /// Fitted values for every historical bucket followed by `horizon` predictions.
    ///
    /// An empty series yields an empty forecast. Fewer than two buckets, or a model that
    /// cannot be fitted, is a `ForecastError`.
    pub fn forecast(&self, series: &TimeSeries, horizon: usize) -> Result<Vec<ForecastPoint>> {
        let (Some(first), Some(last)) = (series.first_bucket(), series.last_bucket()) else {
            return Ok(Vec::new());
        };

        if series.len() < 2 {
            return Err(LedgerError::ForecastError(format!(
                "at least 2 distinct {} buckets are needed to fit a trend, got {}",
                series.granularity,
                series.len()
            )));
        }

        let span_days = days_between(first, last).max(1) as f64;
        let y_scale = series
            .points
            .values()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let observations: Vec<(f64, f64, f64)> = series
            .points
            .iter()
            .map(|(&date, &value)| {
                let t_days = days_between(first, date) as f64;
                (t_days / span_days, t_days, value / y_scale)
            })
            .collect();

        let components = components_for(series.granularity, span_days as i64);
        let model = self.fit(&observations, components)?;

        debug!(
            "Fitted {:?} model on {} buckets: trend {:?}, sigma {:.6}, slope se {:.6}",
            model.mode,
            observations.len(),
            model.trend,
            model.sigma,
            model.slope_se
        );

        let mut dates = bucket_range(first, last, series.granularity);
        let mut cursor = last;
        for _ in 0..horizon {
            if cursor == NaiveDate::MAX {
                break;
            }
            cursor = next_bucket(cursor, series.granularity);
            dates.push(cursor);
        }

        let noise = normal(model.sigma)?;
        let slope = normal(model.slope_se)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let lower_q = (1.0 - self.interval_width) / 2.0 * 100.0;
        let upper_q = (1.0 + self.interval_width) / 2.0 * 100.0;

        let mut points = Vec::with_capacity(dates.len());
        for date in dates {
            let t_days = days_between(first, date) as f64;
            let t = t_days / span_days;
            let predicted = model.predict(t, t_days);
            let steps_ahead = (t - 1.0).max(0.0);

            let mut draws: Vec<f64> = (0..self.uncertainty_samples.max(1))
                .map(|_| {
                    let slope_shift = slope.as_ref().map_or(0.0, |d| d.sample(&mut rng));
                    let observation = noise.as_ref().map_or(0.0, |d| d.sample(&mut rng));
                    let trend_shift = slope_shift * steps_ahead;
                    trend_shift + observation
                })
                .collect();
            draws.sort_by(|a, b| a.total_cmp(b));

            let predicted_amount = predicted * y_scale;
            let lower = (predicted + percentile_sorted(&draws, lower_q)) * y_scale;
            let upper = (predicted + percentile_sorted(&draws, upper_q)) * y_scale;

            points.push(ForecastPoint {
                date,
                predicted_amount,
                lower_bound: lower.min(predicted_amount),
                upper_bound: upper.max(predicted_amount),
                is_prediction: date > last,
            });
        }

        info!(
            "Forecast {} {} buckets ahead from {} observed",
            horizon,
            series.granularity,
            series.len()
        );

        Ok(points)
    }

    fn fit(
        &self,
        observations: &[(f64, f64, f64)],
        components: Vec<SeasonalComponent>,
    ) -> Result<FittedModel> {
        let targets: Vec<f64> = observations.iter().map(|o| o.2).collect();
        let width: usize = components.iter().map(SeasonalComponent::width).sum();

        let mut mode = self.seasonality_mode;
        if mode == SeasonalityMode::Multiplicative && width == 0 {
            mode = SeasonalityMode::Additive;
        }

        let (trend, seasonal, penalized) = match mode {
            SeasonalityMode::Additive => {
                let rows: Vec<Vec<f64>> = observations
                    .iter()
                    .map(|&(t, t_days, _)| {
                        let mut row = vec![1.0, t];
                        row.extend(seasonal_features(&components, t_days));
                        row
                    })
                    .collect();
                let (beta, normal_matrix) = ridge(&rows, &targets, 2)?;
                (beta[..2].to_vec(), beta[2..].to_vec(), normal_matrix)
            }
            SeasonalityMode::Multiplicative => {
                let trend_rows: Vec<Vec<f64>> =
                    observations.iter().map(|&(t, _, _)| vec![1.0, t]).collect();
                let (trend, normal_matrix) = ridge(&trend_rows, &targets, 2)?;
                let baseline: Vec<f64> = observations
                    .iter()
                    .map(|&(t, _, _)| trend[0] + trend[1] * t)
                    .collect();

                if baseline.iter().any(|b| b.abs() < 1e-6) {
                    warn!("Trend crosses zero; falling back to additive seasonality");
                    let additive = Forecaster {
                        seasonality_mode: SeasonalityMode::Additive,
                        ..self.clone()
                    };
                    return additive.fit(observations, components);
                }

                let seasonal_rows: Vec<Vec<f64>> = observations
                    .iter()
                    .map(|&(_, t_days, _)| seasonal_features(&components, t_days))
                    .collect();
                let relative: Vec<f64> = targets
                    .iter()
                    .zip(&baseline)
                    .map(|(y, b)| y / b - 1.0)
                    .collect();
                let (seasonal, _) = ridge(&seasonal_rows, &relative, 0)?;
                (trend, seasonal, normal_matrix)
            }
        };

        let mut model = FittedModel {
            components,
            mode,
            trend,
            seasonal,
            sigma: 0.0,
            slope_se: 0.0,
        };

        let sse: f64 = observations
            .iter()
            .map(|&(t, t_days, y)| (y - model.predict(t, t_days)).powi(2))
            .sum();
        let n = observations.len();
        let params = 2 + width;
        let dof = if n > params { n - params } else { n };
        model.sigma = (sse / dof as f64).sqrt();
        if !model.sigma.is_finite() {
            return Err(LedgerError::ForecastError(
                "residual variance is not finite".to_string(),
            ));
        }

        let mut unit = vec![0.0; penalized.len()];
        unit[1] = 1.0;
        let inverse_column = solve_linear_system(penalized, unit).ok_or_else(|| {
            LedgerError::ForecastError("trend design matrix is singular".to_string())
        })?;
        model.slope_se = (model.sigma.powi(2) * inverse_column[1].max(0.0)).sqrt();

        Ok(model)
    }
}

/// Solves `(XᵀX + λD) β = Xᵀy`, where `D` penalizes columns from `penalize_from` onwards.
/// Returns the coefficients and the penalized normal matrix.
fn ridge(
    rows: &[Vec<f64>],
    targets: &[f64],
    penalize_from: usize,
) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut normal_matrix = vec![vec![0.0; width]; width];
    let mut rhs = vec![0.0; width];
    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..width {
            rhs[i] += row[i] * y;
            for j in 0..width {
                normal_matrix[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, row) in normal_matrix.iter_mut().enumerate().skip(penalize_from) {
        row[i] += SEASONAL_RIDGE;
    }

    let beta = solve_linear_system(normal_matrix.clone(), rhs).ok_or_else(|| {
        LedgerError::ForecastError("design matrix is singular; cannot fit the model".to_string())
    })?;
    Ok((beta, normal_matrix))
}

fn normal(std_dev: f64) -> Result<Option<Normal<f64>>> {
    if std_dev <= 0.0 {
        return Ok(None);
    }
    Normal::new(0.0, std_dev)
        .map(Some)
        .map_err(|e| LedgerError::ForecastError(format!("invalid uncertainty scale: {}", e)))
}

/// Average monthly net spend over the trailing `window_months` months.
///
/// The series is rolled up to months first. Totals are averaged with their sign, so a
/// positive burn rate is a net outflow. Fewer months than the window uses every month.
pub fn burn_rate(series: &TimeSeries, window_months: usize) -> f64 {
    let monthly = series.to_monthly().values();
    if monthly.is_empty() || window_months == 0 {
        return 0.0;
    }
    let window = window_months.min(monthly.len());
    let recent = &monthly[monthly.len() - window..];
    recent.iter().sum::<f64>() / window as f64
}

/// Months of cash left at the current burn rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Runway {
    Months(f64),
    /// Not burning cash
    Infinite,
}

impl Runway {
    pub fn months(&self) -> Option<f64> {
        match self {
            Self::Months(months) => Some(*months),
            Self::Infinite => None,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Months(months) => write!(f, "{:.1} months", months),
            Self::Infinite => f.write_str("infinite"),
        }
    }
}

pub fn runway(cash: f64, burn_rate: f64) -> Runway {
    if burn_rate > 0.0 && burn_rate.is_finite() {
        Runway::Months(cash / burn_rate)
    } else {
        Runway::Infinite
    }
}

/// Fit quality of the in-sample forecast against observed buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Compares observed buckets with the forecast for the same dates.
/// `None` when no dates overlap.
pub fn evaluate_forecast(
    series: &TimeSeries,
    points: &[ForecastPoint],
) -> Option<ForecastAccuracy> {
    let pairs: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| series.points.get(&p.date).map(|&a| (a, p.predicted_amount)))
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let n = pairs.len() as f64;
    let mae = pairs.iter().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let ss_res: f64 = pairs.iter().map(|(a, p)| (a - p).powi(2)).sum();
    let rmse = (ss_res / n).sqrt();
    let actual_mean = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let ss_tot: f64 = pairs.iter().map(|(a, _)| (a - actual_mean).powi(2)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res <= f64::EPSILON {
        1.0
    } else {
        0.0
    };

    Some(ForecastAccuracy { mae, rmse, r2 })
}

/// Where the forecast ends relative to the last observed bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastOutlook {
    pub last_actual: f64,
    pub last_forecast: f64,
    /// `None` when the last actual is zero
    pub change_percent: Option<f64>,
}

impl ForecastOutlook {
    pub fn from_forecast(series: &TimeSeries, points: &[ForecastPoint]) -> Option<Self> {
        let last_actual = series.last_value()?;
        let last_forecast = points
            .iter()
            .rev()
            .find(|p| p.is_prediction)?
            .predicted_amount;
        let change_percent = (last_actual != 0.0)
            .then(|| (last_forecast - last_actual) / last_actual.abs() * 100.0);

        Some(Self {
            last_actual,
            last_forecast,
            change_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Transaction, TransactionType};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(values: &[f64]) -> TimeSeries {
        TimeSeries::from_points(
            Granularity::Month,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (ymd(2023, 1, 1) + chrono::Months::new(i as u32), v)),
        )
    }

    #[test]
    fn test_aggregate_fills_gaps() {
        let ledger = Ledger::from_transactions(vec![
            Transaction::new("a", ymd(2024, 1, 10), 100.0, "Rent"),
            Transaction::new("b", ymd(2024, 1, 25), 50.0, "Rent"),
            Transaction::new("c", ymd(2024, 3, 2), 70.0, "Rent"),
        ]);
        let series = aggregate(&ledger, Granularity::Month);
        assert_eq!(series.values(), vec![150.0, 0.0, 70.0]);
        assert_eq!(series.first_bucket(), Some(ymd(2024, 1, 1)));
    }

    #[test]
    fn test_aggregate_honours_explicit_type() {
        let mut rows = Vec::new();
        for month in [1, 2] {
            rows.push(
                Transaction::new(format!("e{}", month), ymd(2024, month, 3), 1000.0, "Rent")
                    .with_type(TransactionType::Expense),
            );
            rows.push(
                Transaction::new(format!("i{}", month), ymd(2024, month, 9), 3000.0, "Sales")
                    .with_type(TransactionType::Income),
            );
        }
        let series = aggregate(&Ledger::from_transactions(rows), Granularity::Month);
        assert_eq!(series.values(), vec![-2000.0, -2000.0]);

        let burn = burn_rate(&series, 3);
        assert_eq!(burn, -2000.0);
        assert_eq!(runway(10_000.0, burn), Runway::Infinite);
    }

    #[test]
    fn test_weekly_buckets_start_on_monday() {
        let ledger = Ledger::from_transactions(vec![
            Transaction::new("a", ymd(2024, 3, 14), 10.0, "X"),
            Transaction::new("b", ymd(2024, 3, 17), 5.0, "X"),
            Transaction::new("c", ymd(2024, 3, 18), 1.0, "X"),
        ]);
        let series = aggregate(&ledger, Granularity::Week);
        assert_eq!(series.points.get(&ymd(2024, 3, 11)), Some(&15.0));
        assert_eq!(series.points.get(&ymd(2024, 3, 18)), Some(&1.0));
    }

    #[test]
    fn test_empty_series_empty_forecast() {
        let forecaster = Forecaster::new(&AnalysisConfig::default());
        let series = aggregate(&Ledger::default(), Granularity::Month);
        assert!(forecaster.forecast(&series, 3).unwrap().is_empty());
    }

    #[test]
    fn test_single_bucket_is_forecast_error() {
        let forecaster = Forecaster::new(&AnalysisConfig::default());
        let result = forecaster.forecast(&monthly(&[500.0]), 3);
        assert!(matches!(result, Err(LedgerError::ForecastError(_))));
    }

    #[test]
    fn test_constant_history_forecasts_constant() {
        let series = monthly(&[1000.0; 12]);
        let points = Forecaster::new(&AnalysisConfig::default())
            .forecast(&series, 3)
            .unwrap();
        assert_eq!(points.len(), 15);
        let future: Vec<&ForecastPoint> = points.iter().filter(|p| p.is_prediction).collect();
        assert_eq!(future.len(), 3);
        assert_eq!(future[0].date, ymd(2024, 1, 1));
        for point in future {
            assert!((point.predicted_amount - 1000.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_trend_is_extrapolated() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        let points = Forecaster::new(&AnalysisConfig::default())
            .forecast(&monthly(&values), 2)
            .unwrap();
        let last = points.last().unwrap();
        assert!(last.is_prediction);
        assert!(last.predicted_amount > 200.0 && last.predicted_amount < 230.0);
    }

    #[test]
    fn test_bounds_contain_prediction() {
        let values = [1200.0, 800.0, 1500.0, 900.0, 1100.0, 1700.0, 600.0, 1300.0];
        let points = Forecaster::new(&AnalysisConfig::default())
            .forecast(&monthly(&values), 4)
            .unwrap();
        for point in &points {
            assert!(point.lower_bound <= point.predicted_amount);
            assert!(point.predicted_amount <= point.upper_bound);
        }
        let last = points.last().unwrap();
        assert!(last.upper_bound > last.lower_bound);
    }

    #[test]
    fn test_daily_series_with_weekly_seasonality() {
        let start = ymd(2024, 1, 1);
        let series = TimeSeries::from_points(
            Granularity::Day,
            (0..56u64).map(|i| {
                let weekend = i % 7 >= 5;
                (start + chrono::Days::new(i), if weekend { 20.0 } else { 100.0 })
            }),
        );
        let config = AnalysisConfig {
            granularity: Granularity::Day,
            ..AnalysisConfig::default()
        };
        let points = Forecaster::new(&config).forecast(&series, 7).unwrap();
        let future: Vec<&ForecastPoint> = points.iter().filter(|p| p.is_prediction).collect();
        assert_eq!(future.len(), 7);
        // 2024-02-26 is a Monday, 2024-03-02 a Saturday
        assert!(future[0].predicted_amount > future[5].predicted_amount);
    }

    #[test]
    fn test_multiplicative_mode_runs() {
        let start = ymd(2024, 1, 1);
        let series = TimeSeries::from_points(
            Granularity::Day,
            (0..28u64).map(|i| (start + chrono::Days::new(i), 50.0 + (i % 7) as f64)),
        );
        let config = AnalysisConfig {
            granularity: Granularity::Day,
            seasonality_mode: SeasonalityMode::Multiplicative,
            ..AnalysisConfig::default()
        };
        let points = Forecaster::new(&config).forecast(&series, 7).unwrap();
        assert_eq!(points.len(), 35);
        assert!(points.iter().all(|p| p.predicted_amount.is_finite()));
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let values = [10.0, 14.0, 9.0, 20.0, 13.0];
        let forecaster = Forecaster::new(&AnalysisConfig::default());
        let a = forecaster.forecast(&monthly(&values), 3).unwrap();
        let b = forecaster.forecast(&monthly(&values), 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_burn_rate_uses_trailing_window() {
        let series = monthly(&[5000.0, 1000.0, 2000.0, 3000.0]);
        assert_eq!(burn_rate(&series, 3), 2000.0);
        assert_eq!(burn_rate(&series, 6), 2750.0);
        assert_eq!(burn_rate(&monthly(&[]), 3), 0.0);
    }

    #[test]
    fn test_burn_rate_rolls_daily_up_to_months() {
        let series = TimeSeries::from_points(
            Granularity::Day,
            vec![
                (ymd(2024, 1, 5), 300.0),
                (ymd(2024, 1, 20), 100.0),
                (ymd(2024, 2, 3), 200.0),
            ],
        );
        assert_eq!(burn_rate(&series, 3), 300.0);
    }

    #[test]
    fn test_runway() {
        assert_eq!(runway(12_000.0, 1000.0), Runway::Months(12.0));
        assert_eq!(runway(12_000.0, 0.0), Runway::Infinite);
        assert_eq!(runway(12_000.0, -250.0), Runway::Infinite);
        assert_eq!(Runway::Infinite.to_string(), "infinite");
        assert_eq!(Runway::Months(2.5).months(), Some(2.5));
    }

    #[test]
    fn test_evaluate_forecast() {
        let series = monthly(&[10.0, 20.0, 30.0]);
        let points: Vec<ForecastPoint> = [12.0, 18.0, 30.0]
            .iter()
            .zip(series.points.keys())
            .map(|(&p, &date)| ForecastPoint {
                date,
                predicted_amount: p,
                lower_bound: p,
                upper_bound: p,
                is_prediction: false,
            })
            .collect();
        let accuracy = evaluate_forecast(&series, &points).unwrap();
        assert!((accuracy.mae - 4.0 / 3.0).abs() < 1e-12);
        assert!((accuracy.rmse - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((accuracy.r2 - 0.96).abs() < 1e-12);
        assert!(evaluate_forecast(&series, &[]).is_none());
    }

    #[test]
    fn test_outlook() {
        let series = monthly(&[100.0, 100.0, 200.0]);
        let points = Forecaster::new(&AnalysisConfig::default())
            .forecast(&series, 1)
            .unwrap();
        let outlook = ForecastOutlook::from_forecast(&series, &points).unwrap();
        assert_eq!(outlook.last_actual, 200.0);
        assert!(outlook.change_percent.is_some());
    }
}
