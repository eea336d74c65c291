//! Long-run revenue forecasting contract and cash-flow projection
//!
//! The forecasting engine itself is pluggable: anything implementing
//! [`RevenueForecaster`] (an in-crate smoother, a Prophet wrapper, a remote
//! service) can drive the projection. This module owns the arithmetic around
//! the engine: per-product series assembly and the cumulative
//! revenue-versus-cost comparison with its first-crossing break-even date.

use crate::error::{Result, RoasError};
use chrono::{Days, NaiveDate};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::path::Path;

/// Reference forecast horizon, in days
pub const DEFAULT_FORECAST_PERIODS: usize = 90;

/// One raw revenue/cost record for a product on a date
#[derive(Debug, Clone, Deserialize)]
pub struct RevenueRecord {
    /// Product the record belongs to
    pub product_name: String,
    /// Calendar date of the record
    pub date: NaiveDate,
    /// Revenue booked on the date
    pub revenue: f64,
    /// Acquisition cost spent on the date
    pub cost: f64,
}

/// Daily revenue/cost history for one product, ordered by date
#[derive(Debug, Clone)]
pub struct RevenueSeries {
    dates: Vec<NaiveDate>,
    revenue: Vec<f64>,
    cost: Vec<f64>,
}

impl RevenueSeries {
    /// Create a series from parallel vectors
    pub fn new(dates: Vec<NaiveDate>, revenue: Vec<f64>, cost: Vec<f64>) -> Result<Self> {
        if dates.len() != revenue.len() || dates.len() != cost.len() {
            return Err(RoasError::Data(format!(
                "series lengths differ: {} dates, {} revenue, {} cost",
                dates.len(),
                revenue.len(),
                cost.len()
            )));
        }
        Ok(Self {
            dates,
            revenue,
            cost,
        })
    }

    /// Build a per-date series for one product: records for other products
    /// are dropped, records sharing a date are summed.
    pub fn from_records<I>(records: I, product: &str) -> Self
    where
        I: IntoIterator<Item = RevenueRecord>,
    {
        let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
        for record in records {
            if record.product_name == product {
                let entry = by_date.entry(record.date).or_insert((0.0, 0.0));
                entry.0 += record.revenue;
                entry.1 += record.cost;
            }
        }

        let mut dates = Vec::with_capacity(by_date.len());
        let mut revenue = Vec::with_capacity(by_date.len());
        let mut cost = Vec::with_capacity(by_date.len());
        for (date, (rev, c)) in by_date {
            dates.push(date);
            revenue.push(rev);
            cost.push(c);
        }

        Self {
            dates,
            revenue,
            cost,
        }
    }

    /// Load a per-product series from a CSV with `product_name`, `date`,
    /// `revenue` and `cost` columns.
    pub fn from_csv<P: AsRef<Path>>(path: P, product: &str) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let products = df
            .column("product_name")?
            .utf8()
            .map_err(|_| RoasError::Data("'product_name' must be a string column".into()))?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        let dates = df
            .column("date")?
            .utf8()
            .map_err(|_| RoasError::Data("'date' must be a string column".into()))?
            .into_iter()
            .map(|v| {
                let v = v.unwrap_or_default();
                NaiveDate::parse_from_str(v, "%Y-%m-%d")
                    .map_err(|_| RoasError::Data(format!("unparseable date '{v}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        let revenue = column_f64(&df, "revenue")?;
        let cost = column_f64(&df, "cost")?;

        let records = products
            .into_iter()
            .zip(dates)
            .zip(revenue.into_iter().zip(cost))
            .map(|((product_name, date), (revenue, cost))| RevenueRecord {
                product_name,
                date,
                revenue,
                cost,
            });

        Ok(Self::from_records(records, product))
    }

    /// Dates of the series, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Daily revenue values
    pub fn revenue(&self) -> &[f64] {
        &self.revenue
    }

    /// Daily cost values
    pub fn cost(&self) -> &[f64] {
        &self.cost
    }

    /// Total historical revenue
    pub fn total_revenue(&self) -> f64 {
        self.revenue.iter().sum()
    }

    /// Total historical cost
    pub fn total_cost(&self) -> f64 {
        self.cost.iter().sum()
    }

    /// Last observed date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Number of observed days
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the series has no observations
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let cast = df
        .column(name)?
        .cast(&DataType::Float64)
        .map_err(|_| RoasError::Data(format!("column '{name}' cannot be read as f64")))?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Forecasting engine: one revenue point estimate per future day
pub trait RevenueForecaster: Debug {
    /// Forecast `periods` daily revenue values following the series
    fn forecast(&self, series: &RevenueSeries, periods: usize) -> Result<Vec<f64>>;

    /// Name of the engine
    fn name(&self) -> &str;
}

/// Default in-crate engine: exponential smoothing of the revenue history,
/// forecasting the fitted level flat across the horizon
#[derive(Debug, Clone)]
pub struct SmoothedRevenueForecaster {
    name: String,
    alpha: f64,
}

impl SmoothedRevenueForecaster {
    /// Create a smoothed forecaster with the given smoothing parameter
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(RoasError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Smoothed Revenue Forecaster (alpha={alpha})"),
            alpha,
        })
    }
}

impl RevenueForecaster for SmoothedRevenueForecaster {
    fn forecast(&self, series: &RevenueSeries, periods: usize) -> Result<Vec<f64>> {
        let revenue = series.revenue();
        if revenue.is_empty() {
            return Err(RoasError::Data("empty revenue series".to_string()));
        }

        let mut level = revenue[0];
        for &value in &revenue[1..] {
            level = self.alpha * value + (1.0 - self.alpha) * level;
        }

        Ok(vec![level; periods])
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cumulative revenue versus cumulative cost over the forecast horizon
#[derive(Debug, Clone)]
pub struct CashFlowProjection {
    /// Future dates, one per forecast period
    pub dates: Vec<NaiveDate>,
    /// Historical revenue total plus cumulative forecast revenue, per date
    pub cumulative_revenue: Vec<f64>,
    /// Historical cost total plus cumulative planned spend, per date
    pub cumulative_cost: Vec<f64>,
    /// First date where cumulative revenue covers cumulative cost, if reached
    pub break_even_date: Option<NaiveDate>,
}

impl CashFlowProjection {
    /// Project cash flow: the forecaster supplies future daily revenue, the
    /// caller supplies the planned daily spend. Break-even is the first
    /// crossing inside the horizon; `None` when it is not reached.
    pub fn project(
        series: &RevenueSeries,
        forecaster: &dyn RevenueForecaster,
        periods: usize,
        planned_daily_spend: f64,
    ) -> Result<Self> {
        let last_date = series
            .last_date()
            .ok_or_else(|| RoasError::Data("empty revenue series".to_string()))?;

        let forecast = forecaster.forecast(series, periods)?;
        if forecast.len() != periods {
            return Err(RoasError::Data(format!(
                "forecaster '{}' returned {} values for {periods} periods",
                forecaster.name(),
                forecast.len()
            )));
        }

        let mut dates = Vec::with_capacity(periods);
        let mut cumulative_revenue = Vec::with_capacity(periods);
        let mut cumulative_cost = Vec::with_capacity(periods);
        let mut break_even_date = None;

        let mut revenue_total = series.total_revenue();
        let cost_base = series.total_cost();
        for (period, value) in forecast.into_iter().enumerate() {
            let day = period as u64 + 1;
            let date = last_date
                .checked_add_days(Days::new(day))
                .ok_or_else(|| RoasError::Data("forecast date out of range".to_string()))?;
            revenue_total += value;
            let cost_total = cost_base + planned_daily_spend * day as f64;

            if break_even_date.is_none() && revenue_total >= cost_total {
                break_even_date = Some(date);
            }
            dates.push(date);
            cumulative_revenue.push(revenue_total);
            cumulative_cost.push(cost_total);
        }

        Ok(Self {
            dates,
            cumulative_revenue,
            cumulative_cost,
            break_even_date,
        })
    }
}
