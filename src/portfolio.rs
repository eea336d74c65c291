//! Portfolio-level aggregation of per-row predictions

use crate::data::{predicted_roas_column, CohortData, COL_ECPI, COL_PREDICTED_BREAK_EVEN, COL_USERS};
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Spend-weighted portfolio metrics over the predicted targets.
///
/// ROAS values are held as fractions of one (1.5 = 150%); the input CSV
/// stores percentages and the aggregator divides by 100 exactly once.
/// `Display` re-scales to percent for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    /// Spend-weighted mean predicted ROAS per target day, as a fraction of one.
    /// A day with no prediction column has no entry; absence means "not
    /// attempted", which is distinct from an attempted result of zero.
    pub roas_by_day: BTreeMap<u32, f64>,
    /// Largest predicted break-even day across the portfolio. The portfolio
    /// has broken even only once every cohort has, hence max rather than mean.
    pub max_break_even_day: Option<u32>,
    /// Earliest and latest cohort date in the working set
    pub cohort_range: Option<(NaiveDate, NaiveDate)>,
}

/// Combine per-row predictions into a portfolio summary.
///
/// For each predicted day the mean is weighted by cohort spend
/// (eCPI x users); both the numerator and the weight sum range only over rows
/// carrying a non-null prediction for that day.
pub fn aggregate(data: &CohortData, predicted_days: &[u32]) -> Result<PortfolioSummary> {
    let users = data.column_as_f64(COL_USERS)?;
    let ecpi = data.column_as_f64(COL_ECPI)?;

    let mut roas_by_day = BTreeMap::new();
    for &day in predicted_days {
        let column = predicted_roas_column(day);
        if !data.has_column(&column) {
            continue;
        }
        let predictions = data.column_as_f64(&column)?;

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for ((prediction, users), ecpi) in predictions.iter().zip(&users).zip(&ecpi) {
            if let (Some(prediction), Some(users), Some(ecpi)) = (prediction, users, ecpi) {
                let weight = ecpi * users;
                weighted_sum += prediction * weight;
                weight_total += weight;
            }
        }
        if weight_total > 0.0 {
            roas_by_day.insert(day, weighted_sum / weight_total / 100.0);
        }
    }

    let max_break_even_day = if data.has_column(COL_PREDICTED_BREAK_EVEN) {
        data.column_as_f64(COL_PREDICTED_BREAK_EVEN)?
            .into_iter()
            .flatten()
            .fold(None, |max: Option<f64>, day| {
                Some(max.map_or(day, |m| m.max(day)))
            })
            .map(|day| day as u32)
    } else {
        None
    };

    Ok(PortfolioSummary {
        roas_by_day,
        max_break_even_day,
        cohort_range: data.cohort_date_range(),
    })
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Portfolio summary:")?;
        if let Some((start, end)) = self.cohort_range {
            writeln!(f, "  Cohort range: {start} to {end}")?;
        }
        for (day, roas) in &self.roas_by_day {
            writeln!(f, "  Predicted ROAS day {day}: {:.4}%", roas * 100.0)?;
        }
        if let Some(day) = self.max_break_even_day {
            writeln!(f, "  Predicted break-even day (max): {day}")?;
        }
        Ok(())
    }
}
