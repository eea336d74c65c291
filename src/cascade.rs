//! Cascade dispatcher: horizon detection, per-target prediction, break-even

use crate::data::{
    predicted_roas_column, roas_column, CohortData, COL_PREDICTED_BREAK_EVEN,
};
use crate::error::{Result, RoasError};
use crate::features::FeatureSelector;
use crate::portfolio::{aggregate, PortfolioSummary};
use crate::registry::{FeatureMatrix, ModelKey, ModelRegistry};
use std::fmt;
use tracing::{info, warn};

/// ROAS milestones, in observation order. The latest one present in the input
/// is the observation horizon; everything beyond it is a prediction target.
pub const ROAS_MILESTONES: [u32; 5] = [3, 7, 15, 30, 60];

/// Break-even prediction needs at least this much observed history.
/// Below day 7 the estimate is considered too unreliable to report.
pub const BREAK_EVEN_MIN_SOURCE_DAY: u32 = 7;

/// Recoverable condition raised while running the cascade. Each warning maps
/// to one skipped step; the rest of the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeWarning {
    /// No predictor registered for a target's key
    ModelNotFound {
        /// The unresolved key
        key: ModelKey,
    },
    /// Feature columns a target's predictor needs are absent
    MissingFeature {
        /// The affected key
        key: ModelKey,
        /// The absent columns
        columns: Vec<String>,
    },
    /// Break-even prediction skipped: observed history ends before day 7.
    /// Informational, not an error.
    BreakEvenSkipped {
        /// The detected observation horizon
        last_day: u32,
    },
}

impl fmt::Display for CascadeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeWarning::ModelNotFound { key } => {
                write!(f, "no model found for {key}; target skipped")
            }
            CascadeWarning::MissingFeature { key, columns } => {
                write!(
                    f,
                    "{key} skipped, missing feature column(s): {}",
                    columns.join(", ")
                )
            }
            CascadeWarning::BreakEvenSkipped { last_day } => {
                write!(
                    f,
                    "last observed ROAS day is {last_day} (< {BREAK_EVEN_MIN_SOURCE_DAY}); \
                     break-even prediction skipped"
                )
            }
        }
    }
}

/// Everything one cascade run produced
#[derive(Debug)]
pub struct CascadeOutcome {
    /// The working set with prediction columns appended
    pub data: CohortData,
    /// Latest observed ROAS milestone in the input
    pub last_day: u32,
    /// Milestones the run attempted to predict, ascending
    pub targets: Vec<u32>,
    /// Milestones for which a prediction column was actually appended
    pub predicted_days: Vec<u32>,
    /// Name of the appended break-even column, when one was produced
    pub break_even_column: Option<String>,
    /// Spend-weighted portfolio metrics over the appended predictions
    pub summary: PortfolioSummary,
    /// Skipped steps, in the order they were encountered
    pub warnings: Vec<CascadeWarning>,
}

/// Runs the prediction cascade over one cohort table.
///
/// Holds a reference to an immutable registry so the same dispatcher can serve
/// sequential runs; per-run table state never leaks between invocations.
#[derive(Debug)]
pub struct CascadeDispatcher<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> CascadeDispatcher<'a> {
    /// Create a dispatcher over a registry
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Latest milestone whose ROAS column exists in the table.
    /// No milestone column at all is fatal to the run.
    pub fn detect_last_day(data: &CohortData) -> Result<u32> {
        ROAS_MILESTONES
            .iter()
            .copied()
            .filter(|&day| data.has_column(&roas_column(day)))
            .max()
            .ok_or(RoasError::NoObservationWindow)
    }

    /// Milestones beyond the observation horizon, ascending. Empty when the
    /// input already reaches the full horizon.
    pub fn prediction_targets(last_day: u32) -> Vec<u32> {
        ROAS_MILESTONES
            .iter()
            .copied()
            .filter(|&day| day > last_day)
            .collect()
    }

    /// Run the full cascade: preprocess, detect the horizon, predict each
    /// missing milestone, attempt break-even, aggregate the portfolio.
    ///
    /// Per-target lookup and feature failures degrade to warnings; only a
    /// missing observation window or missing mandatory input aborts the run.
    pub fn run(&self, data: CohortData) -> Result<CascadeOutcome> {
        let mut data = data.preprocess()?;

        let last_day = Self::detect_last_day(&data)?;
        let targets = Self::prediction_targets(last_day);
        info!(last_day, ?targets, rows = data.height(), "running prediction cascade");

        let mut warnings = Vec::new();
        let mut predicted_days = Vec::new();

        for &target in &targets {
            let key = ModelKey::roas(last_day, target);
            let Some(model) = self.registry.get(&key) else {
                warn!(%key, "no model registered; skipping target");
                warnings.push(CascadeWarning::ModelNotFound { key });
                continue;
            };

            let columns = FeatureSelector::select(&data, last_day)?;
            let matrix = build_feature_matrix(&data, &columns)?;
            match model.predict(&matrix) {
                Ok(values) => {
                    let column = predicted_roas_column(target);
                    data.append_column(&column, values.into_iter().map(Some).collect())?;
                    predicted_days.push(target);
                }
                Err(RoasError::MissingFeature { columns }) => {
                    warn!(%key, ?columns, "missing features; skipping target");
                    warnings.push(CascadeWarning::MissingFeature { key, columns });
                }
                Err(e) => return Err(e),
            }
        }

        let break_even_column =
            self.predict_break_even(&mut data, last_day, &mut warnings)?;

        let summary = aggregate(&data, &predicted_days)?;

        Ok(CascadeOutcome {
            data,
            last_day,
            targets,
            predicted_days,
            break_even_column,
            summary,
            warnings,
        })
    }

    /// Break-even step. Reported in whole days rounded up: a model output of
    /// 0.3 days becomes day 1, biasing toward the later estimate.
    fn predict_break_even(
        &self,
        data: &mut CohortData,
        last_day: u32,
        warnings: &mut Vec<CascadeWarning>,
    ) -> Result<Option<String>> {
        if last_day < BREAK_EVEN_MIN_SOURCE_DAY {
            info!(last_day, "observation window too short for break-even prediction");
            warnings.push(CascadeWarning::BreakEvenSkipped { last_day });
            return Ok(None);
        }

        let key = ModelKey::break_even(last_day);
        let Some(model) = self.registry.get(&key) else {
            warn!(%key, "no model registered; skipping break-even");
            warnings.push(CascadeWarning::ModelNotFound { key });
            return Ok(None);
        };

        let columns = match FeatureSelector::select_break_even(data, last_day) {
            Ok(columns) => columns,
            Err(RoasError::MissingFeature { columns }) => {
                warn!(%key, ?columns, "missing features; skipping break-even");
                warnings.push(CascadeWarning::MissingFeature { key, columns });
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let matrix = build_feature_matrix(data, &columns)?;
        match model.predict(&matrix) {
            Ok(values) => {
                let days = values.into_iter().map(|v| Some(v.ceil())).collect();
                data.append_column(COL_PREDICTED_BREAK_EVEN, days)?;
                Ok(Some(COL_PREDICTED_BREAK_EVEN.to_string()))
            }
            Err(RoasError::MissingFeature { columns }) => {
                warn!(%key, ?columns, "missing features; skipping break-even");
                warnings.push(CascadeWarning::MissingFeature { key, columns });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Materialize the selected columns as per-row feature vectors
fn build_feature_matrix(data: &CohortData, columns: &[String]) -> Result<FeatureMatrix> {
    let mut series = Vec::with_capacity(columns.len());
    for name in columns {
        let values: Vec<f64> = data
            .column_as_f64(name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    RoasError::Data(format!("null value in feature column '{name}' at row {row}"))
                })
            })
            .collect::<Result<_>>()?;
        series.push(values);
    }

    let rows = (0..data.height())
        .map(|row| series.iter().map(|column| column[row]).collect())
        .collect();

    Ok(FeatureMatrix {
        columns: columns.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_follow_the_observation_horizon() {
        assert_eq!(CascadeDispatcher::prediction_targets(3), vec![7, 15, 30, 60]);
        assert_eq!(CascadeDispatcher::prediction_targets(30), vec![60]);
        assert_eq!(CascadeDispatcher::prediction_targets(60), Vec::<u32>::new());
    }
}
