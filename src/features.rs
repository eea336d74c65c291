//! Feature selection: exclusion-rule column subsetting per prediction target

use crate::data::{
    roas_column, sessions_column, CohortData, COL_COHORT_DAY, COL_MEDIA_SOURCE,
    COL_PREDICTED_BREAK_EVEN, PREDICTED_ROAS_PREFIX, ROAS_DAYS, SESSION_DAYS,
};
use crate::error::{Result, RoasError};

/// Derives the feature-column subset a predictor receives
#[derive(Debug)]
pub struct FeatureSelector;

impl FeatureSelector {
    /// Feature columns for a ROAS prediction from `source_day` observations:
    /// every column except the identifier columns, any ROAS column beyond the
    /// observation window (those would leak the target), and any column a
    /// previous cascade step appended. Order follows the input table.
    pub fn select(data: &CohortData, source_day: u32) -> Result<Vec<String>> {
        let leaking: Vec<String> = ROAS_DAYS
            .iter()
            .filter(|&&day| day > source_day)
            .map(|&day| roas_column(day))
            .collect();

        Ok(data
            .column_names()
            .into_iter()
            .filter(|name| {
                name != COL_COHORT_DAY
                    && name != COL_MEDIA_SOURCE
                    && name != COL_PREDICTED_BREAK_EVEN
                    && !name.starts_with(PREDICTED_ROAS_PREFIX)
                    && !leaking.contains(name)
            })
            .collect())
    }

    /// Feature columns for break-even prediction. Same exclusion rule, but the
    /// observed ROAS columns up to `source_day` and the unique-sessions
    /// columns are required; absence of any is a per-target failure naming
    /// every missing column.
    pub fn select_break_even(data: &CohortData, source_day: u32) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for &day in ROAS_DAYS.iter().filter(|&&day| day <= source_day) {
            let column = roas_column(day);
            if !data.has_column(&column) {
                missing.push(column);
            }
        }
        for &day in &SESSION_DAYS {
            let column = sessions_column(day);
            if !data.has_column(&column) {
                missing.push(column);
            }
        }
        if !missing.is_empty() {
            return Err(RoasError::MissingFeature { columns: missing });
        }

        Self::select(data, source_day)
    }
}
