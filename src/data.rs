//! Cohort table handling: CSV loading, preprocessing, column access

use crate::error::{Result, RoasError};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Column holding the cohort start date
pub const COL_COHORT_DAY: &str = "Cohort Day";
/// Column holding the acquisition channel identifier
pub const COL_MEDIA_SOURCE: &str = "Media Source";
/// Column holding the cohort user count
pub const COL_USERS: &str = "Users";
/// Column holding the average effective cost per install
pub const COL_ECPI: &str = "Average eCPI";
/// Column appended with the predicted break-even day
pub const COL_PREDICTED_BREAK_EVEN: &str = "Predicted Break-even Day";

/// Prefix of appended ROAS prediction columns
pub const PREDICTED_ROAS_PREFIX: &str = "Predicted ROAS day ";

/// Elapsed days for which a ROAS rate column may exist
pub const ROAS_DAYS: [u32; 8] = [0, 1, 2, 3, 7, 15, 30, 60];
/// Elapsed days for which a unique-sessions column may exist
pub const SESSION_DAYS: [u32; 3] = [1, 2, 3];

/// Minimum cohort size for a row to participate in prediction
pub const MIN_COHORT_USERS: f64 = 50.0;

/// Name of the ROAS rate column for an elapsed day
pub fn roas_column(day: u32) -> String {
    format!("roas - Rate - day {day}")
}

/// Name of the unique-sessions column for an elapsed day
pub fn sessions_column(day: u32) -> String {
    format!("sessions - Unique users - day {day}")
}

/// Name of the appended ROAS prediction column for a target day
pub fn predicted_roas_column(day: u32) -> String {
    format!("{PREDICTED_ROAS_PREFIX}{day}")
}

/// Loader for cohort performance tables
#[derive(Debug)]
pub struct CohortLoader;

impl CohortLoader {
    /// Load cohort data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<CohortData> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(CohortData::new(df))
    }

    /// Create cohort data from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> CohortData {
        CohortData::new(df)
    }
}

/// One cohort performance table: a row per (cohort date, channel) pair
#[derive(Debug, Clone)]
pub struct CohortData {
    df: DataFrame,
}

impl CohortData {
    /// Wrap an existing DataFrame
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Get the underlying DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| *c == name)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Verify that the user count and cost columns are present
    pub fn validate_mandatory(&self) -> Result<()> {
        for col in [COL_USERS, COL_ECPI] {
            if !self.has_column(col) {
                return Err(RoasError::MissingMandatoryColumn(format!(
                    "column '{col}' not found"
                )));
            }
        }
        Ok(())
    }

    /// Build the working set: rows with a zero or missing value in any numeric
    /// column are dropped, as are cohorts below the minimum user count.
    pub fn preprocess(self) -> Result<Self> {
        self.validate_mandatory()?;

        let mut keep = vec![true; self.df.height()];
        for col in self.df.get_columns() {
            if !col.dtype().is_numeric() {
                continue;
            }
            let cast = col.cast(&DataType::Float64)?;
            for (i, value) in cast.f64()?.into_iter().enumerate() {
                match value {
                    Some(v) if v != 0.0 => {}
                    _ => keep[i] = false,
                }
            }
        }

        let users = self.df.column(COL_USERS)?.cast(&DataType::Float64)?;
        for (i, value) in users.f64()?.into_iter().enumerate() {
            if !matches!(value, Some(v) if v >= MIN_COHORT_USERS) {
                keep[i] = false;
            }
        }

        let mask = BooleanChunked::from_slice("keep", &keep);
        let df = self.df.filter(&mask)?;
        if df.height() == 0 {
            return Err(RoasError::MissingMandatoryColumn(format!(
                "no cohorts with at least {MIN_COHORT_USERS} users remain after preprocessing"
            )));
        }

        Ok(Self { df })
    }

    /// Get a column as f64 values, preserving nulls
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self
            .df
            .column(name)
            .map_err(|e| RoasError::Data(format!("column '{name}' not found: {e}")))?;
        let cast = col
            .cast(&DataType::Float64)
            .map_err(|_| RoasError::Data(format!("column '{name}' cannot be read as f64")))?;

        Ok(cast.f64()?.into_iter().collect())
    }

    /// Append a derived column; the value count must match the row count
    pub fn append_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.df.height() {
            return Err(RoasError::Data(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.df.height()
            )));
        }
        self.df.with_column(Series::new(name, values))?;
        Ok(())
    }

    /// Earliest and latest cohort date, when the date column is present and parseable
    pub fn cohort_date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let col = self.df.column(COL_COHORT_DAY).ok()?;
        let dates = col.utf8().ok()?;

        let mut range: Option<(NaiveDate, NaiveDate)> = None;
        for value in dates.into_iter().flatten() {
            if let Some(date) = parse_cohort_date(value) {
                range = Some(match range {
                    None => (date, date),
                    Some((min, max)) => (min.min(date), max.max(date)),
                });
            }
        }
        range
    }

    /// Write the table as CSV, original columns first, derived columns after
    pub fn write_csv<W: std::io::Write>(&mut self, writer: W) -> Result<()> {
        CsvWriter::new(writer).has_header(true).finish(&mut self.df)?;
        Ok(())
    }

    /// Write the table as CSV to a file path
    pub fn write_csv_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

fn parse_cohort_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}
