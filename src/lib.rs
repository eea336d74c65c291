//! # ROAS Forecast
//!
//! A Rust library for marketing-cohort ROAS forecasting and cash break-even
//! estimation.
//!
//! ## Features
//!
//! - Cohort table handling (CSV loading, preprocessing, working-set rules)
//! - A model registry of pre-trained predictors keyed by observation window
//!   and target day
//! - A cascade dispatcher that detects how much observation history a table
//!   carries and predicts every missing ROAS milestone, plus break-even
//! - Spend-weighted portfolio aggregation
//! - A pluggable long-run revenue forecaster with cash-flow projection
//!
//! ## Quick Start
//!
//! ```no_run
//! use roas_forecast::{CascadeDispatcher, CohortLoader, ModelRegistry};
//!
//! fn main() -> roas_forecast::Result<()> {
//!     // Load the pre-trained model artifacts once, at startup
//!     let registry = ModelRegistry::load_dir("models")?;
//!
//!     // Load an uploaded cohort table
//!     let data = CohortLoader::from_csv("cohorts.csv")?;
//!
//!     // Predict every milestone beyond the observed horizon
//!     let outcome = CascadeDispatcher::new(&registry).run(data)?;
//!
//!     for warning in &outcome.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     println!("{}", outcome.summary);
//!     Ok(())
//! }
//! ```

pub mod cascade;
pub mod data;
pub mod error;
pub mod features;
pub mod portfolio;
pub mod registry;
pub mod revenue;

// Re-export commonly used types
pub use crate::cascade::{CascadeDispatcher, CascadeOutcome, CascadeWarning};
pub use crate::data::{CohortData, CohortLoader};
pub use crate::error::{Result, RoasError};
pub use crate::features::FeatureSelector;
pub use crate::portfolio::PortfolioSummary;
pub use crate::registry::{
    FeatureMatrix, LinearPredictor, ModelKey, ModelRegistry, PredictionTarget, Predictor,
};
pub use crate::revenue::{
    CashFlowProjection, RevenueForecaster, RevenueSeries, SmoothedRevenueForecaster,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
