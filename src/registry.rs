//! Model registry: keys, predictor artifacts, and lookup

use crate::error::{Result, RoasError};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// What a predictor forecasts: a ROAS rate for a future day, or the break-even day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredictionTarget {
    /// ROAS rate at the given elapsed day
    Roas(u32),
    /// Day on which cumulative revenue covers acquisition cost
    BreakEven,
}

/// Identifies one pre-trained model by its observation window and target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey {
    /// Latest elapsed day with observed ROAS in the input
    pub source_day: u32,
    /// What the model predicts
    pub target: PredictionTarget,
}

impl ModelKey {
    /// Key for a ROAS model predicting `target_day` from `source_day` observations
    pub fn roas(source_day: u32, target_day: u32) -> Self {
        Self {
            source_day,
            target: PredictionTarget::Roas(target_day),
        }
    }

    /// Key for a break-even model predicting from `source_day` observations
    pub fn break_even(source_day: u32) -> Self {
        Self {
            source_day,
            target: PredictionTarget::BreakEven,
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            PredictionTarget::Roas(day) => write!(f, "D{}_D{}", self.source_day, day),
            PredictionTarget::BreakEven => write!(f, "D{}_BREAK_EVEN", self.source_day),
        }
    }
}

impl FromStr for ModelKey {
    type Err = RoasError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RoasError::Data(format!("invalid model key '{s}'"));

        let rest = s.strip_prefix('D').ok_or_else(invalid)?;
        let (source, target) = rest.split_once('_').ok_or_else(invalid)?;
        let source_day = source.parse().map_err(|_| invalid())?;

        let target = if target == "BREAK_EVEN" {
            PredictionTarget::BreakEven
        } else {
            let day = target.strip_prefix('D').ok_or_else(invalid)?;
            PredictionTarget::Roas(day.parse().map_err(|_| invalid())?)
        };

        Ok(Self { source_day, target })
    }
}

/// Ordered per-row feature values handed to a predictor
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Column names, in the order the row values are laid out
    pub columns: Vec<String>,
    /// One feature vector per input row
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Position of a named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pre-trained regression model: one output per input row
pub trait Predictor: fmt::Debug + Send + Sync {
    /// Run the model over every row of the feature matrix
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Linear regression predictor with coefficients keyed by feature column name.
///
/// Keying by name makes the output independent of the column order in the
/// incoming matrix; an order-sensitive external predictor can instead reorder
/// by the `FeatureMatrix::columns` it receives.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    name: String,
    intercept: f64,
    coefficients: BTreeMap<String, f64>,
}

impl LinearPredictor {
    /// Create a predictor from an intercept and named coefficients.
    /// With no coefficients the output is the constant intercept.
    pub fn new(
        name: impl Into<String>,
        intercept: f64,
        coefficients: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            name: name.into(),
            intercept,
            coefficients,
        }
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let mut terms = Vec::with_capacity(self.coefficients.len());
        let mut missing = Vec::new();
        for (column, &weight) in &self.coefficients {
            match features.column_index(column) {
                Some(index) => terms.push((index, weight)),
                None => missing.push(column.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(RoasError::MissingFeature { columns: missing });
        }

        Ok(features
            .rows
            .iter()
            .map(|row| {
                self.intercept
                    + terms
                        .iter()
                        .map(|&(index, weight)| weight * row[index])
                        .sum::<f64>()
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Serialized form of a linear predictor artifact
#[derive(Debug, Deserialize)]
struct PredictorArtifact {
    key: String,
    name: Option<String>,
    intercept: f64,
    coefficients: BTreeMap<String, f64>,
}

impl PredictorArtifact {
    fn into_parts(self) -> Result<(ModelKey, LinearPredictor)> {
        let key: ModelKey = self.key.parse()?;
        let name = self.name.unwrap_or_else(|| self.key.clone());
        Ok((
            key,
            LinearPredictor::new(name, self.intercept, self.coefficients),
        ))
    }
}

/// Registry mapping model keys to shared, read-only predictors.
///
/// Built once at startup and passed by reference into the dispatcher; a lookup
/// miss is a valid outcome the caller handles, never a panic.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<ModelKey, Arc<dyn Predictor>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predictor under a key, replacing any previous entry
    pub fn register(&mut self, key: ModelKey, predictor: Arc<dyn Predictor>) {
        self.models.insert(key, predictor);
    }

    /// Look up the predictor for a key
    pub fn get(&self, key: &ModelKey) -> Option<Arc<dyn Predictor>> {
        self.models.get(key).cloned()
    }

    /// Look up a predictor that must exist, turning a miss into an error
    pub fn require(&self, key: &ModelKey) -> Result<Arc<dyn Predictor>> {
        self.get(key).ok_or(RoasError::ModelNotFound(*key))
    }

    /// Number of registered predictors
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the registry holds no predictors
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<ModelKey> {
        let mut keys: Vec<ModelKey> = self.models.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Load every `*.json` predictor artifact in a directory.
    /// Each artifact names its own key, e.g. `D3_D7` or `D7_BREAK_EVEN`.
    pub fn load_dir<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut registry = Self::new();
        for entry in std::fs::read_dir(path)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let file = File::open(&path)?;
                let artifact: PredictorArtifact = serde_json::from_reader(BufReader::new(file))?;
                let (key, predictor) = artifact.into_parts()?;
                registry.register(key, Arc::new(predictor));
            }
        }
        info!(models = registry.len(), "loaded model registry");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_key_round_trips_through_display() {
        for key in [
            ModelKey::roas(3, 7),
            ModelKey::roas(15, 60),
            ModelKey::break_even(7),
        ] {
            assert_eq!(key.to_string().parse::<ModelKey>().unwrap(), key);
        }
    }

    #[test]
    fn model_key_rejects_malformed_input() {
        for bad in ["", "3_7", "D3", "D3_X7", "DX_D7", "D3-D7"] {
            assert!(bad.parse::<ModelKey>().is_err(), "parsed '{bad}'");
        }
    }
}
