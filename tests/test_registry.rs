use roas_forecast::{FeatureMatrix, LinearPredictor, ModelKey, ModelRegistry, Predictor, RoasError};
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn matrix(columns: &[&str], rows: Vec<Vec<f64>>) -> FeatureMatrix {
    FeatureMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

#[test]
fn test_register_and_get() {
    let mut registry = ModelRegistry::new();
    assert!(registry.is_empty());

    let key = ModelKey::roas(3, 7);
    registry.register(key, Arc::new(LinearPredictor::new("m", 1.0, BTreeMap::new())));

    assert_eq!(registry.len(), 1);
    assert!(registry.get(&key).is_some());
    // A miss is a valid outcome, not an error
    assert!(registry.get(&ModelKey::roas(3, 15)).is_none());

    let err = registry.require(&ModelKey::roas(3, 15)).unwrap_err();
    assert!(matches!(err, RoasError::ModelNotFound(_)));
    assert!(err.to_string().contains("D3_D15"));
}

#[test]
fn test_linear_predictor_weights_named_columns() {
    let coefficients = BTreeMap::from([("roas - Rate - day 3".to_string(), 2.0)]);
    let model = LinearPredictor::new("d7", 10.0, coefficients);

    // Column order in the matrix must not matter
    let features = matrix(
        &["Users", "roas - Rate - day 3"],
        vec![vec![100.0, 50.0], vec![200.0, 30.0]],
    );
    let predictions = model.predict(&features).unwrap();
    assert_eq!(predictions, vec![110.0, 70.0]);
}

#[test]
fn test_linear_predictor_constant_when_no_coefficients() {
    let model = LinearPredictor::new("const", 42.0, BTreeMap::new());
    let features = matrix(&["Users"], vec![vec![1.0], vec![2.0], vec![3.0]]);
    assert_eq!(model.predict(&features).unwrap(), vec![42.0; 3]);
}

#[test]
fn test_linear_predictor_reports_every_missing_column() {
    let coefficients = BTreeMap::from([
        ("roas - Rate - day 3".to_string(), 1.0),
        ("sessions - Unique users - day 1".to_string(), 0.5),
    ]);
    let model = LinearPredictor::new("bed", 0.0, coefficients);

    let features = matrix(&["Users"], vec![vec![100.0]]);
    match model.predict(&features).unwrap_err() {
        RoasError::MissingFeature { columns } => {
            assert_eq!(
                columns,
                vec![
                    "roas - Rate - day 3".to_string(),
                    "sessions - Unique users - day 1".to_string(),
                ]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_dir_reads_artifacts() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("roas_d3_d7.json"),
        r#"{"key":"D3_D7","name":"ROAS D7","intercept":120.0,"coefficients":{"roas - Rate - day 3":1.0}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("bed_d7.json"),
        r#"{"key":"D7_BREAK_EVEN","intercept":9.5,"coefficients":{}}"#,
    )
    .unwrap();
    // Non-JSON files are ignored
    fs::write(dir.path().join("README.txt"), "model artifacts").unwrap();

    let registry = ModelRegistry::load_dir(dir.path()).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.keys(),
        vec![ModelKey::roas(3, 7), ModelKey::break_even(7)]
    );

    let model = registry.get(&ModelKey::roas(3, 7)).unwrap();
    assert_eq!(model.name(), "ROAS D7");

    // Artifact without a name falls back to its key
    let bed = registry.get(&ModelKey::break_even(7)).unwrap();
    assert_eq!(bed.name(), "D7_BREAK_EVEN");
}

#[test]
fn test_load_dir_rejects_bad_key() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("bad.json"),
        r#"{"key":"3_7","intercept":0.0,"coefficients":{}}"#,
    )
    .unwrap();

    assert!(ModelRegistry::load_dir(dir.path()).is_err());
}
