use polars::df;
use polars::prelude::NamedFrom;
use pretty_assertions::assert_eq;
use roas_forecast::data::{predicted_roas_column, roas_column, sessions_column};
use roas_forecast::{CohortData, FeatureSelector, RoasError};

fn full_horizon_frame() -> CohortData {
    let df = df!(
        "Cohort Day" => &["2024-03-01", "2024-03-02"],
        "Media Source" => &["organic", "adnet"],
        "Users" => &[100.0, 200.0],
        "Average eCPI" => &[1.5, 2.0],
        "roas - Rate - day 0" => &[5.0, 6.0],
        "roas - Rate - day 1" => &[10.0, 12.0],
        "roas - Rate - day 2" => &[15.0, 18.0],
        "roas - Rate - day 3" => &[20.0, 24.0],
        "roas - Rate - day 7" => &[30.0, 36.0],
        "roas - Rate - day 15" => &[45.0, 54.0],
        "roas - Rate - day 30" => &[60.0, 72.0],
        "roas - Rate - day 60" => &[80.0, 96.0],
        "sessions - Unique users - day 1" => &[90.0, 180.0],
        "sessions - Unique users - day 2" => &[70.0, 140.0],
        "sessions - Unique users - day 3" => &[50.0, 100.0],
    )
    .unwrap();
    CohortData::new(df)
}

#[test]
fn test_select_excludes_identifiers_and_future_roas() {
    let data = full_horizon_frame();
    let selected = FeatureSelector::select(&data, 3).unwrap();

    assert_eq!(
        selected,
        vec![
            "Users".to_string(),
            "Average eCPI".to_string(),
            roas_column(0),
            roas_column(1),
            roas_column(2),
            roas_column(3),
            sessions_column(1),
            sessions_column(2),
            sessions_column(3),
        ]
    );
}

#[test]
fn test_select_keeps_all_observed_roas_at_full_horizon() {
    let data = full_horizon_frame();
    let selected = FeatureSelector::select(&data, 60).unwrap();

    assert!(selected.contains(&roas_column(60)));
    assert!(!selected.contains(&"Cohort Day".to_string()));
    assert!(!selected.contains(&"Media Source".to_string()));
}

#[test]
fn test_select_excludes_appended_prediction_columns() {
    let mut data = full_horizon_frame();
    data.append_column(&predicted_roas_column(60), vec![Some(1.0), Some(2.0)])
        .unwrap();
    data.append_column("Predicted Break-even Day", vec![Some(3.0), Some(4.0)])
        .unwrap();

    let selected = FeatureSelector::select(&data, 60).unwrap();
    assert!(!selected.contains(&predicted_roas_column(60)));
    assert!(!selected.contains(&"Predicted Break-even Day".to_string()));
}

#[test]
fn test_break_even_selection_matches_plain_selection_when_complete() {
    let data = full_horizon_frame();
    let plain = FeatureSelector::select(&data, 7).unwrap();
    let break_even = FeatureSelector::select_break_even(&data, 7).unwrap();
    assert_eq!(break_even, plain);
}

#[test]
fn test_break_even_selection_names_every_missing_column() {
    let df = df!(
        "Users" => &[100.0, 200.0],
        "Average eCPI" => &[1.5, 2.0],
        "roas - Rate - day 1" => &[10.0, 12.0],
        "roas - Rate - day 2" => &[15.0, 18.0],
        "roas - Rate - day 3" => &[20.0, 24.0],
        "roas - Rate - day 7" => &[30.0, 36.0],
        "sessions - Unique users - day 1" => &[90.0, 180.0],
        "sessions - Unique users - day 2" => &[70.0, 140.0],
    )
    .unwrap();
    let data = CohortData::new(df);

    match FeatureSelector::select_break_even(&data, 7).unwrap_err() {
        RoasError::MissingFeature { columns } => {
            assert_eq!(columns, vec![roas_column(0), sessions_column(3)]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
