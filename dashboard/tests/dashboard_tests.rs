//! Session tests over the fixture sources: load, preprocess, analyze, train
//! and predict the way the dashboard pages do.

use climate_dashboard_lib::commands;
use climate_dashboard_lib::script::{StepOutcome, load_script, run_script};
use climate_dashboard_lib::{AppState, CommandError, DashboardConfig};
use climate_processing::{MissingStrategy, RegistryConfig, SourceKind};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

const CLIMATE: &str = "District Climate";

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app_state(model_dir: &Path) -> AppState {
    let registry = RegistryConfig::builder()
        .data_dir(fixtures_path())
        .source(CLIMATE, "district_climate.csv", SourceKind::Csv)
        .source("District Boundary (GeoJSON)", "districts.geojson", SourceKind::GeoJson)
        .source("Rainfall Stations", "rainfall_stations.csv", SourceKind::Csv)
        .build()
        .unwrap();
    let config = DashboardConfig::builder()
        .registry(registry)
        .model_dir(model_dir)
        .build()
        .unwrap();
    AppState::new(config)
}

// ============================================================================
// Datasets page
// ============================================================================

#[test]
fn test_listing_shows_datasets_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let listing = commands::list_datasets(&state);

    let names: Vec<&str> = listing.datasets.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec![CLIMATE, "District Boundary (GeoJSON)"]);

    let boundary = &listing.datasets[1];
    assert_eq!(boundary.kind, "geospatial");
    assert_eq!(boundary.crs.as_deref(), Some("EPSG:4326"));
    assert_eq!(boundary.title.as_deref(), Some("Nepal's District Boundary"));

    assert_eq!(listing.failures.len(), 1);
    assert_eq!(listing.failures[0].dataset, "Rainfall Stations");
    assert_eq!(listing.failures[0].code, "LOAD_ERROR");
}

#[test]
fn test_inspect_registry_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let preview = commands::inspect_dataset(&state, CLIMATE, 3).unwrap();

    assert_eq!(preview.summary.shape_label(), "20 rows × 4 columns");
    assert_eq!(preview.summary.missing_of("Rainfall"), Some(2));
    assert_eq!(preview.rows.len(), 3);
    assert_eq!(preview.rows[1]["District"], "Jumla");
}

// ============================================================================
// Page flow
// ============================================================================

#[test]
fn test_analysis_before_preprocessing_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let err = commands::run_analysis(&state, &Default::default()).unwrap_err();
    assert!(matches!(err, CommandError::NoProcessedData));
}

#[test]
fn test_preprocess_analyze_train_predict() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());

    commands::select_dataset(&state, CLIMATE).unwrap();
    let report = commands::handle_missing(&state, CLIMATE, MissingStrategy::DropRows).unwrap();
    assert_eq!(report.after, (18, 4));
    assert!(!report.summary.has_missing());
    commands::complete_preprocessing(&state, CLIMATE).unwrap();

    let analysis = commands::run_analysis(&state, &Default::default()).unwrap();
    assert_eq!(analysis.dataset, CLIMATE);
    assert_eq!(analysis.numeric_columns, vec!["Elevation", "Rainfall", "AvgTemp"]);
    let correlation = analysis.correlation.unwrap();
    let elevation_temp = correlation.values[0][2].unwrap();
    assert!(elevation_temp < -0.9, "corr = {}", elevation_temp);

    commands::select_features(
        &state,
        CLIMATE,
        vec!["Elevation".to_string(), "Rainfall".to_string()],
        "AvgTemp",
    )
    .unwrap();
    let outcome = commands::train_model(&state, None).unwrap();
    assert_eq!(outcome.result.test_rows, 4);
    assert_eq!(outcome.result.train_rows, 14);
    assert!(outcome.result.metrics.r2 > 0.999);

    let prediction = commands::predict(
        &state,
        &HashMap::from([
            ("Elevation".to_string(), 2000.0),
            ("Rainfall".to_string(), 100.0),
        ]),
    )
    .unwrap();
    assert!((prediction.prediction - 17.0).abs() < 1e-3, "{}", prediction.prediction);
}

#[test]
fn test_session_script_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let actions = load_script(&fixtures_path().join("session.json")).unwrap();

    let report = run_script(&state, &actions);
    for step in &report.steps {
        if let StepOutcome::Failed { error } = &step.outcome {
            panic!("step {} ({}) failed: {}", step.index, step.action, error);
        }
    }
    assert!(report.is_success());
    assert_eq!(report.steps.len(), 8);

    match &report.steps[4].outcome {
        StepOutcome::Ok { output } => {
            assert_eq!(output["rows"], 18);
            assert!(output["histogram"].is_array());
            assert_eq!(output["line"]["points"][0]["x"], 150);
            assert_eq!(output["description"][0]["dtype"], "category");
        }
        other => panic!("unexpected analysis outcome {:?}", other),
    }
    match &report.steps[7].outcome {
        StepOutcome::Ok { output } => {
            let value = output["prediction"].as_f64().unwrap();
            assert!((value - 17.0).abs() < 1e-3);
        }
        other => panic!("unexpected prediction outcome {:?}", other),
    }
}
