//! Integration tests for cleaning and augmentation.
//!
//! These tests drive the public API end to end: CSV bytes in, cleaned and
//! augmented frames out.

use lex_synth::{
    AugmentationConfig, AugmentationRequest, Augmentor, MissingStrategy, OutlierStrategy,
    PreprocessConfig, Preprocessor, ProcessingWarning, SemanticType, SynthError, augment,
    compare_datasets, io,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_customers() -> DataFrame {
    io::read_csv_file(fixtures_path().join("customers.csv")).expect("Failed to read CSV file")
}

fn clean_customers() -> DataFrame {
    let config = PreprocessConfig::builder()
        .column_type("income", SemanticType::Numeric)
        .column_type("signup", SemanticType::Datetime)
        .missing_strategy(MissingStrategy::Mean)
        .outlier_strategy(OutlierStrategy::Iqr)
        .build()
        .unwrap();
    Preprocessor::new(config)
        .fit_transform(&load_customers())
        .unwrap()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn class_counts(df: &DataFrame, name: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in df.column(name).unwrap().str().unwrap().into_iter().flatten() {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

fn ratio_config(method: &str, ratio: f64) -> AugmentationConfig {
    AugmentationConfig::builder()
        .method(method)
        .ratio(ratio)
        .build()
        .unwrap()
}

// ============================================================================
// Preprocessing
// ============================================================================

#[test]
fn test_cleaning_real_csv() {
    let raw = load_customers();
    assert_eq!(raw.shape(), (40, 5));

    let cleaned = clean_customers();
    assert_eq!(cleaned.height(), 40);
    for column in cleaned.get_columns() {
        assert_eq!(column.null_count(), 0, "column {} still has gaps", column.name());
    }

    assert_eq!(cleaned.column("income").unwrap().dtype(), &DataType::Float64);
    assert!(matches!(
        cleaned.column("signup").unwrap().dtype(),
        DataType::Datetime(_, _)
    ));

    // "$52,000" is parsed, the 950000 outlier is clamped
    let income = f64_values(&cleaned, "income");
    assert_eq!(income[17], Some(52000.0));
    assert!(income[23].unwrap() < 950000.0);
}

#[test]
fn test_numeric_coercion_tolerates_bad_cell() {
    let df = io::read_csv_bytes(b"amount\n1\n2\noops\n4\n").unwrap();
    let config = PreprocessConfig::builder()
        .column_type("amount", SemanticType::Numeric)
        .missing_strategy(MissingStrategy::Drop)
        .build()
        .unwrap();
    let mut pre = Preprocessor::new(config);
    let out = pre.fit_transform(&df).unwrap();

    assert_eq!(f64_values(&out, "amount"), vec![Some(1.0), Some(2.0), Some(4.0)]);
    assert!(pre.warnings().is_empty());
}

#[test]
fn test_iqr_scenario() {
    let df = df!("x" => [1i64, 2, 3, 4, 100]).unwrap();
    let config = PreprocessConfig::builder()
        .outlier_strategy(OutlierStrategy::Iqr)
        .build()
        .unwrap();
    let out = Preprocessor::new(config).fit_transform(&df).unwrap();
    assert_eq!(
        f64_values(&out, "x"),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(7.0)]
    );
}

#[test]
fn test_iqr_clamping_is_idempotent() {
    let config = PreprocessConfig::builder()
        .outlier_strategy(OutlierStrategy::Iqr)
        .build()
        .unwrap();
    let df = df!("x" => [3.0, -40.0, 5.0, 6.0, 7.0, 8.0, 90.0]).unwrap();

    let once = Preprocessor::new(config.clone()).fit_transform(&df).unwrap();
    let twice = Preprocessor::new(config).fit_transform(&once).unwrap();
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_isolation_forest_with_infinite_cell() {
    let df = io::read_csv_bytes(b"x\n1.0\n2.0\ninf\n3.0\n4.0\n").unwrap();
    let config = PreprocessConfig::builder()
        .outlier_strategy(OutlierStrategy::IsolationForest)
        .build()
        .unwrap();
    let mut pre = Preprocessor::new(config);
    let out = pre.fit_transform(&df).unwrap();

    assert_eq!(out.height(), 5);
    assert!(f64_values(&out, "x").into_iter().flatten().all(f64::is_finite));
}

#[test]
fn test_fill_values_are_reused() {
    let a = df!("x" => [Some(1.0), Some(2.0), Some(3.0), None]).unwrap();
    let b = df!("x" => [None, Some(100.0), Some(200.0), None]).unwrap();

    let mut pre = Preprocessor::new(PreprocessConfig::default());
    pre.fit_transform(&a).unwrap();
    let out = pre.transform(&b).unwrap();

    assert_eq!(
        f64_values(&out, "x"),
        vec![Some(2.0), Some(100.0), Some(200.0), Some(2.0)]
    );
}

#[test]
fn test_unknown_column_type_is_a_warning() {
    let config = PreprocessConfig::builder()
        .column_type("ghost", SemanticType::Numeric)
        .build()
        .unwrap();
    let mut pre = Preprocessor::new(config);
    pre.fit_transform(&load_customers()).unwrap();
    assert!(
        pre.warnings()
            .iter()
            .any(|w| matches!(w, ProcessingWarning::MissingColumn { column, .. } if column == "ghost"))
    );
}

// ============================================================================
// Augmentation
// ============================================================================

#[test]
fn test_neighbor_balances_classes() {
    let cleaned = clean_customers();
    assert_eq!(class_counts(&cleaned, "churned")["yes"], 10);

    let config = AugmentationConfig::builder()
        .method("neighbor")
        .target_column("churned")
        .neighbor_count(5)
        .build()
        .unwrap();
    let mut augmentor = Augmentor::new(config).unwrap();
    let out = augmentor.fit_transform(&cleaned).unwrap();

    let counts = class_counts(&out, "churned");
    assert_eq!(counts["no"], 30);
    assert_eq!(counts["yes"], 30);
    assert_eq!(out.height(), 60);
    assert_eq!(out.schema(), cleaned.schema());
    assert!(out.slice(0, 40).equals_missing(&cleaned));
}

#[test]
fn test_neighbor_80_20_becomes_80_80() {
    let x: Vec<f64> = (0..100).map(|i| (i % 17) as f64 + if i < 80 { 0.0 } else { 40.0 }).collect();
    let label: Vec<&str> = (0..100).map(|i| if i < 80 { "major" } else { "minor" }).collect();
    let df = df!("x" => x, "label" => label).unwrap();

    let config = AugmentationConfig::builder()
        .method("neighbor")
        .target_column("label")
        .build()
        .unwrap();
    let out = augment(&df, &config).unwrap();

    let counts = class_counts(&out, "label");
    assert_eq!((counts["major"], counts["minor"]), (80, 80));
}

#[test]
fn test_neighbor_without_target_is_configuration_error() {
    let err = AugmentationConfig::builder()
        .method("neighbor")
        .build()
        .map_err(SynthError::from)
        .unwrap_err();
    assert!(err.is_configuration_error());

    let request = AugmentationRequest {
        method: Some("smote".to_string()),
        ..Default::default()
    };
    let err = Augmentor::from_request(request).err().unwrap();
    assert!(err.is_configuration_error());
    assert_eq!(err.error_code(), "MISSING_CONFIG");
}

#[test]
fn test_neighbor_count_too_large_is_invalid_parameter() {
    let df = df!("x" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0], "y" => ["a", "a", "a", "a", "b", "b"]).unwrap();
    let config = AugmentationConfig::builder()
        .method("neighbor")
        .target_column("y")
        .neighbor_count(2)
        .build()
        .unwrap();
    let err = augment(&df, &config).unwrap_err();
    assert!(err.is_invalid_parameter());
}

#[test]
fn test_density_row_count_and_prefix() {
    let cleaned = clean_customers();
    for ratio in [0.0, 0.3, 1.0] {
        let out = augment(&cleaned, &ratio_config("density", ratio)).unwrap();
        let expected = 40 + (40.0 * ratio).round() as usize;
        assert_eq!(out.height(), expected);
        assert!(out.slice(0, 40).equals_missing(&cleaned));
        assert_eq!(out.get_column_names_str(), cleaned.get_column_names_str());
    }
}

#[test]
fn test_target_rows_gives_exact_count() {
    let cleaned = clean_customers();
    for method in ["density", "independent"] {
        let config = AugmentationConfig::builder()
            .method(method)
            .target_rows(75)
            .build()
            .unwrap();
        let out = augment(&cleaned, &config).unwrap();
        assert_eq!(out.height(), 75, "method {method}");
    }
}

#[test]
fn test_independent_scenario() {
    let df = df!("x" => [10.0, 20.0, 30.0]).unwrap();
    let out = augment(&df, &ratio_config("independent", 1.0)).unwrap();

    assert_eq!(out.height(), 6);
    assert!(out.slice(0, 3).equals_missing(&df));
    let synthetic = f64_values(&out, "x").split_off(3);
    assert_eq!(synthetic.len(), 3);
    assert!(synthetic.iter().all(|v| v.is_some_and(|v| (10.0..=30.0).contains(&v))));
}

#[test]
fn test_density_without_numeric_columns_is_unchanged() {
    let df = df!("c" => ["a", "b", "a"], "d" => ["x", "y", "z"]).unwrap();
    let mut augmentor = Augmentor::new(ratio_config("density", 1.0)).unwrap();
    let out = augmentor.fit_transform(&df).unwrap();

    assert!(out.equals_missing(&df));
    assert!(matches!(
        augmentor.warnings(),
        [ProcessingWarning::DegenerateInput { .. }]
    ));

    let summary = augmentor.summary();
    assert_eq!(summary.synthetic_rows, 0);
    assert_eq!(summary.target_rows, summary.total_rows);
    assert_eq!(summary.ratio, 0.0);
}

#[test]
fn test_independent_with_infinite_value_degrades() {
    let df = df!("x" => [1.0, 2.0, f64::INFINITY], "c" => ["a", "b", "a"]).unwrap();
    let mut augmentor = Augmentor::new(ratio_config("independent", 1.0)).unwrap();
    let out = augmentor.fit_transform(&df).unwrap();

    assert_eq!(out.height(), 6);
    assert!(out.slice(0, 3).equals_missing(&df));
    assert!(
        augmentor
            .warnings()
            .iter()
            .any(|w| matches!(w, ProcessingWarning::DegenerateInput { .. }))
    );
}

#[test]
fn test_unsupported_method_name() {
    let err = AugmentationConfig::builder()
        .method("diffusion")
        .ratio(1.0)
        .build()
        .map_err(SynthError::from)
        .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_METHOD");
}

#[test]
fn test_same_seed_same_output() {
    let cleaned = clean_customers();
    for method in ["density", "independent"] {
        let a = augment(&cleaned, &ratio_config(method, 0.5)).unwrap();
        let b = augment(&cleaned, &ratio_config(method, 0.5)).unwrap();
        assert!(a.equals_missing(&b), "method {method}");
    }
}

#[test]
fn test_independent_instances_do_not_share_state() {
    let small = df!("x" => [1.0, 2.0, 3.0]).unwrap();
    let large = df!("x" => [100.0, 200.0, 300.0, 400.0]).unwrap();

    let mut first = Augmentor::new(ratio_config("independent", 1.0)).unwrap();
    let mut second = Augmentor::new(ratio_config("independent", 1.0)).unwrap();
    first.fit_transform(&small).unwrap();
    second.fit_transform(&large).unwrap();

    let fresh = first.generate_samples(20).unwrap();
    assert!(
        f64_values(&fresh, "x")
            .into_iter()
            .all(|v| v.is_some_and(|v| (1.0..=3.0).contains(&v)))
    );
    assert_eq!(second.summary().original_rows, 4);
    assert_eq!(first.summary().original_rows, 3);
}

#[test]
fn test_generate_samples_from_density_model() {
    let cleaned = clean_customers();
    let mut augmentor = Augmentor::new(ratio_config("density", 0.5)).unwrap();
    augmentor.fit_transform(&cleaned).unwrap();

    let fresh = augmentor.generate_samples(12).unwrap();
    assert_eq!(fresh.height(), 12);
    assert_eq!(fresh.schema(), cleaned.schema());

    let summary = augmentor.summary();
    assert_eq!(summary.method, "density");
    assert_eq!(summary.synthetic_rows, 20);
    assert!(summary.additional_params.contains_key("n_components"));
}

// ============================================================================
// Export and reporting
// ============================================================================

#[test]
fn test_export_and_compare() {
    let cleaned = clean_customers();
    let mut augmented = augment(&cleaned, &ratio_config("independent", 0.5)).unwrap();

    let bytes = io::write_csv_bytes(&mut augmented).unwrap();
    let reread = io::read_csv_bytes(&bytes).unwrap();
    assert_eq!(reread.shape(), (60, 5));

    let report = compare_datasets(&cleaned, &augmented).unwrap();
    assert_eq!(report.original_rows, 40);
    assert_eq!(report.augmented_rows, 60);
    assert_eq!(report.increase_ratio, 50.0);
    assert_eq!(report.columns.len(), 5);
}
