//! Integration tests for CLI config parsing, util helpers, and the analysis
//! report.

mod common;

use flipper_cli::analysis::config::{load_analysis_config, AnalysisConfig};
use flipper_cli::analysis::report::{key_findings, render_report};
use flipper_cli::analysis::run::run_analysis;
use flipper_cli::analysis::summary::write_json_summary;
use flipper_cli::cli::build_cli;
use flipper_cli::util::validate_csv_file;

// ---------------------------------------------------------------------------
// validate_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(&path).is_ok());
}

#[test]
fn validate_uppercase_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("DATA.CSV");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(&path).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(&path).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_csv_file("/nonexistent/path/data.csv").is_err());
}

// ---------------------------------------------------------------------------
// AnalysisConfig defaults, serialization and overrides
// ---------------------------------------------------------------------------

#[test]
fn analysis_config_default_values() {
    let cfg = AnalysisConfig::default();
    assert!((cfg.pipeline.test_fraction - 0.2).abs() < 1e-12);
    assert_eq!(cfg.pipeline.seed, 42);
    assert!(cfg.pipeline.parallel);
    assert_eq!(cfg.pipeline.models.len(), 3);
    assert!(cfg.json_output.is_none());
}

#[test]
fn analysis_config_round_trips_json() {
    let cfg = AnalysisConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("test_fraction"));
    let cfg2: AnalysisConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, cfg2);
}

#[test]
fn analysis_config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "pipeline": { "seed": 3, "parallel": false } }"#).unwrap();

    let loaded = load_analysis_config(&path).unwrap();
    assert_eq!(loaded.pipeline.seed, 3);
    assert!(!loaded.pipeline.parallel);
    assert_eq!(loaded.pipeline.models.len(), 3);
}

#[test]
fn analysis_config_bad_json_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = load_analysis_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config"));
}

#[test]
fn command_line_overrides_config() {
    let matches = build_cli().get_matches_from([
        "flipper",
        "analyze",
        "penguins.csv",
        "--test-fraction",
        "0.3",
        "--seed",
        "9",
        "--sequential",
        "--json",
        "out.json",
    ]);
    let (_, sub_m) = matches.subcommand().unwrap();
    let cfg = AnalysisConfig::from_arguments(None, sub_m).unwrap();
    assert!((cfg.pipeline.test_fraction - 0.3).abs() < 1e-12);
    assert_eq!(cfg.pipeline.seed, 9);
    assert!(!cfg.pipeline.parallel);
    assert_eq!(cfg.json_output.unwrap().to_str(), Some("out.json"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "pipeline": { "models": [] } }"#).unwrap();

    let matches = build_cli().get_matches_from(["flipper", "analyze", "penguins.csv"]);
    let (_, sub_m) = matches.subcommand().unwrap();
    assert!(AnalysisConfig::from_arguments(Some(&path), sub_m).is_err());
}

// ---------------------------------------------------------------------------
// Analysis, report and summary
// ---------------------------------------------------------------------------

#[test]
fn analysis_report_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_penguins_csv(dir.path());

    let analysis = run_analysis(&path, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.load.rows_kept(), 150);
    assert_eq!(analysis.flipper_by_species.len(), 3);
    assert_eq!(analysis.flipper_pairwise.len(), 3);
    assert!(analysis.flipper_anova.unwrap().p_value < 0.001);

    let findings = key_findings(&analysis);
    assert!(findings[0].starts_with("Gentoo"));
    assert!(findings.iter().any(|f| f.starts_with("Best performing model")));

    let report = render_report(&analysis).unwrap();
    assert!(report.contains("=== FLIPPER LENGTH STATISTICS ==="));
    assert!(report.contains("Adelie vs Chinstrap"));
    assert!(report.contains("Confusion matrix"));
    assert!(report.contains("FEATURE IMPORTANCE (Random Forest)"));

    let json_path = dir.path().join("summary.json");
    write_json_summary(&analysis, &json_path).unwrap();
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(summary["species_encoding"]["Gentoo"], 2);
    assert_eq!(summary["train_size"].as_u64().unwrap() + summary["test_size"].as_u64().unwrap(), 150);
    assert_eq!(summary["feature_importance"].as_array().unwrap().len(), 4);
}

#[test]
fn missing_columns_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penguins.csv");
    std::fs::write(&path, "species,island\nAdelie,Dream\n").unwrap();
    assert!(run_analysis(&path, &AnalysisConfig::default()).is_err());
}
