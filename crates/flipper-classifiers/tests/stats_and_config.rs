use std::str::FromStr;

use flipper_classifiers::config::{ModelConfig, ModelType, PipelineConfig};
use flipper_classifiers::error::PipelineError;
use flipper_classifiers::stats;
use ndarray::array;

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {} got {}",
        expected,
        actual
    );
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[test]
fn describe_matches_hand_computed_values() {
    let summary = stats::describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
    assert_eq!(summary.count, 4);
    assert_close(summary.mean, 2.5, 1e-12);
    assert_close(summary.std, (5.0f64 / 3.0).sqrt(), 1e-12);
    assert_eq!(summary.min, 1.0);
    assert_close(summary.q25, 1.75, 1e-12);
    assert_close(summary.median, 2.5, 1e-12);
    assert_close(summary.q75, 3.25, 1e-12);
    assert_eq!(summary.max, 4.0);

    assert!(stats::describe(&[]).is_none());
}

#[test]
fn t_test_and_effect_size() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0];
    let b = [3.0, 4.0, 5.0, 6.0, 7.0];

    let t = stats::student_t_test(&a, &b).unwrap();
    assert_close(t.statistic, -2.0, 1e-12);
    assert_close(t.df, 8.0, 1e-12);
    // Two-sided p for |t| = 2 with 8 degrees of freedom.
    assert!(t.p_value > 0.075 && t.p_value < 0.085, "p = {}", t.p_value);

    let d = stats::cohens_d(&a, &b).unwrap();
    assert_close(d, -2.0 / 2.5f64.sqrt(), 1e-12);
    assert_close(stats::cohens_d(&b, &a).unwrap(), -d, 1e-12);
}

#[test]
fn t_test_needs_spread_and_two_values() {
    assert!(stats::student_t_test(&[1.0], &[2.0, 3.0]).is_none());
    assert!(stats::student_t_test(&[1.0, 1.0], &[1.0, 1.0]).is_none());
    assert!(stats::cohens_d(&[1.0, 1.0], &[1.0, 1.0]).is_none());
}

#[test]
fn one_way_anova_matches_closed_form() {
    let groups: [&[f64]; 3] = [&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]];
    let anova = stats::one_way_anova(&groups).unwrap();
    assert_close(anova.f_statistic, 48.0, 1e-9);
    assert_close(anova.df_between, 2.0, 1e-12);
    assert_close(anova.df_within, 6.0, 1e-12);
    // F(2, d2) survival function is (1 + 2F/d2)^(-d2/2).
    assert_close(anova.p_value, 17f64.powi(-3), 1e-8);

    assert!(stats::one_way_anova(&groups[..1]).is_none());
}

#[test]
fn correlation_of_linear_columns() {
    let x = array![[1.0, 2.0, -1.0], [2.0, 4.0, -2.0], [3.0, 6.0, -3.0], [5.0, 10.0, -5.0]];
    let corr = stats::correlation_matrix(&x);
    assert_close(corr[(0, 0)], 1.0, 1e-12);
    assert_close(corr[(0, 1)], 1.0, 1e-12);
    assert_close(corr[(0, 2)], -1.0, 1e-12);
    assert_close(corr[(2, 1)], -1.0, 1e-12);
}

#[test]
fn significance_levels() {
    assert_eq!(stats::significance_stars(0.0001), "***");
    assert_eq!(stats::significance_stars(0.005), "**");
    assert_eq!(stats::significance_stars(0.03), "*");
    assert_eq!(stats::significance_stars(0.2), "ns");
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn model_type_from_str() {
    assert!(ModelType::from_str("rf").unwrap().is_tree_ensemble());
    assert!(matches!(
        ModelType::from_str("Logistic-Regression"),
        Ok(ModelType::LogisticRegression {
            max_iterations: 1000,
            ..
        })
    ));
    assert!(matches!(
        ModelType::from_str("svm"),
        Ok(ModelType::SVM {
            gaussian_kernel_eps: None,
            ..
        })
    ));
    let err = ModelType::from_str("gbdt").unwrap_err();
    assert!(err.contains("gbdt"));
}

#[test]
fn default_pipeline_config() {
    let config = PipelineConfig::default();
    assert_eq!(config.test_fraction, 0.2);
    assert_eq!(config.seed, 42);
    let names: Vec<&str> = config.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Random Forest", "Logistic Regression", "Support Vector Machine"]
    );
    assert_eq!(config.importance_source().unwrap().name, "Random Forest");
    assert!(config.validate().is_ok());
}

#[test]
fn pipeline_config_json_round_trip() {
    let config = PipelineConfig {
        seed: 7,
        importance_model: Some("forest".to_string()),
        models: vec![
            ModelConfig::named(
                "forest",
                ModelType::RandomForest {
                    n_trees: 25,
                    max_depth: None,
                    feature_subsample: 1.0,
                    seed: Some(3),
                },
            ),
            ModelConfig::new(ModelType::from_str("svm").unwrap()),
        ],
        ..PipelineConfig::default()
    };
    let json = serde_json::to_string_pretty(&config).unwrap();
    assert!(json.contains("\"RandomForest\""));
    let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_json_uses_defaults() {
    let parsed: PipelineConfig = serde_json::from_str(r#"{ "seed": 11 }"#).unwrap();
    assert_eq!(parsed.seed, 11);
    assert_eq!(parsed.test_fraction, 0.2);
    assert_eq!(parsed.models.len(), 3);

    let parsed: PipelineConfig = serde_json::from_str(
        r#"{ "models": [ { "name": "lr", "LogisticRegression": { "c": 0.5, "max_iterations": 50, "tolerance": 0.001 } } ] }"#,
    )
    .unwrap();
    assert_eq!(parsed.models.len(), 1);
    assert_eq!(parsed.models[0].name, "lr");
    // Without a forest the first model is the importance source.
    assert_eq!(parsed.importance_source().unwrap().name, "lr");
}

#[test]
fn validate_rejects_bad_values() {
    let bad_fraction = PipelineConfig {
        test_fraction: 1.0,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        bad_fraction.validate(),
        Err(PipelineError::InvalidConfig(_))
    ));

    let no_models = PipelineConfig {
        models: vec![],
        ..PipelineConfig::default()
    };
    assert!(no_models.validate().is_err());

    let unknown_source = PipelineConfig {
        importance_model: Some("nope".to_string()),
        ..PipelineConfig::default()
    };
    assert!(unknown_source.validate().is_err());

    let zero_trees = PipelineConfig {
        models: vec![ModelConfig::new(ModelType::RandomForest {
            n_trees: 0,
            max_depth: None,
            feature_subsample: 0.5,
            seed: None,
        })],
        ..PipelineConfig::default()
    };
    assert!(zero_trees.validate().is_err());
}
