use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::PipelineError;

/// Configuration of one model variant in the evaluation run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Name the variant is reported under. Must be unique within a run.
    pub name: String,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest {
        n_trees: usize,
        max_depth: Option<usize>,
        /// Fraction of the feature columns each tree is grown on.
        feature_subsample: f64,
        /// Falls back to the pipeline seed when unset.
        seed: Option<u64>,
    },
    LogisticRegression {
        /// Inverse regularization strength.
        c: f64,
        max_iterations: usize,
        /// Convergence threshold on the largest absolute gradient entry.
        tolerance: f64,
    },
    SVM {
        c: f64,
        /// Width of the gaussian kernel. `None` picks `n_features * var(X)`.
        gaussian_kernel_eps: Option<f64>,
        /// Stopping tolerance of the SMO solver.
        eps: f64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            n_trees: 100,
            max_depth: Some(10),
            feature_subsample: 0.5,
            seed: None,
        }
    }
}

impl ModelType {
    /// Human readable name used when no explicit name is configured.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::RandomForest { .. } => "Random Forest",
            ModelType::LogisticRegression { .. } => "Logistic Regression",
            ModelType::SVM { .. } => "Support Vector Machine",
        }
    }

    pub fn is_tree_ensemble(&self) -> bool {
        matches!(self, ModelType::RandomForest { .. })
    }

    fn validate(&self, name: &str) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(format!("{}: {}", name, msg)));
        match self {
            ModelType::RandomForest {
                n_trees,
                max_depth,
                feature_subsample,
                ..
            } => {
                if *n_trees == 0 {
                    return invalid("n_trees must be at least 1".to_string());
                }
                if *max_depth == Some(0) {
                    return invalid("max_depth must be at least 1".to_string());
                }
                if !(*feature_subsample > 0.0 && *feature_subsample <= 1.0) {
                    return invalid(format!(
                        "feature_subsample must be in (0, 1], got {}",
                        feature_subsample
                    ));
                }
            }
            ModelType::LogisticRegression {
                c,
                max_iterations,
                tolerance,
            } => {
                if !(*c > 0.0) {
                    return invalid(format!("c must be positive, got {}", c));
                }
                if *max_iterations == 0 {
                    return invalid("max_iterations must be at least 1".to_string());
                }
                if !(*tolerance > 0.0) {
                    return invalid(format!("tolerance must be positive, got {}", tolerance));
                }
            }
            ModelType::SVM {
                c,
                gaussian_kernel_eps,
                eps,
            } => {
                if !(*c > 0.0) {
                    return invalid(format!("c must be positive, got {}", c));
                }
                if let Some(kernel_eps) = gaussian_kernel_eps {
                    if !(*kernel_eps > 0.0) {
                        return invalid(format!(
                            "gaussian_kernel_eps must be positive, got {}",
                            kernel_eps
                        ));
                    }
                }
                if !(*eps > 0.0) {
                    return invalid(format!("eps must be positive, got {}", eps));
                }
            }
        }
        Ok(())
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "random_forest" | "rf" => Ok(ModelType::default()),
            "logistic_regression" | "logreg" => Ok(ModelType::LogisticRegression {
                c: 1.0,
                max_iterations: 1000,
                tolerance: 1e-4,
            }),
            "svm" => Ok(ModelType::SVM {
                c: 1.0,
                gaussian_kernel_eps: None,
                eps: 1e-3,
            }),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: random_forest, logistic_regression, svm",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            name: model_type.display_name().to_string(),
            model_type,
        }
    }

    pub fn named(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelType::default())
    }
}

/// Parameters for a full preparation + evaluation run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of every class held out for testing.
    pub test_fraction: f64,
    /// Seed for the stratified split and for models without their own seed.
    pub seed: u64,
    /// Train the model variants on the rayon pool.
    pub parallel: bool,
    /// Variant used for feature importance. Defaults to the first random forest.
    pub importance_model: Option<String>,
    pub models: Vec<ModelConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let models = ["random_forest", "logistic_regression", "svm"]
            .iter()
            .filter_map(|s| ModelType::from_str(s).ok())
            .map(ModelConfig::new)
            .collect();
        Self {
            test_fraction: 0.2,
            seed: 42,
            parallel: true,
            importance_model: None,
            models,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.models.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one model must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "duplicate model name '{}'",
                    model.name
                )));
            }
            model.model_type.validate(&model.name)?;
        }
        if let Some(name) = &self.importance_model {
            if !seen.contains(name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "importance_model '{}' is not a configured model",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Config of the variant whose importances get ranked.
    pub fn importance_source(&self) -> Option<&ModelConfig> {
        match &self.importance_model {
            Some(name) => self.models.iter().find(|m| &m.name == name),
            None => self
                .models
                .iter()
                .find(|m| m.model_type.is_tree_ensemble())
                .or_else(|| self.models.first()),
        }
    }
}
