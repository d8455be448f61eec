//! Training and scoring of every configured model variant.
//!
//! Variants only share the read-only `PreparedData`, so they can be trained
//! on the rayon pool without changing any result. A failing variant is kept
//! as an `Err` entry and never stops its siblings.
use std::fmt;

use ndarray::Array2;
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::data_handling::PreparedData;
use crate::error::ModelError;
use crate::metrics::{accuracy, ClassificationReport, ConfusionMatrix};
use crate::models::classifier_trait::Classifier;
use crate::models::factory::build_model;

/// Fitted model plus its scores on the test partition.
pub struct ModelResult {
    pub name: String,
    pub model: Box<dyn Classifier>,
    pub accuracy: f64,
    pub predictions: Vec<usize>,
    /// `(n_test, n_classes)` probabilities for probabilistic variants.
    pub probabilities: Option<Array2<f64>>,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

impl fmt::Debug for ModelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelResult")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("accuracy", &self.accuracy)
            .field("predictions", &self.predictions)
            .field("probabilities", &self.probabilities.as_ref().map(|p| p.dim()))
            .finish()
    }
}

/// Result slot of one configured variant.
#[derive(Debug)]
pub struct ModelOutcome {
    pub name: String,
    pub model_type: ModelType,
    pub result: Result<ModelResult, ModelError>,
}

/// Outcomes keyed by variant name, in configuration order.
#[derive(Debug, Default)]
pub struct ModelResults {
    entries: Vec<ModelOutcome>,
}

impl ModelResults {
    pub fn new(entries: Vec<ModelOutcome>) -> Self {
        ModelResults { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Result<ModelResult, ModelError>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.result)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelOutcome> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn successful(&self) -> impl Iterator<Item = &ModelResult> {
        self.entries.iter().filter_map(|e| e.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ModelError> {
        self.entries.iter().filter_map(|e| e.result.as_ref().err())
    }

    /// Successful variant with the highest accuracy; the earliest wins ties.
    pub fn best(&self) -> Option<&ModelResult> {
        self.successful().fold(None, |best: Option<&ModelResult>, r| match best {
            Some(b) if b.accuracy >= r.accuracy => Some(b),
            _ => Some(r),
        })
    }
}

/// Fit one variant on the training partition and score it on the test one.
pub fn evaluate_model(
    data: &PreparedData,
    config: &ModelConfig,
    default_seed: u64,
) -> Result<ModelResult, ModelError> {
    log::info!("Training {}", config.name);
    let mut model = build_model(config.clone(), default_seed);
    model.fit(&data.x_train, &data.y_train, data.n_classes())?;

    let predictions = model.predict(&data.x_test)?;
    let probabilities = match model.as_probabilistic() {
        Some(p) => Some(p.predict_proba(&data.x_test)?),
        None => None,
    };

    let acc = accuracy(&data.y_test, &predictions);
    let confusion = ConfusionMatrix::new(&data.y_test, &predictions, data.n_classes());
    let report = ClassificationReport::from_confusion(&confusion);
    log::info!("{}: test accuracy {:.4}", config.name, acc);

    Ok(ModelResult {
        name: config.name.clone(),
        model,
        accuracy: acc,
        predictions,
        probabilities,
        confusion,
        report,
    })
}

/// Train and score every configured variant on the same prepared data.
pub fn train_and_evaluate(
    data: &PreparedData,
    configs: &[ModelConfig],
    default_seed: u64,
    parallel: bool,
) -> ModelResults {
    let run = |config: &ModelConfig| {
        let result = evaluate_model(data, config, default_seed);
        if let Err(e) = &result {
            log::warn!("{}", e);
        }
        ModelOutcome {
            name: config.name.clone(),
            model_type: config.model_type.clone(),
            result,
        }
    };

    let entries = if parallel {
        configs.par_iter().map(run).collect()
    } else {
        configs.iter().map(run).collect()
    };
    ModelResults::new(entries)
}
