use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::Classifier;
use crate::models::forest::RandomForestClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::svm::SVMClassifier;

/// Build a boxed, unfitted classifier from a `ModelConfig`.
///
/// `default_seed` seeds variants that are stochastic but carry no seed of
/// their own.
pub fn build_model(params: ModelConfig, default_seed: u64) -> Box<dyn Classifier> {
    match params.model_type {
        ModelType::RandomForest { .. } => {
            Box::new(RandomForestClassifier::new(params, default_seed))
        }
        ModelType::LogisticRegression { .. } => Box::new(LogisticRegressionClassifier::new(params)),
        ModelType::SVM { .. } => Box::new(SVMClassifier::new(params)),
    }
}
