//! End-to-end run: prepare → train/evaluate → rank importances.
use crate::config::PipelineConfig;
use crate::data_handling::{prepare_dataset, Dataset, PreparedData};
use crate::error::{ModelError, PipelineError};
use crate::evaluation::{train_and_evaluate, ModelResults};
use crate::importance::{rank_feature_importance, FeatureImportance};

/// Everything a run produces for reporting.
///
/// `prepared` carries the encoder and scaler needed to transform new
/// samples the same way.
#[derive(Debug)]
pub struct PipelineOutput {
    pub prepared: PreparedData,
    pub results: ModelResults,
    pub importance: Result<Vec<FeatureImportance>, PipelineError>,
}

/// Run the full pipeline.
///
/// Only configuration and data preparation errors are returned as `Err`;
/// model and importance failures are recorded in the output.
pub fn run_pipeline(
    dataset: &Dataset,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;
    dataset.log_input_data_summary();

    let prepared = prepare_dataset(dataset, config.test_fraction, config.seed)?;
    let results = train_and_evaluate(&prepared, &config.models, config.seed, config.parallel);
    let importance = feature_importance(&prepared, &results, config);

    if let Err(e) = &importance {
        log::warn!("Feature importance unavailable: {}", e);
    }

    Ok(PipelineOutput {
        prepared,
        results,
        importance,
    })
}

fn feature_importance(
    prepared: &PreparedData,
    results: &ModelResults,
    config: &PipelineConfig,
) -> Result<Vec<FeatureImportance>, PipelineError> {
    let source = config
        .importance_source()
        .ok_or_else(|| PipelineError::InvalidConfig("no model configured".to_string()))?;
    match results.get(&source.name) {
        Some(Ok(result)) => rank_feature_importance(result.model.as_ref(), &prepared.feature_names),
        Some(Err(e)) => Err(PipelineError::Model(e.clone())),
        None => Err(PipelineError::Model(ModelError::NotFitted {
            model: source.name.clone(),
        })),
    }
}
