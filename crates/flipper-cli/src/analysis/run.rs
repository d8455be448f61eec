//! The `analyze` workflow: load, describe, classify, test.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use ndarray::Array2;

use flipper_classifiers::data_handling::{Dataset, FLIPPER_LENGTH};
use flipper_classifiers::io::{read_penguins_csv, LoadSummary};
use flipper_classifiers::stats::{self, AnovaResult, PairwiseComparison, Summary};
use flipper_classifiers::{run_pipeline, PipelineOutput};

use crate::analysis::config::AnalysisConfig;

/// Everything the text report and the JSON summary are rendered from.
#[derive(Debug)]
pub struct FlipperAnalysis {
    pub generated_at: DateTime<Local>,
    pub data_path: PathBuf,
    pub config: AnalysisConfig,
    pub load: LoadSummary,
    pub dataset: Dataset,
    pub output: PipelineOutput,
    pub flipper_overall: Option<Summary>,
    pub flipper_by_species: BTreeMap<String, Summary>,
    /// Pearson correlation of the four measurement columns.
    pub correlation: Array2<f64>,
    pub flipper_pairwise: Vec<PairwiseComparison>,
    pub flipper_anova: Option<AnovaResult>,
}

pub fn run_analysis<P: AsRef<Path>>(data_path: P, config: &AnalysisConfig) -> Result<FlipperAnalysis> {
    let data_path = data_path.as_ref();
    let (dataset, load) = read_penguins_csv(data_path)?;
    analyze_dataset(dataset, load, data_path, config)
}

/// Run the analysis on an already loaded dataset.
pub fn analyze_dataset(
    dataset: Dataset,
    load: LoadSummary,
    data_path: &Path,
    config: &AnalysisConfig,
) -> Result<FlipperAnalysis> {
    let output = run_pipeline(&dataset, &config.pipeline).context("Classification pipeline failed")?;

    let flipper = dataset.feature_column(FLIPPER_LENGTH);
    let flipper_overall = stats::describe(&flipper);
    let flipper_by_species = stats::describe_by_species(&dataset, FLIPPER_LENGTH);
    let correlation = stats::correlation_matrix(&dataset.feature_matrix());
    let flipper_pairwise = stats::pairwise_species_comparisons(&dataset, FLIPPER_LENGTH);
    let flipper_anova = stats::species_anova(&dataset, FLIPPER_LENGTH);
    if flipper_anova.is_none() {
        log::warn!("ANOVA on flipper length is undefined for this dataset");
    }

    Ok(FlipperAnalysis {
        generated_at: Local::now(),
        data_path: data_path.to_path_buf(),
        config: config.clone(),
        load,
        dataset,
        output,
        flipper_overall,
        flipper_by_species,
        correlation,
        flipper_pairwise,
        flipper_anova,
    })
}
