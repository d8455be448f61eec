//! Machine-readable JSON summary of an analysis run.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use flipper_classifiers::config::PipelineConfig;
use flipper_classifiers::importance::FeatureImportance;
use flipper_classifiers::metrics::ClassificationReport;
use flipper_classifiers::stats::{AnovaResult, PairwiseComparison, Summary};

use crate::analysis::report::key_findings;
use crate::analysis::run::FlipperAnalysis;

#[derive(Debug, Serialize)]
pub struct ModelSummary<'a> {
    pub name: &'a str,
    pub accuracy: Option<f64>,
    pub error: Option<String>,
    pub report: Option<&'a ClassificationReport>,
    /// Rows are true classes, columns predicted classes.
    pub confusion_matrix: Option<Vec<Vec<usize>>>,
}

#[derive(Debug, Serialize)]
pub struct FlipperStatistics<'a> {
    pub overall: Option<&'a Summary>,
    pub by_species: &'a BTreeMap<String, Summary>,
    pub pairwise: &'a [PairwiseComparison],
    pub anova: Option<&'a AnovaResult>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary<'a> {
    pub generated_at: DateTime<Local>,
    pub data_file: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub species_counts: BTreeMap<String, usize>,
    pub species_encoding: BTreeMap<String, usize>,
    pub train_size: usize,
    pub test_size: usize,
    pub models: Vec<ModelSummary<'a>>,
    pub best_model: Option<&'a str>,
    pub feature_importance: Option<&'a [FeatureImportance]>,
    pub feature_importance_error: Option<String>,
    pub flipper_length: FlipperStatistics<'a>,
    pub key_findings: Vec<String>,
    pub config: &'a PipelineConfig,
}

impl<'a> AnalysisSummary<'a> {
    pub fn from_analysis(analysis: &'a FlipperAnalysis) -> Self {
        let output = &analysis.output;
        let models = output
            .results
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(r) => ModelSummary {
                    name: &outcome.name,
                    accuracy: Some(r.accuracy),
                    error: None,
                    report: Some(&r.report),
                    confusion_matrix: Some(
                        r.confusion
                            .counts
                            .rows()
                            .into_iter()
                            .map(|row| row.to_vec())
                            .collect(),
                    ),
                },
                Err(e) => ModelSummary {
                    name: &outcome.name,
                    accuracy: None,
                    error: Some(e.to_string()),
                    report: None,
                    confusion_matrix: None,
                },
            })
            .collect();

        let (feature_importance, feature_importance_error) = match &output.importance {
            Ok(ranked) => (Some(ranked.as_slice()), None),
            Err(e) => (None, Some(e.to_string())),
        };

        AnalysisSummary {
            generated_at: analysis.generated_at,
            data_file: analysis.data_path.display().to_string(),
            rows_read: analysis.load.rows_read,
            rows_dropped: analysis.load.rows_dropped,
            species_counts: analysis.dataset.species_counts(),
            species_encoding: output.prepared.encoder.mapping(),
            train_size: output.prepared.partition.train.len(),
            test_size: output.prepared.partition.test.len(),
            models,
            best_model: output.results.best().map(|r| r.name.as_str()),
            feature_importance,
            feature_importance_error,
            flipper_length: FlipperStatistics {
                overall: analysis.flipper_overall.as_ref(),
                by_species: &analysis.flipper_by_species,
                pairwise: &analysis.flipper_pairwise,
                anova: analysis.flipper_anova.as_ref(),
            },
            key_findings: key_findings(analysis),
            config: &analysis.config.pipeline,
        }
    }
}

/// Write the JSON summary of `analysis` to `path`.
pub fn write_json_summary<P: AsRef<Path>>(analysis: &FlipperAnalysis, path: P) -> Result<()> {
    let summary = AnalysisSummary::from_analysis(analysis);
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write summary: {}", path.as_ref().display()))?;
    log::info!("Wrote JSON summary to {}", path.as_ref().display());
    Ok(())
}
