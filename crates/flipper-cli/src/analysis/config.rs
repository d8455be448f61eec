use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use flipper_classifiers::config::PipelineConfig;

/// Parameters for one `flipper analyze` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pipeline: PipelineConfig,
    /// Also write a JSON summary to this path.
    pub json_output: Option<PathBuf>,
}

/// Load an analysis configuration from a JSON file.
pub fn load_analysis_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: AnalysisConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

impl AnalysisConfig {
    /// Config file (or defaults) with command line overrides applied.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                log::info!("Using config: {:?}", path);
                load_analysis_config(path)?
            }
            None => {
                log::info!("No config provided; using defaults.");
                AnalysisConfig::default()
            }
        };

        if let Some(&fraction) = matches.get_one::<f64>("test_fraction") {
            config.pipeline.test_fraction = fraction;
        }
        if let Some(&seed) = matches.get_one::<u64>("seed") {
            config.pipeline.seed = seed;
        }
        if matches.get_flag("sequential") {
            config.pipeline.parallel = false;
        }
        if let Some(json) = matches.get_one::<PathBuf>("json") {
            config.json_output = Some(json.clone());
        }

        config
            .pipeline
            .validate()
            .context("Invalid analysis configuration")?;
        Ok(config)
    }
}
