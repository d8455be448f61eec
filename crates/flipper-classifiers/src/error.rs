use thiserror::Error;

/// Errors raised while preparing data or running the pipeline.
///
/// Data-preparation variants are fatal to a run. Per-model failures are
/// carried as [`ModelError`] inside the model results instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("insufficient data for '{class}': {count} found, a stratified split needs at least 2")]
    InsufficientData { class: String, count: usize },

    #[error("degenerate feature '{feature}': zero standard deviation in the {partition} partition")]
    DegenerateFeature { feature: String, partition: String },

    #[error("dataset contains no samples")]
    EmptyDataset,

    #[error("non-finite value for '{feature}' at row {row}")]
    NonFiniteMeasurement { row: usize, feature: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("label '{0}' was not present when the encoder was fitted")]
    UnknownLabel(String),

    #[error("shape mismatch: expected {expected} columns, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors scoped to a single model variant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("{model} did not converge within {max_iterations} iterations (max gradient {gradient_norm:.3e})")]
    Convergence {
        model: String,
        max_iterations: usize,
        gradient_norm: f64,
    },

    #[error("{model} does not expose native feature importances")]
    UnsupportedModel { model: String },

    #[error("{model} failed to fit: {reason}")]
    Fit { model: String, reason: String },

    #[error("{model} must be fitted before predicting")]
    NotFitted { model: String },
}

impl ModelError {
    /// Name of the model variant the error belongs to.
    pub fn model(&self) -> &str {
        match self {
            ModelError::Convergence { model, .. }
            | ModelError::UnsupportedModel { model }
            | ModelError::Fit { model, .. }
            | ModelError::NotFitted { model } => model,
        }
    }
}
