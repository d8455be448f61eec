//! flipper-classifiers: species classification for penguin measurements.
//!
//! This crate prepares a cleaned measurement table (label encoding,
//! stratified split, standardization), trains a small set of classifiers
//! (random forest, multinomial logistic regression, one-vs-rest SVM),
//! scores them on the held-out partition and ranks feature importances
//! from the tree ensemble. A statistics module provides the descriptive
//! and inferential numbers the reporting layer prints next to the models.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod importance;
pub mod io;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod stats;

pub use error::{ModelError, PipelineError};
pub use pipeline::{run_pipeline, PipelineOutput};
