//! Data structures and helpers for penguin measurement datasets.
//!
//! This module defines `Sample`, `Dataset` and `LabelEncoder`, and contains
//! the stratified train/test split plus `prepare_dataset`, which turns a
//! cleaned dataset into scaled matrices ready for model training.
use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};

/// Measurement columns used as classifier features, in column order.
pub const FEATURE_NAMES: [&str; 4] = [
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
];

pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// Index of `flipper_length_mm` in [`FEATURE_NAMES`].
pub const FLIPPER_LENGTH: usize = 2;

/// Index of `body_mass_g` in [`FEATURE_NAMES`].
pub const BODY_MASS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub species: String,
    pub island: Option<String>,
    pub sex: Option<String>,
    pub bill_length_mm: f64,
    pub bill_depth_mm: f64,
    pub flipper_length_mm: f64,
    pub body_mass_g: f64,
}

impl Sample {
    /// Build a sample from a species label and the four measurements in
    /// [`FEATURE_NAMES`] order.
    pub fn new(species: impl Into<String>, features: [f64; N_FEATURES]) -> Self {
        Sample {
            species: species.into(),
            island: None,
            sex: None,
            bill_length_mm: features[0],
            bill_depth_mm: features[1],
            flipper_length_mm: features[2],
            body_mass_g: features[3],
        }
    }

    pub fn features(&self) -> [f64; N_FEATURES] {
        [
            self.bill_length_mm,
            self.bill_depth_mm,
            self.flipper_length_mm,
            self.body_mass_g,
        ]
    }
}

/// An ordered, non-empty collection of complete samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Result<Self, PipelineError> {
        if samples.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        for (row, sample) in samples.iter().enumerate() {
            if let Some(col) = sample.features().iter().position(|v| !v.is_finite()) {
                return Err(PipelineError::NonFiniteMeasurement {
                    row,
                    feature: FEATURE_NAMES[col].to_string(),
                });
            }
        }
        Ok(Dataset { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Feature matrix with one row per sample and [`N_FEATURES`] columns.
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut x = Array2::zeros((self.samples.len(), N_FEATURES));
        for (mut row, sample) in x.axis_iter_mut(Axis(0)).zip(self.samples.iter()) {
            for (dst, v) in row.iter_mut().zip(sample.features()) {
                *dst = v;
            }
        }
        x
    }

    pub fn feature_column(&self, feature: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.features()[feature]).collect()
    }

    pub fn species(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.species.as_str()).collect()
    }

    /// Number of samples per species, in sorted species order.
    pub fn species_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.species.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Values of one feature grouped by species.
    pub fn group_by_species(&self, feature: usize) -> BTreeMap<String, Vec<f64>> {
        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for sample in &self.samples {
            groups
                .entry(sample.species.clone())
                .or_default()
                .push(sample.features()[feature]);
        }
        groups
    }

    pub fn log_input_data_summary(&self) {
        log::info!(
            "{} samples, {} features, {} species",
            self.len(),
            N_FEATURES,
            self.species_counts().len()
        );
        for (species, count) in self.species_counts() {
            log::debug!("  {}: {} samples", species, count);
        }
    }
}

/// Bijective mapping between species labels and class indices.
///
/// Classes are kept sorted so the mapping is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = labels.into_iter().collect();
        LabelEncoder {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn transform(&self, labels: &[&str]) -> Result<Vec<usize>, PipelineError> {
        labels
            .iter()
            .map(|l| {
                self.encode(l)
                    .ok_or_else(|| PipelineError::UnknownLabel(l.to_string()))
            })
            .collect()
    }

    pub fn mapping(&self) -> BTreeMap<String, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect()
    }
}

/// Disjoint train/test row indices into a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Partition {
    /// True when the partition covers `0..n` exactly once.
    pub fn is_exhaustive_and_disjoint(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for &i in self.train.iter().chain(self.test.iter()) {
            if i >= n || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        seen.into_iter().all(|v| v)
    }
}

/// Split `labels` into train/test indices, preserving class proportions.
///
/// Each class with `c` members contributes `round(c * test_fraction)` test
/// rows, clamped so at least one member stays in training.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    classes: &[String],
    test_fraction: f64,
    seed: u64,
) -> Result<Partition, PipelineError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        match members.get_mut(label) {
            Some(class_members) => class_members.push(i),
            None => {
                return Err(PipelineError::InvalidConfig(format!(
                    "label {} at row {} is outside 0..{}",
                    label, i, n_classes
                )))
            }
        }
    }

    for (class, idx) in members.iter().enumerate() {
        if idx.len() < 2 {
            return Err(PipelineError::InsufficientData {
                class: classes
                    .get(class)
                    .cloned()
                    .unwrap_or_else(|| class.to_string()),
                count: idx.len(),
            });
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut idx in members {
        let n_test = ((idx.len() as f64 * test_fraction).round() as usize).min(idx.len() - 1);
        idx.shuffle(&mut rng);
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    if test.is_empty() {
        return Err(PipelineError::InsufficientData {
            class: "<all>".to_string(),
            count: labels.len(),
        });
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(Partition { train, test })
}

/// Output of the dataset preparation stage.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub encoder: LabelEncoder,
    pub partition: Partition,
    pub scaler: Scaler,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
    pub feature_names: Vec<String>,
}

impl PreparedData {
    pub fn n_classes(&self) -> usize {
        self.encoder.n_classes()
    }
}

/// Encode labels, split, and standardize a dataset.
///
/// Scaling parameters are estimated on the training partition only and then
/// applied to both partitions.
pub fn prepare_dataset(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<PreparedData, PipelineError> {
    let encoder = LabelEncoder::fit(dataset.iter().map(|s| s.species.as_str()));
    log::debug!("Species encoding: {:?}", encoder.mapping());
    if encoder.n_classes() < 2 {
        return Err(PipelineError::InsufficientData {
            class: "<species>".to_string(),
            count: encoder.n_classes(),
        });
    }

    let y = encoder.transform(&dataset.species())?;
    let partition = stratified_split(
        &y,
        encoder.n_classes(),
        encoder.classes(),
        test_fraction,
        seed,
    )?;

    let x = dataset.feature_matrix();
    let x_train_raw = x.select(Axis(0), &partition.train);
    let x_test_raw = x.select(Axis(0), &partition.test);

    let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    let scaler = fit_scaler(&x_train_raw, &feature_names)?;
    let x_train = transform_all(&x_train_raw, &scaler)?;
    let x_test = transform_all(&x_test_raw, &scaler)?;

    let y_train = partition.train.iter().map(|&i| y[i]).collect();
    let y_test = partition.test.iter().map(|&i| y[i]).collect();

    log::info!(
        "Training set: {} x {}, test set: {} x {}",
        x_train.nrows(),
        x_train.ncols(),
        x_test.nrows(),
        x_test.ncols()
    );

    Ok(PreparedData {
        encoder,
        partition,
        scaler,
        x_train,
        x_test,
        y_train,
        y_test,
        feature_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &n)| std::iter::repeat(class).take(n))
            .collect()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class_{}", i)).collect()
    }

    #[test]
    fn test_split_sizes_follow_rounding() {
        // Class sizes of the cleaned palmerpenguins table.
        let y = labels(&[146, 68, 119]);
        let p = stratified_split(&y, 3, &names(3), 0.2, 42).unwrap();
        assert_eq!(p.test.len(), 29 + 14 + 24);
        assert_eq!(p.train.len() + p.test.len(), y.len());
        assert!(p.is_exhaustive_and_disjoint(y.len()));
    }

    #[test]
    fn test_split_keeps_one_training_member() {
        let y = labels(&[2, 2]);
        let p = stratified_split(&y, 2, &names(2), 0.9, 7).unwrap();
        for class in 0..2 {
            assert!(p.train.iter().any(|&i| y[i] == class));
        }
    }

    #[test]
    fn test_split_rejects_out_of_range_label() {
        let y = vec![0, 1, 0, 1, 2];
        assert!(matches!(
            stratified_split(&y, 2, &names(2), 0.2, 0),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_species_is_insufficient() {
        let samples = (0..10)
            .map(|i| Sample::new("Adelie", [38.0 + i as f64, 18.0, 190.0, 3700.0 + i as f64]))
            .collect();
        let dataset = Dataset::new(samples).unwrap();
        assert!(matches!(
            prepare_dataset(&dataset, 0.2, 42),
            Err(PipelineError::InsufficientData { count: 1, .. })
        ));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let y = labels(&[5, 5]);
        assert!(matches!(
            stratified_split(&y, 2, &names(2), 1.0, 0),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_encoder_is_sorted() {
        let enc = LabelEncoder::fit(["Gentoo", "Adelie", "Chinstrap", "Adelie"]);
        assert_eq!(enc.classes(), &["Adelie", "Chinstrap", "Gentoo"]);
        assert_eq!(enc.encode("Gentoo"), Some(2));
        assert_eq!(enc.decode(1), Some("Chinstrap"));
        assert_eq!(enc.encode("Emperor"), None);
    }
}
