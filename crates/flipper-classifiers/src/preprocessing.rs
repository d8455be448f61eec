//! Feature standardization.
//!
//! Provides a `Scaler` holding per-column mean and standard deviation. It
//! is fitted on training rows only and then applied unchanged to any other
//! rows, including single new samples.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Per-column mean / population standard deviation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Relative threshold under which a column counts as constant.
    const MIN_RELATIVE_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn check_width(&self, found: usize) -> Result<(), PipelineError> {
        if found != self.n_features() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.n_features(),
                found,
            });
        }
        Ok(())
    }

    /// Standardize a single sample.
    pub fn transform_sample(&self, features: &[f64]) -> Result<Vec<f64>, PipelineError> {
        self.check_width(features.len())?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    /// Map standardized rows back to the original units.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.check_width(x.ncols())?;
        let mean = Array1::from_vec(self.mean.clone());
        let std = Array1::from_vec(self.std.clone());
        Ok(x * &std + &mean)
    }
}

/// Fit a `Scaler` on `x`, where rows are samples and columns are features.
///
/// Fails with `DegenerateFeature` when a column has zero spread, since it
/// could not be scaled.
pub fn fit_scaler(x: &Array2<f64>, feature_names: &[String]) -> Result<Scaler, PipelineError> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    if feature_names.len() != ncols {
        return Err(PipelineError::ShapeMismatch {
            expected: feature_names.len(),
            found: ncols,
        });
    }

    let mean = x
        .mean_axis(Axis(0))
        .ok_or(PipelineError::EmptyDataset)?;
    let std = x.std_axis(Axis(0), 0.0);

    for (c, (&s, &m)) in std.iter().zip(mean.iter()).enumerate() {
        if !(s > Scaler::MIN_RELATIVE_STD * m.abs().max(1.0)) {
            return Err(PipelineError::DegenerateFeature {
                feature: feature_names[c].clone(),
                partition: "train".to_string(),
            });
        }
    }

    log::debug!("Fitted scaler: mean = {:?}, std = {:?}", mean, std);

    Ok(Scaler {
        mean: mean.to_vec(),
        std: std.to_vec(),
    })
}

/// Transform all rows using the provided `Scaler` and return a new matrix.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>, PipelineError> {
    sc.check_width(x.ncols())?;
    let mean = Array1::from_vec(sc.mean.clone());
    let std = Array1::from_vec(sc.std.clone());
    Ok((x - &mean) / &std)
}

/// Fit a scaler and return it with the transformed matrix.
pub fn fit_transform(
    x: &Array2<f64>,
    feature_names: &[String],
) -> Result<(Scaler, Array2<f64>), PipelineError> {
    let sc = fit_scaler(x, feature_names)?;
    let t = transform_all(x, &sc)?;
    Ok((sc, t))
}
