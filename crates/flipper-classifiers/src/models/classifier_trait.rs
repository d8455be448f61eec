use ndarray::Array2;

use crate::error::ModelError;

/// Contract shared by every model variant of the evaluation run.
///
/// Labels are class indices in `0..n_classes`, as produced by the
/// `LabelEncoder`. Optional capabilities are discovered through the query
/// methods rather than by downcasting.
pub trait Classifier: Send + Sync {
    /// Fit the model on standardized features `x` and labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), ModelError>;

    /// Predict a class index per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError>;

    /// Human readable name for the model
    fn name(&self) -> &str;

    /// Capability query for per-class probability estimates.
    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        None
    }

    /// Native per-feature importance scores, when the model has them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// A classifier that can also estimate class membership probabilities.
pub trait ProbabilisticClassifier: Classifier {
    /// Returns an `(n_samples, n_classes)` matrix whose rows sum to 1.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError>;
}

/// Index of the largest entry of each row; the first one wins ties.
pub(crate) fn argmax_rows(p: &Array2<f64>) -> Vec<usize> {
    p.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (i, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}
