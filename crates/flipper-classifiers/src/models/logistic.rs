use ndarray::{s, Array2, Axis};

use crate::config::{ModelConfig, ModelType};
use crate::error::ModelError;
use crate::models::classifier_trait::{argmax_rows, Classifier, ProbabilisticClassifier};

/// Multinomial (softmax) logistic regression with an L2 penalty.
///
/// Minimizes the mean cross-entropy plus `||W||^2 / (2 * C * n)`, leaving
/// the intercepts unpenalized. The solver is Nesterov-accelerated gradient
/// descent with a fixed step `1 / L` and gradient-based adaptive restart,
/// starting from all-zero weights, so fitting is fully deterministic.
pub struct LogisticRegressionClassifier {
    name: String,
    c: f64,
    max_iterations: usize,
    tolerance: f64,
    /// `(n_classes, n_features + 1)`; column 0 holds the intercepts.
    weights: Option<Array2<f64>>,
    iterations: usize,
}

impl LogisticRegressionClassifier {
    pub fn new(params: ModelConfig) -> Self {
        let (c, max_iterations, tolerance) = match params.model_type {
            ModelType::LogisticRegression {
                c,
                max_iterations,
                tolerance,
            } => (c, max_iterations, tolerance),
            ref other => panic!(
                "Error: Expected ModelType::LogisticRegression params, got {:?}",
                other
            ),
        };
        LogisticRegressionClassifier {
            name: params.name,
            c,
            max_iterations,
            tolerance,
            weights: None,
            iterations: 0,
        }
    }

    /// Number of solver iterations used by the last successful fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn fitted_weights(&self) -> Result<&Array2<f64>, ModelError> {
        self.weights.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name.clone(),
        })
    }

    fn check_width(&self, w: &Array2<f64>, x: &Array2<f64>) -> Result<(), ModelError> {
        if w.ncols() != x.ncols() + 1 {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!(
                    "model was fitted on {} features, got {}",
                    w.ncols() - 1,
                    x.ncols()
                ),
            });
        }
        Ok(())
    }
}

/// Prepend a column of ones for the intercept.
fn augment(x: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(s![.., 1..]).assign(x);
    out
}

/// Row-wise softmax of the logits `x_aug · Wᵀ`.
fn softmax(x_aug: &Array2<f64>, w: &Array2<f64>) -> Array2<f64> {
    let mut z = x_aug.dot(&w.t());
    for mut row in z.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    z
}

/// Gradient of the penalized mean cross-entropy.
fn gradient(x_aug: &Array2<f64>, one_hot: &Array2<f64>, w: &Array2<f64>, l2: f64) -> Array2<f64> {
    let n = x_aug.nrows() as f64;
    let residual = softmax(x_aug, w) - one_hot;
    let mut grad = residual.t().dot(x_aug) / n;
    let mut penalized = grad.slice_mut(s![.., 1..]);
    penalized.scaled_add(l2, &w.slice(s![.., 1..]));
    grad
}

fn max_abs(a: &Array2<f64>) -> f64 {
    a.iter().fold(0.0, |m, v| m.max(v.abs()))
}

impl Classifier for LogisticRegressionClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), ModelError> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!("{} rows for {} labels", n, y.len()),
            });
        }

        let x_aug = augment(x);
        let mut one_hot = Array2::<f64>::zeros((n, n_classes));
        for (i, &label) in y.iter().enumerate() {
            one_hot[(i, label)] = 1.0;
        }

        let l2 = 1.0 / (self.c * n as f64);
        // Softmax curvature is bounded by 1/2 per sample, times the mean
        // squared row norm of the augmented design.
        let mean_sq_norm = x_aug.mapv(|v| v * v).sum() / n as f64;
        let lipschitz = 0.5 * mean_sq_norm + l2;
        let step = 1.0 / lipschitz;

        let shape = (n_classes, x_aug.ncols());
        let mut w_prev = Array2::<f64>::zeros(shape);
        let mut y_point = Array2::<f64>::zeros(shape);
        let mut t = 1.0f64;
        let mut grad_norm = f64::INFINITY;

        for iter in 0..self.max_iterations {
            let grad = gradient(&x_aug, &one_hot, &y_point, l2);
            grad_norm = max_abs(&grad);
            if grad_norm < self.tolerance {
                log::debug!(
                    "{}: converged after {} iterations (max gradient {:.3e})",
                    self.name,
                    iter,
                    grad_norm
                );
                self.weights = Some(y_point);
                self.iterations = iter;
                return Ok(());
            }

            let w_next = &y_point - &(&grad * step);
            let direction = &w_next - &w_prev;

            if (&grad * &direction).sum() > 0.0 {
                // Momentum is pointing uphill: restart from a plain step.
                t = 1.0;
                y_point = w_next.clone();
            } else {
                let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
                y_point = &w_next + &(&direction * ((t - 1.0) / t_next));
                t = t_next;
            }
            w_prev = w_next;
        }

        log::warn!(
            "{}: stopped after {} iterations with max gradient {:.3e}",
            self.name,
            self.max_iterations,
            grad_norm
        );
        Err(ModelError::Convergence {
            model: self.name.clone(),
            max_iterations: self.max_iterations,
            gradient_norm: grad_norm,
        })
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for LogisticRegressionClassifier {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let w = self.fitted_weights()?;
        self.check_width(w, x)?;
        Ok(softmax(&augment(x), w))
    }
}
