use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};

use crate::config::{ModelConfig, ModelType};
use crate::error::ModelError;
use crate::models::classifier_trait::{argmax_rows, Classifier, ProbabilisticClassifier};

/// One-vs-rest gaussian-kernel SVM with Platt-scaled outputs.
///
/// One binary machine is trained per class. Their calibrated outputs are
/// normalized per sample into class probabilities.
pub struct SVMClassifier {
    name: String,
    c: f64,
    gaussian_kernel_eps: Option<f64>,
    eps: f64,
    machines: Vec<Svm<f64, Pr>>,
    n_features: usize,
}

impl SVMClassifier {
    pub fn new(params: ModelConfig) -> Self {
        let (c, gaussian_kernel_eps, eps) = match params.model_type {
            ModelType::SVM {
                c,
                gaussian_kernel_eps,
                eps,
            } => (c, gaussian_kernel_eps, eps),
            ref other => panic!("Error: Expected ModelType::SVM params, got {:?}", other),
        };
        SVMClassifier {
            name: params.name,
            c,
            gaussian_kernel_eps,
            eps,
            machines: Vec::new(),
            n_features: 0,
        }
    }

    /// Kernel width: configured value, or `n_features * var(x)`.
    fn kernel_eps(&self, x: &Array2<f64>) -> f64 {
        if let Some(eps) = self.gaussian_kernel_eps {
            return eps;
        }
        let mean = x.mean().unwrap_or(0.0);
        let var = x.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(0.0);
        let scale = x.ncols() as f64 * var;
        if scale > 0.0 {
            scale
        } else {
            1.0
        }
    }

    fn fit_machine(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        class: usize,
        kernel_eps: f64,
    ) -> Result<Svm<f64, Pr>, ModelError> {
        // Convert labels to [true, false]: the current class against the rest.
        let targets: Array1<bool> = y.iter().map(|&l| l == class).collect();
        let positives = targets.iter().filter(|&&t| t).count();
        if positives == 0 || positives == targets.len() {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!("class {} needs both positive and negative samples", class),
            });
        }

        let dataset = DatasetBase::new(x.to_owned(), targets);
        let model: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c)
            .gaussian_kernel(kernel_eps);

        <SvmParams<f64, Pr> as Fit<_, _, _>>::fit(&model, &dataset).map_err(|e| ModelError::Fit {
            model: self.name.clone(),
            reason: format!("class {}: {}", class, e),
        })
    }

    fn scores(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        if self.machines.is_empty() {
            return Err(ModelError::NotFitted {
                model: self.name.clone(),
            });
        }
        if x.ncols() != self.n_features {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!(
                    "model was fitted on {} features, got {}",
                    self.n_features,
                    x.ncols()
                ),
            });
        }
        let mut scores = Array2::<f64>::zeros((x.nrows(), self.machines.len()));
        for (class, machine) in self.machines.iter().enumerate() {
            let predictions: Array1<Pr> = machine.predict(x);
            for (row, &p) in predictions.iter().enumerate() {
                scores[(row, class)] = *p as f64;
            }
        }
        Ok(scores)
    }
}

impl Classifier for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), ModelError> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!("{} rows for {} labels", x.nrows(), y.len()),
            });
        }
        let kernel_eps = self.kernel_eps(x);
        log::debug!(
            "{}: {} one-vs-rest machines, gaussian kernel eps {:.4}, C {}",
            self.name,
            n_classes,
            kernel_eps,
            self.c
        );

        let machines = (0..n_classes)
            .map(|class| self.fit_machine(x, y, class, kernel_eps))
            .collect::<Result<Vec<_>, _>>()?;

        self.machines = machines;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        Ok(argmax_rows(&self.scores(x)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for SVMClassifier {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let mut scores = self.scores(x)?;
        let n_classes = scores.ncols() as f64;
        for mut row in scores.rows_mut() {
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            } else {
                row.fill(1.0 / n_classes);
            }
        }
        Ok(scores)
    }
}
