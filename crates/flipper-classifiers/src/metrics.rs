//! Classification metrics computed against the true test labels.
use ndarray::Array2;
use serde::Serialize;

/// Fraction of positions where `y_pred` equals `y_true`.
///
/// Returns 0 for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "Predictions and labels must have equal lengths"
    );
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Counts of (true label, predicted label) pairs.
///
/// Rows index the true class, columns the predicted class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "Predictions and labels must have equal lengths"
        );
        let mut counts = Array2::zeros((n_classes, n_classes));
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[(t, p)] += 1;
        }
        ConfusionMatrix { counts }
    }

    pub fn n_classes(&self) -> usize {
        self.counts.nrows()
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    pub fn correct(&self) -> usize {
        self.counts.diag().sum()
    }

    /// Number of samples whose true class is `class`.
    pub fn support(&self, class: usize) -> usize {
        self.counts.row(class).sum()
    }

    pub fn predicted(&self, class: usize) -> usize {
        self.counts.column(class).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 plus macro and weighted averages.
///
/// Undefined ratios (no predictions or no support) are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let per_class: Vec<ClassMetrics> = (0..cm.n_classes())
            .map(|c| {
                let tp = cm.counts[(c, c)];
                let precision = ratio(tp, cm.predicted(c));
                let recall = ratio(tp, cm.support(c));
                ClassMetrics {
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support: cm.support(c),
                }
            })
            .collect();

        let total = cm.total();
        let n = per_class.len().max(1) as f64;
        let macro_avg = ClassMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n,
            support: total,
        };

        let weighted = |get: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|m| get(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: ratio(cm.correct(), total),
            per_class,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        Self::from_confusion(&ConfusionMatrix::new(y_true, y_pred, n_classes))
    }
}
