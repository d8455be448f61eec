use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_trees::{DecisionTree, SplitQuality, TreeNode};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::error::ModelError;
use crate::models::classifier_trait::{argmax_rows, Classifier, ProbabilisticClassifier};

/// One bagged tree together with the feature columns it was grown on.
struct ForestTree {
    tree: DecisionTree<f64, usize>,
    features: Vec<usize>,
    /// Gini decrease per global feature column, normalized to sum to 1
    /// unless the tree is a single leaf.
    importance: Vec<f64>,
}

/// Gini impurity of `rows` times their count.
fn weighted_gini(rows: &[usize], targets: &Array1<usize>, n_classes: usize) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mut counts = vec![0usize; n_classes];
    for &r in rows {
        counts[targets[r]] += 1;
    }
    let n = rows.len() as f64;
    let sum_sq: f64 = counts.iter().map(|&c| (c as f64 / n).powi(2)).sum();
    n * (1.0 - sum_sq)
}

/// Route `rows` down the tree and add each split's Gini decrease to the
/// column it splits on.
///
/// Counts are integers and the traversal order is fixed, so the result is
/// bit-identical between runs.
fn accumulate_gini_decrease(
    node: &TreeNode<f64, usize>,
    rows: Vec<usize>,
    records: &Array2<f64>,
    targets: &Array1<usize>,
    n_classes: usize,
    out: &mut [f64],
) {
    if node.is_leaf() || rows.is_empty() {
        return;
    }
    let (feature, threshold, _) = node.split();
    let (left, right): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&r| records[(r, feature)] < threshold);

    let decrease = weighted_gini(&rows, targets, n_classes)
        - weighted_gini(&left, targets, n_classes)
        - weighted_gini(&right, targets, n_classes);
    out[feature] += decrease.max(0.0);

    let children = node.children();
    if let Some(Some(child)) = children.first() {
        accumulate_gini_decrease(child, left, records, targets, n_classes, out);
    }
    if let Some(Some(child)) = children.get(1) {
        accumulate_gini_decrease(child, right, records, targets, n_classes, out);
    }
}

/// Bagged ensemble of Gini decision trees.
///
/// Every tree sees a bootstrap sample of the rows and a random subset of the
/// feature columns. Tree `t` draws from `StdRng::seed_from_u64(seed + t)`,
/// so the fitted forest does not depend on how rayon schedules the work.
pub struct RandomForestClassifier {
    name: String,
    n_trees: usize,
    max_depth: Option<usize>,
    feature_subsample: f64,
    seed: u64,
    trees: Vec<ForestTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: ModelConfig, default_seed: u64) -> Self {
        let (n_trees, max_depth, feature_subsample, seed) = match params.model_type {
            ModelType::RandomForest {
                n_trees,
                max_depth,
                feature_subsample,
                seed,
            } => (n_trees, max_depth, feature_subsample, seed.unwrap_or(default_seed)),
            ref other => panic!(
                "Error: Expected ModelType::RandomForest params, got {:?}",
                other
            ),
        };
        RandomForestClassifier {
            name: params.name,
            n_trees,
            max_depth,
            feature_subsample,
            seed,
            trees: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    fn grow_tree(
        &self,
        index: usize,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        n_sub: usize,
    ) -> Result<ForestTree, ModelError> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        let n = x.nrows();

        let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(&mut rng);
        features.truncate(n_sub);
        features.sort_unstable();

        let records = x.select(Axis(0), &rows).select(Axis(1), &features);
        let targets: Array1<usize> = rows.iter().map(|&r| y[r]).collect();
        let dataset = DatasetBase::new(records, targets);

        let tree = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(self.max_depth)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit {
                model: self.name.clone(),
                reason: format!("tree {}: {}", index, e),
            })?;

        let mut local = vec![0.0; features.len()];
        accumulate_gini_decrease(
            tree.root_node(),
            (0..n).collect(),
            dataset.records(),
            dataset.targets(),
            n_classes,
            &mut local,
        );
        let total: f64 = local.iter().sum();
        let mut importance = vec![0.0; x.ncols()];
        if total > 0.0 {
            for (&feature, score) in features.iter().zip(&local) {
                importance[feature] = score / total;
            }
        }

        Ok(ForestTree {
            tree,
            features,
            importance,
        })
    }

    fn votes(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        if self.trees.is_empty() {
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
        let mut votes = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        let weight = 1.0 / self.trees.len() as f64;
        for member in &self.trees {
            let sub = x.select(Axis(1), &member.features);
            let predicted: Array1<usize> = member.tree.predict(&sub);
            for (row, &label) in predicted.iter().enumerate() {
                votes[(row, label)] += weight;
            }
        }
        Ok(votes)
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), ModelError> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ModelError::Fit {
                model: self.name.clone(),
                reason: format!("{} rows for {} labels", x.nrows(), y.len()),
            });
        }
        let n_sub = ((x.ncols() as f64 * self.feature_subsample).ceil() as usize).clamp(1, x.ncols());
        log::debug!(
            "{}: growing {} trees, {} of {} features each, max_depth {:?}",
            self.name,
            self.n_trees,
            n_sub,
            x.ncols(),
            self.max_depth
        );

        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|t| self.grow_tree(t, x, y, n_classes, n_sub))
            .collect::<Result<Vec<_>, _>>()?;

        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        Ok(argmax_rows(&self.votes(x)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }

    /// Mean per-tree Gini decrease per feature, normalized to sum to 1.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut importance = vec![0.0; self.n_features];
        for member in &self.trees {
            for (total, score) in importance.iter_mut().zip(&member.importance) {
                *total += score;
            }
        }
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        } else {
            // Only single-leaf trees: no split ever reduced impurity.
            let uniform = 1.0 / self.n_features as f64;
            importance.iter_mut().for_each(|v| *v = uniform);
        }
        Some(importance)
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.votes(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn forest(seed: u64) -> RandomForestClassifier {
        RandomForestClassifier::new(
            ModelConfig::new(ModelType::RandomForest {
                n_trees: 15,
                max_depth: Some(4),
                feature_subsample: 1.0,
                seed: Some(seed),
            }),
            0,
        )
    }

    #[test]
    fn test_random_forest_classifier() {
        // The first column separates the classes, the second is noise.
        let x = array![
            [-2.0, 0.3],
            [-1.8, -0.4],
            [-2.2, 0.1],
            [-1.9, 0.9],
            [2.0, 0.2],
            [1.7, -0.8],
            [2.1, 0.5],
            [2.3, -0.1]
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1];

        let mut model = forest(3);
        model.fit(&x, &y, 2).unwrap();

        assert_eq!(model.predict(&x).unwrap(), y);

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }

        let importance = model.feature_importances().unwrap();
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importance[0] > importance[1]);
    }

    #[test]
    fn test_importances_are_reproducible() {
        let x = array![
            [-2.0, 0.3, 1.0],
            [-1.8, -0.4, 0.2],
            [-2.2, 0.1, -0.7],
            [-1.9, 0.9, 0.4],
            [2.0, 0.2, -0.3],
            [1.7, -0.8, 0.8],
            [2.1, 0.5, -1.1],
            [2.3, -0.1, 0.6],
            [0.1, 2.0, 0.0],
            [-0.2, 2.2, 0.5],
            [0.3, 1.8, -0.4],
            [0.0, 2.4, 0.1]
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];

        let mut first = forest(11);
        first.fit(&x, &y, 3).unwrap();
        for _ in 0..5 {
            let mut again = forest(11);
            again.fit(&x, &y, 3).unwrap();
            assert_eq!(first.feature_importances(), again.feature_importances());
            assert_eq!(first.predict(&x).unwrap(), again.predict(&x).unwrap());
        }
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let x = array![[-1.0, 0.0], [-1.2, 0.1], [1.0, 0.0], [1.1, -0.1]];
        let mut model = forest(5);
        model.fit(&x, &[0, 0, 1, 1], 2).unwrap();
        assert!(matches!(
            model.predict(&array![[0.0]]),
            Err(ModelError::Fit { .. })
        ));
        assert!(matches!(
            model.predict_proba(&array![[0.0, 1.0, 2.0]]),
            Err(ModelError::Fit { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = forest(1);
        assert!(matches!(
            model.predict(&array![[0.0, 0.0]]),
            Err(ModelError::NotFitted { .. })
        ));
    }
}
