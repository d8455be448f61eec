use serde::{Deserialize, Serialize};

use crate::error::{ModelError, PipelineError};
use crate::models::classifier_trait::Classifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Rank a fitted model's native feature importances, highest first.
///
/// The sort is stable, so equal scores keep their feature-column order.
pub fn rank_feature_importance(
    model: &dyn Classifier,
    feature_names: &[String],
) -> Result<Vec<FeatureImportance>, PipelineError> {
    let scores = model
        .feature_importances()
        .ok_or_else(|| ModelError::UnsupportedModel {
            model: model.name().to_string(),
        })?;

    if scores.len() != feature_names.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: feature_names.len(),
            found: scores.len(),
        });
    }

    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(scores)
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for entry in &ranked {
        log::debug!("{:<20} {:.4}", entry.feature, entry.importance);
    }
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Stand-in model with fixed importances.
    struct Fixed(Option<Vec<f64>>);

    impl Classifier for Fixed {
        fn fit(&mut self, _: &Array2<f64>, _: &[usize], _: usize) -> Result<(), ModelError> {
            Ok(())
        }
        fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
            Ok(vec![0; x.nrows()])
        }
        fn name(&self) -> &str {
            "fixed"
        }
        fn feature_importances(&self) -> Option<Vec<f64>> {
            self.0.clone()
        }
    }

    fn names() -> Vec<String> {
        ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let model = Fixed(Some(vec![0.1, 0.4, 0.1, 0.4]));
        let ranked = rank_feature_importance(&model, &names()).unwrap();
        let order: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_unsupported_model() {
        let model = Fixed(None);
        assert_eq!(
            rank_feature_importance(&model, &names()),
            Err(PipelineError::Model(ModelError::UnsupportedModel {
                model: "fixed".to_string()
            }))
        );
    }

    #[test]
    fn test_length_mismatch() {
        let model = Fixed(Some(vec![1.0]));
        assert!(matches!(
            rank_feature_importance(&model, &names()),
            Err(PipelineError::ShapeMismatch { expected: 4, found: 1 })
        ));
    }
}
