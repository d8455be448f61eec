pub mod forest;
pub mod logistic;
pub mod svm;

pub mod classifier_trait;
pub mod factory;

pub use classifier_trait::{Classifier, ProbabilisticClassifier};
