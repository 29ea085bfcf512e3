//! Classifiers over feature vectors.
//!
//! Every classifier owns an explicit [`ClassifierState`]. A fresh classifier
//! is `NotTrained`; the first successful [`Classifier::train`] moves it to
//! `Trained` and it never goes back. Re-training replaces the model in one
//! step, so concurrent `classify` calls see either the old or the new model.

pub mod knn;

use crate::core::feature_vector::{ClassLabel, FeatureVector};
use serde::{Deserialize, Serialize};

pub use knn::{majority_label, select_nearest, KnnClassifier, KnnConfig, KnnModel};

/// Training state of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    NotTrained,
    Trained,
}

impl std::fmt::Display for ClassifierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierState::NotTrained => write!(f, "not trained"),
            ClassifierState::Trained => write!(f, "trained"),
        }
    }
}

/// Classifier errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// `classify` called before a successful `train`
    NotTrained,
    /// `train` called with no samples
    EmptyTrainingSet,
    /// Construction parameter out of range
    InvalidParameter { name: &'static str, value: usize },
    /// A training sample is shorter than the configured feature count
    SampleTooShort { index: usize, len: usize, required: usize },
    /// A snapshot belongs to a different classifier family
    IncompatibleSnapshot(String),
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::NotTrained => write!(f, "classifier has not been trained"),
            ClassifierError::EmptyTrainingSet => write!(f, "training set is empty"),
            ClassifierError::InvalidParameter { name, value } => {
                write!(f, "invalid classifier parameter {name} = {value} (must be >= 1)")
            }
            ClassifierError::SampleTooShort {
                index,
                len,
                required,
            } => write!(
                f,
                "training sample {index} has {len} features, at least {required} required"
            ),
            ClassifierError::IncompatibleSnapshot(msg) => {
                write!(f, "incompatible model snapshot: {msg}")
            }
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Serializable model blob handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classifier", rename_all = "snake_case")]
pub enum ModelSnapshot {
    Knn(KnnModel),
}

impl ModelSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Trainable, queryable model over feature vectors.
pub trait Classifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn state(&self) -> ClassifierState;

    /// Replace the model with one learned from `samples`.
    fn train(&self, samples: Vec<FeatureVector>) -> Result<(), ClassifierError>;

    /// Label a sample. A sample whose length does not match the model
    /// yields [`ClassLabel::Unknown`] rather than an error.
    fn classify(&self, fv: &FeatureVector) -> Result<ClassLabel, ClassifierError>;

    /// The current model, if trained.
    fn model_snapshot(&self) -> Option<ModelSnapshot>;
}
