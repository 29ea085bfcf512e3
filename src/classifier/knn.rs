//! k-nearest-neighbor classifier.
//!
//! A lazy learner: training stores the samples, classification scans all of
//! them. Neighbors are picked by repeated argmin-and-remove so that equal
//! distances resolve to the earliest stored sample.

use super::{Classifier, ClassifierError, ClassifierState, ModelSnapshot};
use crate::core::feature_vector::{ClassLabel, FeatureVector};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Neighbors consulted per query
    pub k: usize,
    /// Leading dimensions used for the distance
    pub num_features: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: 7,
            num_features: 29,
        }
    }
}

impl KnnConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.k < 1 {
            return Err(ClassifierError::InvalidParameter {
                name: "k",
                value: self.k,
            });
        }
        if self.num_features < 1 {
            return Err(ClassifierError::InvalidParameter {
                name: "num_features",
                value: self.num_features,
            });
        }
        Ok(())
    }
}

/// A trained model: parameters plus every training sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnModel {
    pub k: usize,
    pub num_features: usize,
    pub samples: Vec<FeatureVector>,
}

impl KnnModel {
    fn distance(&self, sample: &FeatureVector, query: &FeatureVector) -> f64 {
        sample.as_slice()[..self.num_features]
            .iter()
            .zip(&query.as_slice()[..self.num_features])
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn classify(&self, query: &FeatureVector) -> ClassLabel {
        let expected = self.samples.first().map_or(0, FeatureVector::len);
        if query.len() != expected {
            tracing::warn!(
                query_len = query.len(),
                expected,
                "feature vector size mismatch, returning neutral label"
            );
            return ClassLabel::Unknown;
        }

        let distances: Vec<(f64, ClassLabel)> = self
            .samples
            .iter()
            .map(|s| (self.distance(s, query), s.label()))
            .collect();
        let nearest = select_nearest(distances, self.k);
        majority_label(nearest.iter().map(|(_, label)| *label))
    }
}

/// The `k` entries with the smallest distance, in ascending order.
///
/// Each step takes the first entry with the strictly smallest distance and
/// removes it, so ties go to the earliest entry. Fewer than `k` entries
/// yields all of them.
pub fn select_nearest<T>(mut candidates: Vec<(f64, T)>, k: usize) -> Vec<(f64, T)> {
    let mut selected = Vec::with_capacity(k.min(candidates.len()));
    for _ in 0..k {
        let mut min_distance = f64::MAX;
        let mut min_index = None;
        for (i, (distance, _)) in candidates.iter().enumerate() {
            if *distance < min_distance {
                min_distance = *distance;
                min_index = Some(i);
            }
        }
        match min_index {
            Some(i) => selected.push(candidates.remove(i)),
            None => break,
        }
    }
    selected
}

/// Majority vote over labels.
///
/// The label with the highest count wins. Equal counts resolve to the label
/// that comes first in [`ClassLabel`] order. No labels yields `Unknown`.
pub fn majority_label(labels: impl IntoIterator<Item = ClassLabel>) -> ClassLabel {
    let mut counts: BTreeMap<ClassLabel, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }

    let mut winner = ClassLabel::Unknown;
    let mut max = 0;
    for (label, count) in counts {
        if count > max {
            winner = label;
            max = count;
        }
    }
    winner
}

/// KNN classifier whose model is swapped atomically on every training.
#[derive(Debug)]
pub struct KnnClassifier {
    config: RwLock<KnnConfig>,
    model: RwLock<Option<Arc<KnnModel>>>,
}

impl KnnClassifier {
    /// Create an untrained classifier. Fails when `k` or `num_features` is 0.
    pub fn new(config: KnnConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
            model: RwLock::new(None),
        })
    }

    /// Rebuild a trained classifier from a persisted model.
    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self, ClassifierError> {
        let ModelSnapshot::Knn(model) = snapshot;
        let config = KnnConfig {
            k: model.k,
            num_features: model.num_features,
        };
        config.validate()?;
        if model.samples.is_empty() {
            return Err(ClassifierError::IncompatibleSnapshot(
                "knn snapshot holds no samples".to_string(),
            ));
        }
        check_sample_lengths(&model.samples, config.num_features)?;

        Ok(Self {
            config: RwLock::new(config),
            model: RwLock::new(Some(Arc::new(model))),
        })
    }

    pub fn config(&self) -> KnnConfig {
        *self.config.read()
    }

    /// Change `k` for subsequent trainings and queries.
    pub fn set_k(&self, k: usize) -> Result<(), ClassifierError> {
        let mut config = self.config.write();
        let updated = KnnConfig { k, ..*config };
        updated.validate()?;
        *config = updated;

        let mut model = self.model.write();
        if let Some(current) = model.as_ref() {
            let mut replaced = KnnModel::clone(current);
            replaced.k = k;
            *model = Some(Arc::new(replaced));
        }
        Ok(())
    }

    /// Number of stored training samples.
    pub fn sample_count(&self) -> usize {
        self.model.read().as_ref().map_or(0, |m| m.samples.len())
    }
}

fn check_sample_lengths(samples: &[FeatureVector], required: usize) -> Result<(), ClassifierError> {
    match samples.iter().position(|s| s.len() < required) {
        Some(index) => Err(ClassifierError::SampleTooShort {
            index,
            len: samples[index].len(),
            required,
        }),
        None => Ok(()),
    }
}

impl Classifier for KnnClassifier {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn state(&self) -> ClassifierState {
        if self.model.read().is_some() {
            ClassifierState::Trained
        } else {
            ClassifierState::NotTrained
        }
    }

    fn train(&self, samples: Vec<FeatureVector>) -> Result<(), ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let config = self.config();
        check_sample_lengths(&samples, config.num_features)?;

        let model = Arc::new(KnnModel {
            k: config.k,
            num_features: config.num_features,
            samples,
        });
        tracing::debug!(
            samples = model.samples.len(),
            k = model.k,
            num_features = model.num_features,
            "knn model trained"
        );
        *self.model.write() = Some(model);
        Ok(())
    }

    fn classify(&self, fv: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        // Clone the Arc so the scan runs without holding the lock.
        let model = self
            .model
            .read()
            .clone()
            .ok_or(ClassifierError::NotTrained)?;
        Ok(model.classify(fv))
    }

    fn model_snapshot(&self) -> Option<ModelSnapshot> {
        self.model
            .read()
            .as_ref()
            .map(|m| ModelSnapshot::Knn(KnnModel::clone(m)))
    }
}
