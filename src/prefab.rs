//! Ready-made run configurations.

use crate::classifier::{ClassifierError, KnnClassifier, KnnConfig};
use crate::core::features::STROKE_FEATURE_NAMES;
use crate::measurement::{EventKind, FeatureSelection, ReplayMeasurement, TouchMeasurement};
use crate::persistence::{restore_knn, PermanentStorage};

/// Number of leading stroke features used by the Touchalytics preset.
pub const TOUCHALYTICS_FEATURES: usize = 29;

/// Classifier parameters, train/test split and feature subset that belong
/// together.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub knn: KnnConfig,
    /// Share of each data source used for training during evaluation
    pub training_ratio: f64,
    /// Touch features fed to the classifier
    pub selection: FeatureSelection,
}

impl RunConfiguration {
    /// KNN over the first 29 stroke features with k = 7 and an even split.
    pub fn touchalytics() -> Self {
        Self {
            knn: KnnConfig {
                k: 7,
                num_features: TOUCHALYTICS_FEATURES,
            },
            training_ratio: 0.5,
            selection: FeatureSelection::only(
                &STROKE_FEATURE_NAMES,
                &STROKE_FEATURE_NAMES[..TOUCHALYTICS_FEATURES],
            ),
        }
    }

    /// Untrained classifier with the preset parameters.
    pub fn classifier(&self) -> Result<KnnClassifier, ClassifierError> {
        KnnClassifier::new(self.knn)
    }

    /// Classifier restored from `storage`, or an untrained one when no
    /// usable model was saved under `model_name`.
    pub fn restore_classifier(
        &self,
        storage: &dyn PermanentStorage,
        model_name: &str,
    ) -> Result<KnnClassifier, ClassifierError> {
        restore_knn(storage, model_name, self.knn)
    }

    /// Live touch collector restricted to the preset features.
    pub fn touch_measurement(&self) -> TouchMeasurement {
        TouchMeasurement::with_selection(self.selection.clone())
    }

    /// Replay collector for recorded touch samples.
    pub fn replay_measurement(&self) -> ReplayMeasurement {
        ReplayMeasurement::new(EventKind::TouchInput, self.selection.clone())
    }
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self::touchalytics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, ClassifierState};
    use crate::measurement::Measurement;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_touchalytics_preset() {
        let preset = RunConfiguration::touchalytics();
        assert_eq!(preset.knn, KnnConfig { k: 7, num_features: 29 });
        assert_eq!(preset.training_ratio, 0.5);
        assert_eq!(preset.selection.enabled_names().len(), TOUCHALYTICS_FEATURES);
        assert_eq!(preset.selection.enabled_names()[0], STROKE_FEATURE_NAMES[0]);
        assert!(!preset.selection.is_enabled_by_name(STROKE_FEATURE_NAMES[29]));
    }

    #[test]
    fn test_preset_measurements_share_selection() {
        let preset = RunConfiguration::touchalytics();
        let negatives = preset.replay_measurement().default_negative_samples();
        assert_eq!(negatives.len(), 20);
        assert!(negatives.iter().all(|fv| fv.len() == TOUCHALYTICS_FEATURES));
        assert_eq!(preset.touch_measurement().selection(), &preset.selection);
    }

    #[test]
    fn test_restore_without_model_is_untrained() {
        let preset = RunConfiguration::touchalytics();
        let knn = preset
            .restore_classifier(&MemoryStorage::new(), "missing")
            .unwrap();
        assert_eq!(knn.state(), ClassifierState::NotTrained);
        assert_eq!(knn.config(), preset.knn);
    }
}
