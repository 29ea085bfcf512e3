//! Replay of pre-computed samples.
//!
//! Used for offline evaluation: every [`RawEvent::Sample`] payload is taken
//! as a completed sample and exported through the same feature selection a
//! live touch measurement would apply.

use super::corpus;
use super::{EventKind, FeatureSelection, Measurement, RawEvent};
use crate::core::feature_vector::FeatureVector;
use crate::core::features::STROKE_FEATURE_NAMES;

#[derive(Debug, Clone)]
pub struct ReplayMeasurement {
    kind: EventKind,
    selection: FeatureSelection,
    sample: Option<FeatureVector>,
}

impl ReplayMeasurement {
    /// Replay stroke samples delivered as touch input.
    pub fn touch() -> Self {
        Self::new(
            EventKind::TouchInput,
            FeatureSelection::all(&STROKE_FEATURE_NAMES),
        )
    }

    pub fn new(kind: EventKind, selection: FeatureSelection) -> Self {
        Self {
            kind,
            selection,
            sample: None,
        }
    }
}

impl Measurement for ReplayMeasurement {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![self.kind]
    }

    fn handle_event(&mut self, event: &RawEvent, _kind: EventKind) -> bool {
        match event {
            RawEvent::Sample(fv) => {
                self.sample = Some(fv.clone());
                true
            }
            _ => false,
        }
    }

    fn export(&self) -> Option<FeatureVector> {
        self.sample.as_ref().map(|fv| self.selection.filter(fv))
    }

    fn fresh_instance(&self) -> Box<dyn Measurement> {
        Box::new(ReplayMeasurement::new(self.kind, self.selection.clone()))
    }

    fn default_positive_samples(&self) -> Vec<FeatureVector> {
        if self.kind != EventKind::TouchInput {
            return Vec::new();
        }
        corpus::positive_samples()
            .iter()
            .map(|fv| self.selection.filter(fv))
            .collect()
    }

    fn default_negative_samples(&self) -> Vec<FeatureVector> {
        if self.kind != EventKind::TouchInput {
            return Vec::new();
        }
        corpus::negative_samples()
            .iter()
            .map(|fv| self.selection.filter(fv))
            .collect()
    }
}
