//! Touch stroke measurement.

use super::corpus;
use super::{EventKind, FeatureSelection, Measurement, RawEvent, TouchAction, TouchPoint};
use crate::core::feature_vector::FeatureVector;
use crate::core::features::{compute_stroke_features, MIN_STROKE_POINTS, STROKE_FEATURE_NAMES};

/// Buffers touch points between pointer-down and pointer-up and turns each
/// long enough stroke into a stroke feature vector labelled Positive.
#[derive(Debug, Clone)]
pub struct TouchMeasurement {
    selection: FeatureSelection,
    points: Vec<TouchPoint>,
    /// Last point time of the previous stroke, carried across instances
    last_stroke_end: Option<i64>,
    completed: Option<FeatureVector>,
}

impl TouchMeasurement {
    /// Export every stroke feature.
    pub fn new() -> Self {
        Self::with_selection(FeatureSelection::all(&STROKE_FEATURE_NAMES))
    }

    pub fn with_selection(selection: FeatureSelection) -> Self {
        Self {
            selection,
            points: Vec::new(),
            last_stroke_end: None,
            completed: None,
        }
    }

    pub fn selection(&self) -> &FeatureSelection {
        &self.selection
    }

    /// Points buffered for the stroke in progress.
    pub fn pending_points(&self) -> usize {
        self.points.len()
    }

    fn finish_stroke(&mut self) -> bool {
        let points = std::mem::take(&mut self.points);
        if points.len() < MIN_STROKE_POINTS {
            tracing::debug!(points = points.len(), "stroke too short, discarded");
            return false;
        }
        match compute_stroke_features(&points, self.last_stroke_end) {
            Some(fv) => {
                self.last_stroke_end = points.last().map(|p| p.timestamp_ms);
                self.completed = Some(fv);
                true
            }
            None => false,
        }
    }
}

impl Default for TouchMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurement for TouchMeasurement {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![EventKind::TouchInput]
    }

    fn handle_event(&mut self, event: &RawEvent, _kind: EventKind) -> bool {
        let RawEvent::Touch(action) = event else {
            return false;
        };
        match action {
            TouchAction::Down => {
                self.points.clear();
                false
            }
            TouchAction::Move { points } => {
                self.points.extend_from_slice(points);
                false
            }
            TouchAction::Up | TouchAction::Cancel => self.finish_stroke(),
        }
    }

    fn export(&self) -> Option<FeatureVector> {
        self.completed.as_ref().map(|fv| self.selection.filter(fv))
    }

    fn fresh_instance(&self) -> Box<dyn Measurement> {
        let mut fresh = TouchMeasurement::with_selection(self.selection.clone());
        fresh.last_stroke_end = self.last_stroke_end;
        Box::new(fresh)
    }

    fn default_positive_samples(&self) -> Vec<FeatureVector> {
        corpus::positive_samples()
            .iter()
            .map(|fv| self.selection.filter(fv))
            .collect()
    }

    fn default_negative_samples(&self) -> Vec<FeatureVector> {
        corpus::negative_samples()
            .iter()
            .map(|fv| self.selection.filter(fv))
            .collect()
    }
}
