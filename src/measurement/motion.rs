//! Device motion measurement.
//!
//! Keeps the latest accelerometer and orientation readings and samples them
//! on every periodic tick that follows a fresh reading. The exported vector
//! is `[timestamp, ax, ay, az, pitch, roll, azimuth]`.

use super::{EventKind, FeatureSelection, Measurement, MotionSource, RawEvent};
use crate::core::feature_vector::{ClassLabel, FeatureVector};

/// Names of the motion features, in vector order.
pub const MOTION_FEATURE_NAMES: [&str; 7] = [
    "timestamp_ms",
    "accel_x",
    "accel_y",
    "accel_z",
    "pitch",
    "roll",
    "azimuth",
];

#[derive(Debug, Clone)]
pub struct MotionMeasurement {
    selection: FeatureSelection,
    acceleration: [f64; 3],
    orientation: [f64; 3],
    /// Time of the newest reading not yet sampled
    pending_since: Option<i64>,
    completed: Option<FeatureVector>,
}

impl MotionMeasurement {
    pub fn new() -> Self {
        Self::with_selection(FeatureSelection::all(&MOTION_FEATURE_NAMES))
    }

    pub fn with_selection(selection: FeatureSelection) -> Self {
        Self {
            selection,
            acceleration: [0.0; 3],
            orientation: [0.0; 3],
            pending_since: None,
            completed: None,
        }
    }
}

impl Default for MotionMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurement for MotionMeasurement {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![EventKind::MotionEvent, EventKind::Periodic]
    }

    fn handle_event(&mut self, event: &RawEvent, kind: EventKind) -> bool {
        match (kind, event) {
            (EventKind::MotionEvent, RawEvent::Motion(reading)) => {
                match reading.source {
                    MotionSource::Accelerometer => self.acceleration = reading.values,
                    MotionSource::Orientation => self.orientation = reading.values,
                }
                self.pending_since = Some(reading.timestamp_ms);
                false
            }
            (EventKind::Periodic, _) => {
                let Some(timestamp) = self.pending_since.take() else {
                    return false;
                };
                let [ax, ay, az] = self.acceleration;
                let [pitch, roll, azimuth] = self.orientation;
                self.completed = Some(FeatureVector::new(
                    vec![timestamp as f64, ax, ay, az, pitch, roll, azimuth],
                    ClassLabel::Unknown,
                ));
                true
            }
            _ => false,
        }
    }

    fn export(&self) -> Option<FeatureVector> {
        self.completed.as_ref().map(|fv| self.selection.filter(fv))
    }

    /// A fresh collector keeps the last readings so one sensor updating
    /// does not zero the other axis group.
    fn fresh_instance(&self) -> Box<dyn Measurement> {
        let mut fresh = MotionMeasurement::with_selection(self.selection.clone());
        fresh.acceleration = self.acceleration;
        fresh.orientation = self.orientation;
        Box::new(fresh)
    }
}
