//! Measurements: stateful collectors that turn raw events into samples.
//!
//! A measurement subscribes to one or more [`EventKind`]s through the
//! [`Dispatcher`]. Every delivered event is buffered until the measurement
//! reports a complete sample, which the dispatcher then exports and routes
//! to storage (or to the durable log). The dispatcher replaces the
//! measurement with [`Measurement::fresh_instance`] after every export so no
//! in-progress state leaks into the next sample.

pub mod composite;
pub mod corpus;
pub mod dispatcher;
pub mod keystroke;
pub mod motion;
pub mod replay;
pub mod touch;
pub mod types;

use crate::core::feature_vector::FeatureVector;
use serde::{Deserialize, Serialize};

pub use composite::CompositeMeasurement;
pub use dispatcher::{DispatchReport, Dispatcher, SampleSink};
pub use keystroke::KeystrokeMeasurement;
pub use motion::MotionMeasurement;
pub use replay::ReplayMeasurement;
pub use touch::TouchMeasurement;
pub use types::{InputRecord, MotionReading, MotionSource, RawEvent, TouchAction, TouchPoint};

/// Kinds of events a measurement can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TouchInput,
    KeyInput,
    MotionEvent,
    /// Wall-clock tick emitted by the control loop
    Periodic,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::TouchInput,
        EventKind::KeyInput,
        EventKind::MotionEvent,
        EventKind::Periodic,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::TouchInput => write!(f, "touch_input"),
            EventKind::KeyInput => write!(f, "key_input"),
            EventKind::MotionEvent => write!(f, "motion_event"),
            EventKind::Periodic => write!(f, "periodic"),
        }
    }
}

/// Collector of raw events of interest.
pub trait Measurement: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Event kinds this measurement consumes.
    fn subscriptions(&self) -> Vec<EventKind>;

    /// Buffer an event. Returns true exactly when a full sample is ready.
    fn handle_event(&mut self, event: &RawEvent, kind: EventKind) -> bool;

    /// The completed sample restricted to the enabled features, if any.
    fn export(&self) -> Option<FeatureVector>;

    /// A new, independent collector of the same variant.
    fn fresh_instance(&self) -> Box<dyn Measurement>;

    /// Samples known to come from the device owner.
    fn default_positive_samples(&self) -> Vec<FeatureVector> {
        Vec::new()
    }

    /// Samples known to come from other people, used to bootstrap training.
    fn default_negative_samples(&self) -> Vec<FeatureVector> {
        Vec::new()
    }
}

/// Which of a measurement's features are exported.
///
/// Indices past the end of the flag list are treated as enabled, so a
/// selection built for an older, shorter feature list keeps new features.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSelection {
    names: Vec<String>,
    enabled: Vec<bool>,
}

impl FeatureSelection {
    /// Every named feature enabled.
    pub fn all<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            enabled: vec![true; names.len()],
        }
    }

    /// Only the listed features enabled. Unknown names are ignored.
    pub fn only<S: AsRef<str>>(names: &[S], keep: &[&str]) -> Self {
        let mut selection = Self::all(names);
        for (name, flag) in selection.names.iter().zip(selection.enabled.iter_mut()) {
            *flag = keep.contains(&name.as_str());
        }
        selection
    }

    /// Enable or disable a feature by name. Returns false for an unknown name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(index) => {
                self.enabled[index] = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, index: usize) -> bool {
        self.enabled.get(index).copied().unwrap_or(true)
    }

    pub fn is_enabled_by_name(&self, name: &str) -> bool {
        self.names
            .iter()
            .position(|n| n == name)
            .map_or(true, |index| self.is_enabled(index))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names of the enabled features, in vector order.
    pub fn enabled_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.enabled)
            .filter(|(_, &on)| on)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Number of features exported from a vector of `len` features.
    pub fn output_len(&self, len: usize) -> usize {
        (0..len).filter(|&i| self.is_enabled(i)).count()
    }

    /// Copy of `fv` with disabled features dropped; the label is kept.
    pub fn filter(&self, fv: &FeatureVector) -> FeatureVector {
        let values = fv
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_enabled(*i))
            .map(|(_, v)| *v)
            .collect();
        FeatureVector::new(values, fv.label())
    }
}
