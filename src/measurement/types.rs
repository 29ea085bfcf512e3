//! Raw event payloads delivered to measurements.
//!
//! Events are opaque to the dispatcher: each payload only has to be
//! understood by the measurements subscribed to its [`EventKind`].

use crate::core::feature_vector::FeatureVector;
use crate::measurement::EventKind;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// One sampled point of a touch trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Time the point was sampled
    pub timestamp_ms: i64,
    pub x: f64,
    pub y: f64,
    /// Normalized contact pressure
    #[serde(default)]
    pub pressure: f64,
    /// Normalized contact area
    #[serde(default)]
    pub area: f64,
    /// Device orientation while the point was sampled
    #[serde(default)]
    pub orientation: f64,
}

impl TouchPoint {
    /// Create a point sampled now with neutral pressure, area and orientation.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            timestamp_ms: now_ms(),
            x,
            y,
            pressure: 0.0,
            area: 0.0,
            orientation: 0.0,
        }
    }
}

/// Phases of a touch gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    /// First pointer went down
    Down,
    /// Pointers moved; carries every sampled point since the last move
    Move { points: Vec<TouchPoint> },
    /// All pointers lifted
    Up,
    /// Gesture aborted by the host
    Cancel,
}

/// Inertial sensor that produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionSource {
    /// x, y, z acceleration
    Accelerometer,
    /// pitch, roll, azimuth
    Orientation,
}

/// A single three-axis sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionReading {
    pub timestamp_ms: i64,
    pub source: MotionSource,
    pub values: [f64; 3],
}

/// Payload handed to [`crate::measurement::Dispatcher::dispatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEvent {
    /// Touch gesture phase
    Touch(TouchAction),
    /// New contents of a text field
    Text { text: String, timestamp_ms: i64 },
    /// Inertial sensor reading
    Motion(MotionReading),
    /// A pre-computed sample replayed from a dataset
    Sample(FeatureVector),
    /// Housekeeping tick from the control loop
    Tick,
}

impl RawEvent {
    /// Text-field contents observed now.
    pub fn text(text: impl Into<String>) -> Self {
        RawEvent::Text {
            text: text.into(),
            timestamp_ms: now_ms(),
        }
    }
}

/// A kind-tagged event, as read from JSON-lines input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub kind: EventKind,
    pub event: RawEvent,
}
