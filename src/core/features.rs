//! Stroke feature computation.
//!
//! Turns one completed touch trajectory into a fixed 35-dimensional feature
//! vector. The function is pure: the only context it needs beyond the points
//! themselves is the end time of the previous stroke.

use crate::core::feature_vector::{ClassLabel, FeatureVector};
use crate::measurement::types::TouchPoint;
use statrs::statistics::{Data, OrderStatistics};
use std::f64::consts::PI;

/// Minimum number of points a stroke needs before it is turned into features.
pub const MIN_STROKE_POINTS: usize = 10;

/// Names of the stroke features, in vector order.
pub const STROKE_FEATURE_NAMES: [&str; 35] = [
    "start_x",
    "start_y",
    "end_x",
    "end_y",
    "duration_ms",
    "inter_stroke_ms",
    "direct_distance",
    "mean_resultant_length",
    "velocity_p20",
    "velocity_p50",
    "velocity_p80",
    "acceleration_p20",
    "acceleration_p50",
    "acceleration_p80",
    "line_direction",
    "median_velocity_last3",
    "trajectory_length",
    "average_velocity",
    "median_acceleration_first5",
    "mid_pressure",
    "mid_area",
    "phone_orientation",
    "direction_flag",
    "distance_trajectory_ratio",
    "average_direction",
    "max_deviation",
    "deviation_p20",
    "deviation_p50",
    "deviation_p80",
    "first_area",
    "first_direction",
    "average_moving_direction",
    "average_curvature",
    "average_area",
    "max_area_position",
];

/// Number of stroke features.
pub const NUM_STROKE_FEATURES: usize = STROKE_FEATURE_NAMES.len();

/// Dominant direction of a stroke, encoded as a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl SwipeDirection {
    /// Classify by the larger axis of the end-to-end displacement.
    pub fn from_displacement(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx < 0.0 {
                SwipeDirection::Left
            } else {
                SwipeDirection::Right
            }
        } else if dy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        }
    }
}

/// Compute the stroke features for `points`.
///
/// Returns `None` for strokes shorter than [`MIN_STROKE_POINTS`].
/// `previous_stroke_end_ms` is the timestamp of the last point of the
/// previous stroke; without one the inter-stroke time is zero.
pub fn compute_stroke_features(
    points: &[TouchPoint],
    previous_stroke_end_ms: Option<i64>,
) -> Option<FeatureVector> {
    if points.len() < MIN_STROKE_POINTS {
        return None;
    }

    let first = &points[0];
    let last = &points[points.len() - 1];
    let mid = &points[points.len() / 2];
    let n = points.len() as f64;

    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let duration = (last.timestamp_ms - first.timestamp_ms) as f64;
    let inter_stroke = previous_stroke_end_ms
        .map(|prev| (last.timestamp_ms - prev) as f64)
        .unwrap_or(0.0);
    let direct_distance = dx.hypot(dy);

    let segments = segments(points);
    let angles: Vec<f64> = segments.iter().map(|s| s.angle).collect();
    let velocities = velocities(&segments);
    let accelerations = accelerations(&segments, &velocities);

    let trajectory_length: f64 = segments.iter().map(|s| s.length).sum();
    let average_velocity = if duration == 0.0 {
        0.0
    } else {
        trajectory_length / duration
    };
    let ratio = if trajectory_length == 0.0 {
        0.0
    } else {
        direct_distance / trajectory_length
    };

    let last3 = &velocities[velocities.len().saturating_sub(3)..];
    let first5 = &accelerations[..accelerations.len().min(5)];

    let deviations = deviations(points, dx, dy);
    let max_deviation = deviations.iter().copied().fold(0.0, f64::max);

    let curvatures: Vec<f64> = angles
        .windows(2)
        .map(|pair| wrap_angle(pair[1] - pair[0]))
        .collect();
    let (max_area_index, _) = points
        .iter()
        .enumerate()
        .fold((0usize, f64::MIN), |best, (i, p)| {
            if p.area > best.1 {
                (i, p.area)
            } else {
                best
            }
        });

    let values = vec![
        first.x,
        first.y,
        last.x,
        last.y,
        duration,
        inter_stroke,
        direct_distance,
        mean_resultant_length(&angles),
        percentile(&velocities, 20),
        percentile(&velocities, 50),
        percentile(&velocities, 80),
        percentile(&accelerations, 20),
        percentile(&accelerations, 50),
        percentile(&accelerations, 80),
        dy.atan2(dx),
        percentile(last3, 50),
        trajectory_length,
        average_velocity,
        percentile(first5, 50),
        mid.pressure,
        mid.area,
        mid.orientation,
        SwipeDirection::from_displacement(dx, dy) as i32 as f64,
        ratio,
        circular_mean(&angles),
        max_deviation,
        percentile(&deviations, 20),
        percentile(&deviations, 50),
        percentile(&deviations, 80),
        first.area,
        angles[0],
        mean(&angles),
        mean(&curvatures),
        points.iter().map(|p| p.area).sum::<f64>() / n,
        max_area_index as f64 / n,
    ];
    debug_assert_eq!(values.len(), NUM_STROKE_FEATURES);

    Some(FeatureVector::new(values, ClassLabel::Positive))
}

struct Segment {
    angle: f64,
    length: f64,
    dt: f64,
}

fn segments(points: &[TouchPoint]) -> Vec<Segment> {
    points
        .windows(2)
        .map(|pair| {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            Segment {
                angle: dy.atan2(dx),
                length: dx.hypot(dy),
                dt: (pair[1].timestamp_ms - pair[0].timestamp_ms) as f64,
            }
        })
        .collect()
}

/// Pairwise velocities. Segments with no elapsed time take the largest
/// observed velocity instead of dividing by zero.
fn velocities(segments: &[Segment]) -> Vec<f64> {
    let raw: Vec<Option<f64>> = segments
        .iter()
        .map(|s| (s.dt > 0.0).then(|| s.length / s.dt))
        .collect();
    let max = raw.iter().flatten().copied().fold(0.0, f64::max);
    raw.into_iter().map(|v| v.unwrap_or(max)).collect()
}

fn accelerations(segments: &[Segment], velocities: &[f64]) -> Vec<f64> {
    let raw: Vec<Option<f64>> = velocities
        .windows(2)
        .zip(segments.iter().skip(1))
        .map(|(pair, s)| (s.dt > 0.0).then(|| (pair[1] - pair[0]) / s.dt))
        .collect();
    let max = raw.iter().flatten().copied().fold(f64::MIN, f64::max);
    let max = if max == f64::MIN { 0.0 } else { max };
    raw.into_iter().map(|a| a.unwrap_or(max)).collect()
}

/// Absolute distance of every point from the start-to-end line.
fn deviations(points: &[TouchPoint], dx: f64, dy: f64) -> Vec<f64> {
    let norm = dx.hypot(dy);
    if norm == 0.0 {
        return vec![0.0; points.len()];
    }
    let (nx, ny) = (-dy / norm, dx / norm);
    let origin = &points[0];
    points
        .iter()
        .map(|p| ((p.x - origin.x) * nx + (p.y - origin.y) * ny).abs())
        .collect()
}

fn percentile(values: &[f64], p: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    Data::new(values.to_vec()).percentile(p)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Length of the mean unit vector of a set of angles, in `[0, 1]`.
fn mean_resultant_length(angles: &[f64]) -> f64 {
    let (s, c) = mean_sin_cos(angles);
    s.hypot(c)
}

fn circular_mean(angles: &[f64]) -> f64 {
    let (s, c) = mean_sin_cos(angles);
    s.atan2(c)
}

fn mean_sin_cos(angles: &[f64]) -> (f64, f64) {
    if angles.is_empty() {
        return (0.0, 0.0);
    }
    let n = angles.len() as f64;
    let s: f64 = angles.iter().map(|a| a.sin()).sum();
    let c: f64 = angles.iter().map(|a| a.cos()).sum();
    (s / n, c / n)
}

fn wrap_angle(a: f64) -> f64 {
    let mut a = a % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}
