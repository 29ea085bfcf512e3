//! Core data types for the trust agent.
//!
//! This module contains:
//! - Labelled feature vectors and their deflated text encoding
//! - Binned storage of collected samples
//! - Stroke feature computation for touch trajectories

pub mod deflate;
pub mod feature_vector;
pub mod features;
pub mod storage;

// Re-export commonly used types
pub use deflate::{deflate, parse_deflated, parse_deflated_auto, parse_lines, DeflateError};
pub use feature_vector::{ClassLabel, FeatureVector, FeatureVectorError};
pub use features::{
    compute_stroke_features, SwipeDirection, MIN_STROKE_POINTS, NUM_STROKE_FEATURES,
    STROKE_FEATURE_NAMES,
};
pub use storage::{BinLabel, DataStorage, StorageConfig, StorageError};
