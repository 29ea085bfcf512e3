//! Labelled feature vectors, the unit of data moving through the pipeline.
//!
//! A [`FeatureVector`] is created by a measurement when a sample completes
//! (or by parsing a deflated log line) and is read-only once stored in a
//! bin, except for explicit label correction while partitioning datasets.

use serde::{Deserialize, Serialize};

/// Class label attached to every feature vector.
///
/// The variant order is the enumeration order used to break ties in the
/// nearest-neighbor majority vote.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClassLabel {
    /// A sample from someone other than the device owner
    Negative,
    /// Not known, or a neutral classification result
    #[default]
    Unknown,
    /// A sample from the device owner
    Positive,
}

impl ClassLabel {
    /// Integer encoding used by the deflated text format and score history.
    pub fn as_i32(self) -> i32 {
        match self {
            ClassLabel::Positive => 1,
            ClassLabel::Negative => -1,
            ClassLabel::Unknown => 0,
        }
    }

    /// Strict decoding: only -1, 0 and 1 are valid labels.
    pub fn try_from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(ClassLabel::Positive),
            -1 => Some(ClassLabel::Negative),
            0 => Some(ClassLabel::Unknown),
            _ => None,
        }
    }

    /// Lenient decoding: anything other than +1/-1 is Unknown.
    pub fn from_i32_lenient(value: i32) -> Self {
        Self::try_from_i32(value).unwrap_or(ClassLabel::Unknown)
    }

    /// Whether this label carries a decision (Positive or Negative).
    pub fn is_decisive(self) -> bool {
        self != ClassLabel::Unknown
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassLabel::Positive => write!(f, "positive"),
            ClassLabel::Negative => write!(f, "negative"),
            ClassLabel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Errors raised by feature vector construction and access.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureVectorError {
    /// A vector must hold at least one feature
    EmptyVector,
    /// Index outside `[0, len)`
    OutOfBounds { index: usize, len: usize },
}

impl std::fmt::Display for FeatureVectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureVectorError::EmptyVector => write!(f, "feature vector length must be >= 1"),
            FeatureVectorError::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for feature vector of size {len}")
            }
        }
    }
}

impl std::error::Error for FeatureVectorError {}

/// Fixed-length numeric sample with a class label.
///
/// Cloning copies the underlying buffer; two vectors never alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    features: Vec<f64>,
    label: ClassLabel,
}

impl FeatureVector {
    /// Create a vector from existing values.
    pub fn new(features: Vec<f64>, label: ClassLabel) -> Self {
        Self { features, label }
    }

    /// Create an all-zero vector of `len` features with an Unknown label.
    pub fn zeroed(len: usize) -> Result<Self, FeatureVectorError> {
        if len == 0 {
            return Err(FeatureVectorError::EmptyVector);
        }
        Ok(Self {
            features: vec![0.0; len],
            label: ClassLabel::Unknown,
        })
    }

    /// Create a vector by copying a slice.
    pub fn from_slice(values: &[f64], label: ClassLabel) -> Self {
        Self::new(values.to_vec(), label)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn label(&self) -> ClassLabel {
        self.label
    }

    /// Correct the label (used when partitioning offline datasets).
    pub fn set_label(&mut self, label: ClassLabel) {
        self.label = label;
    }

    /// Feature value at `index`.
    pub fn get(&self, index: usize) -> Result<f64, FeatureVectorError> {
        self.features
            .get(index)
            .copied()
            .ok_or(FeatureVectorError::OutOfBounds {
                index,
                len: self.features.len(),
            })
    }

    /// Feature value at `index`, or `default` when out of range.
    pub fn get_or(&self, index: usize, default: f64) -> f64 {
        self.features.get(index).copied().unwrap_or(default)
    }

    /// Overwrite the feature at `index`.
    pub fn set(&mut self, index: usize, value: f64) -> Result<(), FeatureVectorError> {
        let len = self.features.len();
        match self.features.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(FeatureVectorError::OutOfBounds { index, len }),
        }
    }

    /// Borrow all features.
    pub fn as_slice(&self) -> &[f64] {
        &self.features
    }

    /// Copy out all features.
    pub fn values(&self) -> Vec<f64> {
        self.features.clone()
    }

    /// Reset every feature to zero, keeping length and label.
    pub fn clear(&mut self) {
        self.features.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Append another vector's features, taking its label.
    pub fn extend_from(&mut self, other: &FeatureVector) {
        self.features.extend_from_slice(&other.features);
        self.label = other.label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_rejects_empty() {
        assert_eq!(FeatureVector::zeroed(0), Err(FeatureVectorError::EmptyVector));
        let fv = FeatureVector::zeroed(4).unwrap();
        assert_eq!(fv.len(), 4);
        assert_eq!(fv.label(), ClassLabel::Unknown);
    }

    #[test]
    fn test_index_bounds() {
        let mut fv = FeatureVector::new(vec![1.0, 2.0, 3.0], ClassLabel::Positive);
        assert_eq!(fv.get(2), Ok(3.0));
        assert_eq!(
            fv.get(3),
            Err(FeatureVectorError::OutOfBounds { index: 3, len: 3 })
        );
        assert!(fv.set(3, 1.0).is_err());
        fv.set(0, 9.0).unwrap();
        assert_eq!(fv.get(0), Ok(9.0));
        assert_eq!(fv.get_or(10, -1.0), -1.0);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let original = FeatureVector::new(vec![1.0, 2.0], ClassLabel::Positive);
        let mut copy = original.clone();
        copy.set(0, 42.0).unwrap();
        copy.set_label(ClassLabel::Negative);

        assert_eq!(original.get(0), Ok(1.0));
        assert_eq!(original.label(), ClassLabel::Positive);

        let mut values = original.values();
        values[1] = 0.0;
        assert_eq!(original.get(1), Ok(2.0));
    }

    #[test]
    fn test_clear_keeps_shape() {
        let mut fv = FeatureVector::new(vec![1.0, 2.0], ClassLabel::Negative);
        fv.clear();
        assert_eq!(fv.as_slice(), &[0.0, 0.0]);
        assert_eq!(fv.label(), ClassLabel::Negative);
    }

    #[test]
    fn test_label_integer_mapping() {
        assert_eq!(ClassLabel::Positive.as_i32(), 1);
        assert_eq!(ClassLabel::Negative.as_i32(), -1);
        assert_eq!(ClassLabel::Unknown.as_i32(), 0);
        assert_eq!(ClassLabel::try_from_i32(2), None);
        assert_eq!(ClassLabel::from_i32_lenient(7), ClassLabel::Unknown);
        assert_eq!(ClassLabel::from_i32_lenient(-1), ClassLabel::Negative);
    }
}
