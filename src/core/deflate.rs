//! Deflated feature vector text format.
//!
//! One sample per line:
//!
//! ```text
//! <label>;<index>:<value>[;<index>:<value>...]
//! ```
//!
//! The label is one of `-1`, `0`, `1`. Indices are 1-based, strictly
//! increasing, and never exceed the declared vector length. Indices that are
//! skipped stay at zero.

use crate::core::feature_vector::{ClassLabel, FeatureVector};
use std::fmt::Write;

/// Errors produced when parsing one deflated line.
#[derive(Debug, Clone, PartialEq)]
pub enum DeflateError {
    /// Blank line
    Empty,
    /// Declared vector length was zero
    ZeroLength,
    /// Label token missing or not one of -1, 0, 1
    InvalidLabel(String),
    /// No `;` separated feature section
    MissingFeatures,
    /// A feature token without `index:value`
    MalformedPair(String),
    /// Index token not a positive integer
    InvalidIndex(String),
    /// Index larger than the declared length
    IndexOutOfRange { index: usize, len: usize },
    /// Index not greater than the previous one
    NotIncreasing { previous: usize, index: usize },
    /// Value token not a number
    InvalidValue(String),
}

impl std::fmt::Display for DeflateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeflateError::Empty => write!(f, "empty line"),
            DeflateError::ZeroLength => write!(f, "declared vector length must be >= 1"),
            DeflateError::InvalidLabel(tok) => write!(f, "invalid class label '{tok}'"),
            DeflateError::MissingFeatures => write!(f, "no features after class label"),
            DeflateError::MalformedPair(tok) => write!(f, "malformed index:value pair '{tok}'"),
            DeflateError::InvalidIndex(tok) => write!(f, "invalid feature index '{tok}'"),
            DeflateError::IndexOutOfRange { index, len } => {
                write!(f, "feature index {index} exceeds vector length {len}")
            }
            DeflateError::NotIncreasing { previous, index } => {
                write!(f, "feature index {index} does not follow {previous}")
            }
            DeflateError::InvalidValue(tok) => write!(f, "invalid feature value '{tok}'"),
        }
    }
}

impl std::error::Error for DeflateError {}

/// Encode a vector as one deflated line (no trailing newline).
pub fn deflate(fv: &FeatureVector) -> String {
    let mut line = String::with_capacity(fv.len() * 12 + 3);
    let _ = write!(line, "{}", fv.label().as_i32());
    for (i, value) in fv.as_slice().iter().enumerate() {
        // Debug formatting keeps a decimal point and round-trips exactly.
        let _ = write!(line, ";{}:{:?}", i + 1, value);
    }
    line
}

/// Parse a deflated line into a vector of `len` features.
pub fn parse_deflated(line: &str, len: usize) -> Result<FeatureVector, DeflateError> {
    if len == 0 {
        return Err(DeflateError::ZeroLength);
    }
    let line = line.trim();
    if line.is_empty() {
        return Err(DeflateError::Empty);
    }

    let (label_tok, rest) = line.split_once(';').ok_or(DeflateError::MissingFeatures)?;
    let label = label_tok
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(ClassLabel::try_from_i32)
        .ok_or_else(|| DeflateError::InvalidLabel(label_tok.to_string()))?;

    let mut values = vec![0.0; len];
    let mut previous = 0usize;
    for token in rest.split(';') {
        let (index_tok, value_tok) = token
            .split_once(':')
            .ok_or_else(|| DeflateError::MalformedPair(token.to_string()))?;
        let index = index_tok
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&i| i >= 1)
            .ok_or_else(|| DeflateError::InvalidIndex(index_tok.to_string()))?;
        if index > len {
            return Err(DeflateError::IndexOutOfRange { index, len });
        }
        if index <= previous {
            return Err(DeflateError::NotIncreasing { previous, index });
        }
        let value = value_tok
            .trim()
            .parse::<f64>()
            .map_err(|_| DeflateError::InvalidValue(value_tok.to_string()))?;
        values[index - 1] = value;
        previous = index;
    }

    Ok(FeatureVector::new(values, label))
}

/// Parse a line whose length is taken from its highest index.
pub fn parse_deflated_auto(line: &str) -> Result<FeatureVector, DeflateError> {
    let len = declared_len(line).ok_or(DeflateError::MissingFeatures)?;
    parse_deflated(line, len)
}

/// Highest feature index present in a line, if any can be read.
pub fn declared_len(line: &str) -> Option<usize> {
    let (_, rest) = line.trim().split_once(';')?;
    rest.split(';')
        .filter_map(|tok| tok.split_once(':'))
        .filter_map(|(idx, _)| idx.trim().parse::<usize>().ok())
        .max()
}

/// Parse many lines; failures are collected per line number (1-based)
/// without affecting the lines that parsed.
pub fn parse_lines(text: &str, len: usize) -> (Vec<FeatureVector>, Vec<(usize, DeflateError)>) {
    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_deflated(line, len) {
            Ok(fv) => parsed.push(fv),
            Err(e) => failures.push((number + 1, e)),
        }
    }
    (parsed, failures)
}
