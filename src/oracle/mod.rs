//! Offline evaluation ("oracle" mode).
//!
//! Recorded sample files, one per user, are split into class-balanced
//! training and test sets. An Oracle-mode agent is trained on the training
//! set through the regular dispatcher and control loop, then scores the test
//! set; the scores are compared with the known labels.

pub mod dataset;
pub mod evaluate;
pub mod partition;

use crate::agent::AgentError;
use crate::classifier::ClassifierError;
use std::path::{Path, PathBuf};

pub use dataset::{load_source, load_sources, scan, DataSource, DatasetScan};
pub use evaluate::{
    evaluate_partition, run_evaluation, ConfusionMatrix, EvaluationReport, PartitionReport,
    DEFAULT_SCORE_DEADLINE,
};
pub use partition::{PartitionError, Partitioner};

/// Evaluation errors.
#[derive(Debug)]
pub enum OracleError {
    Io { path: PathBuf, source: std::io::Error },
    /// No usable sample file in the dataset directory
    NoData(PathBuf),
    NotEnoughSources { found: usize, required: usize },
    Partition(PartitionError),
    Classifier(ClassifierError),
    Agent(AgentError),
    /// The agent stopped on its own, e.g. after a training failure
    AgentStopped(String),
}

impl OracleError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        OracleError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Io { path, source } => {
                write!(f, "failed to read dataset at {}: {source}", path.display())
            }
            OracleError::NoData(path) => write!(f, "no data found in {} to evaluate", path.display()),
            OracleError::NotEnoughSources { found, required } => {
                write!(f, "found {found} touch data sources, {required} required")
            }
            OracleError::Partition(e) => write!(f, "partitioning failed: {e}"),
            OracleError::Classifier(e) => write!(f, "classifier error: {e}"),
            OracleError::Agent(e) => write!(f, "agent error: {e}"),
            OracleError::AgentStopped(reason) => write!(f, "agent stopped: {reason}"),
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OracleError::Io { source, .. } => Some(source),
            OracleError::Partition(e) => Some(e),
            OracleError::Classifier(e) => Some(e),
            OracleError::Agent(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PartitionError> for OracleError {
    fn from(e: PartitionError) -> Self {
        OracleError::Partition(e)
    }
}

impl From<ClassifierError> for OracleError {
    fn from(e: ClassifierError) -> Self {
        OracleError::Classifier(e)
    }
}

impl From<AgentError> for OracleError {
    fn from(e: AgentError) -> Self {
        OracleError::Agent(e)
    }
}
