//! Offline evaluation of a run configuration against a recorded dataset.

use super::dataset::{load_sources, scan};
use super::partition::Partitioner;
use super::OracleError;
use crate::agent::{Agent, AgentConfig, AgentMode, AgentRunState, AgentStatus};
use crate::config::EvaluationSettings;
use crate::core::feature_vector::{ClassLabel, FeatureVector};
use crate::core::features::NUM_STROKE_FEATURES;
use crate::measurement::{EventKind, RawEvent};
use crate::prefab::RunConfiguration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long to wait for the agent to score every test sample.
pub const DEFAULT_SCORE_DEADLINE: Duration = Duration::from_secs(30);

/// Counts of agreement between test labels and scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    /// Test samples the classifier could not decide on
    #[serde(default)]
    pub neutral: usize,
    /// Test samples without a score when the deadline passed
    pub unscored: usize,
}

impl ConfusionMatrix {
    /// Compare classification outcomes with the labels of the test samples,
    /// position by position. `outcomes` holds one entry per classified
    /// sample, neutral ones included.
    pub fn tally(expected: &[FeatureVector], outcomes: &[ClassLabel]) -> Self {
        let mut m = Self::default();
        for (i, sample) in expected.iter().enumerate() {
            let Some(&score) = outcomes.get(i) else {
                m.unscored += 1;
                continue;
            };
            match (sample.label(), score) {
                (_, ClassLabel::Unknown) => m.neutral += 1,
                (ClassLabel::Positive, ClassLabel::Positive) => m.true_positives += 1,
                (ClassLabel::Positive, _) => m.false_negatives += 1,
                (ClassLabel::Negative, ClassLabel::Negative) => m.true_negatives += 1,
                (ClassLabel::Negative, _) => m.false_positives += 1,
                (ClassLabel::Unknown, _) => {}
            }
        }
        m
    }

    pub fn merge(&mut self, other: &ConfusionMatrix) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.true_negatives += other.true_negatives;
        self.false_negatives += other.false_negatives;
        self.neutral += other.neutral;
        self.unscored += other.unscored;
    }

    pub fn scored(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positives + self.true_negatives, self.scored())
    }

    /// False acceptance rate: share of other users' samples accepted.
    pub fn far(&self) -> Option<f64> {
        ratio(self.false_positives, self.false_positives + self.true_negatives)
    }

    /// False rejection rate: share of the owner's samples rejected.
    pub fn frr(&self) -> Option<f64> {
        ratio(self.false_negatives, self.false_negatives + self.true_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TP: {}; FP: {}; TN: {}; FN: {}; accuracy {}; FAR {}; FRR {}",
            self.true_positives,
            self.false_positives,
            self.true_negatives,
            self.false_negatives,
            percent(self.accuracy()),
            percent(self.far()),
            percent(self.frr()),
        )?;
        if self.neutral > 0 {
            write!(f, "; neutral {}", self.neutral)?;
        }
        if self.unscored > 0 {
            write!(f, "; unscored {}", self.unscored)?;
        }
        Ok(())
    }
}

/// Result of evaluating one target user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub target: usize,
    pub training_size: usize,
    pub test_size: usize,
    pub matrix: ConfusionMatrix,
}

/// Result of an evaluation run over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub sources: usize,
    pub keystroke_sources: usize,
    pub partitions: Vec<PartitionReport>,
    /// Sum over every evaluated partition
    pub total: ConfusionMatrix,
}

/// Train an Oracle agent on the training split of `target` and score its
/// test split.
pub fn evaluate_partition(
    preset: &RunConfiguration,
    partitioner: &Partitioner,
    target: usize,
    deadline: Duration,
) -> Result<PartitionReport, OracleError> {
    let training = partitioner.training_samples(target)?;
    let testing = partitioner.testing_samples(target)?;

    let agent = Agent::builder(AgentMode::Oracle)
        .config(AgentConfig {
            period: Duration::ZERO,
            training_threshold: training.len(),
            score_history: testing.len(),
            recent_capacity: testing.len(),
        })
        .classifier(Arc::new(preset.classifier()?))
        .measurement(Box::new(preset.replay_measurement()))
        .build()?;
    agent.start()?;

    for sample in training.iter().chain(testing.iter()) {
        agent.dispatch(EventKind::TouchInput, &RawEvent::Sample(sample.clone()));
    }

    let outcomes = collect_outcomes(&agent, testing.len(), deadline);
    agent.stop();
    agent.join()?;

    if let AgentStatus::Stopped {
        reason: Some(reason),
    } = agent.status()
    {
        return Err(OracleError::AgentStopped(reason));
    }
    if outcomes.len() < testing.len() {
        warn!(
            partition = target,
            scored = outcomes.len(),
            expected = testing.len(),
            "deadline passed before every test sample was scored"
        );
    }

    let matrix = ConfusionMatrix::tally(&testing, &outcomes);
    info!(partition = target, %matrix, "partition evaluated");
    Ok(PartitionReport {
        target,
        training_size: training.len(),
        test_size: testing.len(),
        matrix,
    })
}

fn collect_outcomes(agent: &Agent, expected: usize, deadline: Duration) -> Vec<ClassLabel> {
    let until = Instant::now() + deadline;
    let mut outcomes = Vec::with_capacity(expected);
    loop {
        outcomes.extend(agent.take_outcomes());
        let done = outcomes.len() >= expected
            || agent.run_state() == AgentRunState::Stopped
            || Instant::now() >= until;
        if done {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    outcomes
}

/// Scan, load and evaluate a dataset.
///
/// `target` selects one user; `None` evaluates every user in turn and sums
/// the results.
pub fn run_evaluation(
    settings: &EvaluationSettings,
    preset: &RunConfiguration,
    target: Option<usize>,
    deadline: Duration,
) -> Result<EvaluationReport, OracleError> {
    let scan = scan(settings)?;
    if scan.is_empty() {
        return Err(OracleError::NoData(settings.dataset_path.clone()));
    }
    if scan.touch_files.len() < settings.min_data_sources {
        return Err(OracleError::NotEnoughSources {
            found: scan.touch_files.len(),
            required: settings.min_data_sources,
        });
    }
    info!(sources = scan.touch_files.len(), "found touch data sources");

    let groups = load_sources(&scan.touch_files, NUM_STROKE_FEATURES)?
        .into_iter()
        .map(|source| source.samples)
        .collect();
    let partitioner = Partitioner::new(groups, settings.train_test_ratio)?;

    let targets: Vec<usize> = match target {
        Some(t) => vec![t],
        None => (0..partitioner.num_partitions()).collect(),
    };

    let mut total = ConfusionMatrix::default();
    let mut partitions = Vec::with_capacity(targets.len());
    for t in targets {
        let report = evaluate_partition(preset, &partitioner, t, deadline)?;
        total.merge(&report.matrix);
        partitions.push(report);
    }

    Ok(EvaluationReport {
        sources: scan.touch_files.len(),
        keystroke_sources: scan.keystroke_files.len(),
        partitions,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(labels: &[ClassLabel]) -> Vec<FeatureVector> {
        labels
            .iter()
            .map(|&l| FeatureVector::new(vec![0.0], l))
            .collect()
    }

    #[test]
    fn test_tally() {
        use ClassLabel::*;
        let expected = labelled(&[Positive, Positive, Negative, Negative, Negative]);
        let m = ConfusionMatrix::tally(&expected, &[Positive, Negative, Negative, Positive]);
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.unscored, 1);
        assert_eq!(m.accuracy(), Some(0.5));
        assert_eq!(m.far(), Some(0.5));
        assert_eq!(m.frr(), Some(0.5));
    }

    #[test]
    fn test_neutral_outcome_keeps_alignment() {
        use ClassLabel::*;
        let expected = labelled(&[Positive, Negative, Positive, Negative]);
        let m = ConfusionMatrix::tally(&expected, &[Positive, Unknown, Positive, Negative]);
        assert_eq!(m.true_positives, 2);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.false_positives, 0);
        assert_eq!(m.false_negatives, 0);
        assert_eq!(m.neutral, 1);
        assert_eq!(m.scored(), 3);
        assert_eq!(m.accuracy(), Some(1.0));
        assert!(m.to_string().contains("neutral 1"));
    }

    #[test]
    fn test_empty_matrix_has_no_rates() {
        let m = ConfusionMatrix::default();
        assert_eq!(m.accuracy(), None);
        assert!(m.to_string().contains("n/a"));
    }

    #[test]
    fn test_merge() {
        let mut a = ConfusionMatrix {
            true_positives: 2,
            ..Default::default()
        };
        a.merge(&ConfusionMatrix {
            true_positives: 1,
            false_positives: 3,
            ..Default::default()
        });
        assert_eq!(a.true_positives, 3);
        assert_eq!(a.false_positives, 3);
        assert_eq!(a.far(), Some(1.0));
    }
}
