//! Class-balanced train/test partitioning of per-user sample groups.
//!
//! For a target group every split holds as many Positive samples (taken
//! from the target) as Negative ones (taken round-robin from every other
//! group). All groups are cut to the size of the smallest one so each user
//! contributes equally. The split is deterministic: no shuffling.

use crate::core::feature_vector::{ClassLabel, FeatureVector};

/// Partitioning errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionError {
    /// At least two groups are needed to draw negatives
    TooFewGroups(usize),
    /// Ratio outside the open interval (0, 1)
    InvalidRatio(f64),
    /// The smallest group is too small to give both splits a sample
    EmptySplit { smallest_group: usize, ratio: f64 },
    /// Target index past the last group
    TargetOutOfRange { target: usize, groups: usize },
    /// A group ran out of samples while drawing negatives
    Exhausted { group: usize, index: usize },
}

impl std::fmt::Display for PartitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionError::TooFewGroups(n) => {
                write!(f, "need at least 2 sample groups, got {n}")
            }
            PartitionError::InvalidRatio(r) => {
                write!(f, "training ratio {r} must be strictly between 0 and 1")
            }
            PartitionError::EmptySplit {
                smallest_group,
                ratio,
            } => write!(
                f,
                "smallest group has {smallest_group} samples, too few to split at ratio {ratio}"
            ),
            PartitionError::TargetOutOfRange { target, groups } => {
                write!(f, "target group {target} out of range for {groups} groups")
            }
            PartitionError::Exhausted { group, index } => {
                write!(f, "group {group} has no sample at index {index}")
            }
        }
    }
}

impl std::error::Error for PartitionError {}

/// Deterministic splitter over groups of samples, one group per user.
#[derive(Debug, Clone)]
pub struct Partitioner {
    groups: Vec<Vec<FeatureVector>>,
    /// Positive samples per training set
    train_per_class: usize,
    /// Positive samples per test set
    test_per_class: usize,
}

impl Partitioner {
    pub fn new(groups: Vec<Vec<FeatureVector>>, ratio: f64) -> Result<Self, PartitionError> {
        if groups.len() < 2 {
            return Err(PartitionError::TooFewGroups(groups.len()));
        }
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PartitionError::InvalidRatio(ratio));
        }
        let smallest = groups.iter().map(Vec::len).min().unwrap_or(0);
        let train_per_class = (smallest as f64 * ratio).round() as usize;
        let test_per_class = smallest.saturating_sub(train_per_class);
        if train_per_class == 0 || test_per_class == 0 {
            return Err(PartitionError::EmptySplit {
                smallest_group: smallest,
                ratio,
            });
        }

        Ok(Self {
            groups,
            train_per_class,
            test_per_class,
        })
    }

    pub fn num_partitions(&self) -> usize {
        self.groups.len()
    }

    /// Size of every training set, both classes together.
    pub fn training_set_size(&self) -> usize {
        self.train_per_class * 2
    }

    /// Size of every test set, both classes together.
    pub fn test_set_size(&self) -> usize {
        self.test_per_class * 2
    }

    /// Training set for `target`: its leading samples as Positive, then the
    /// same number of Negative samples from the other groups.
    pub fn training_samples(&self, target: usize) -> Result<Vec<FeatureVector>, PartitionError> {
        self.check_target(target)?;
        let mut samples = labelled(
            &self.groups[target][..self.train_per_class],
            ClassLabel::Positive,
        );
        samples.extend(self.negatives(target, 0, self.train_per_class)?);
        Ok(samples)
    }

    /// Test set for `target`: the samples following its training slice as
    /// Positive, then Negative samples from the other groups that were not
    /// used for training.
    pub fn testing_samples(&self, target: usize) -> Result<Vec<FeatureVector>, PartitionError> {
        self.check_target(target)?;
        let start = self.train_per_class;
        let mut samples = labelled(
            &self.groups[target][start..start + self.test_per_class],
            ClassLabel::Positive,
        );
        let others = self.groups.len() - 1;
        let first_unused_row = self.train_per_class.div_ceil(others);
        samples.extend(self.negatives(target, first_unused_row, self.test_per_class)?);
        Ok(samples)
    }

    fn check_target(&self, target: usize) -> Result<(), PartitionError> {
        if target >= self.groups.len() {
            return Err(PartitionError::TargetOutOfRange {
                target,
                groups: self.groups.len(),
            });
        }
        Ok(())
    }

    /// `count` samples taken row by row from every group except `target`,
    /// starting at `row`.
    fn negatives(
        &self,
        target: usize,
        mut row: usize,
        count: usize,
    ) -> Result<Vec<FeatureVector>, PartitionError> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            for (group, samples) in self.groups.iter().enumerate() {
                if group == target {
                    continue;
                }
                if out.len() == count {
                    break;
                }
                let sample = samples
                    .get(row)
                    .ok_or(PartitionError::Exhausted { group, index: row })?;
                let mut sample = sample.clone();
                sample.set_label(ClassLabel::Negative);
                out.push(sample);
            }
            row += 1;
        }
        Ok(out)
    }
}

fn labelled(samples: &[FeatureVector], label: ClassLabel) -> Vec<FeatureVector> {
    samples
        .iter()
        .map(|fv| {
            let mut fv = fv.clone();
            fv.set_label(label);
            fv
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `size` samples whose single value encodes group and position.
    fn group(id: usize, size: usize) -> Vec<FeatureVector> {
        (0..size)
            .map(|i| FeatureVector::new(vec![(id * 100 + i) as f64], ClassLabel::Unknown))
            .collect()
    }

    fn values(samples: &[FeatureVector]) -> Vec<f64> {
        samples.iter().map(|fv| fv.as_slice()[0]).collect()
    }

    fn labels(samples: &[FeatureVector]) -> Vec<ClassLabel> {
        samples.iter().map(FeatureVector::label).collect()
    }

    #[test]
    fn test_sizes_follow_smallest_group() {
        let p = Partitioner::new(vec![group(0, 10), group(1, 8), group(2, 12)], 0.5).unwrap();
        assert_eq!(p.num_partitions(), 3);
        assert_eq!(p.training_set_size(), 8);
        assert_eq!(p.test_set_size(), 8);
    }

    #[test]
    fn test_training_split() {
        let p = Partitioner::new(vec![group(0, 6), group(1, 6), group(2, 6)], 0.5).unwrap();
        let train = p.training_samples(0).unwrap();
        assert_eq!(values(&train), vec![0.0, 1.0, 2.0, 100.0, 200.0, 101.0]);
        assert_eq!(
            labels(&train),
            [vec![ClassLabel::Positive; 3], vec![ClassLabel::Negative; 3]].concat()
        );
    }

    #[test]
    fn test_testing_split_does_not_overlap_training() {
        let p = Partitioner::new(vec![group(0, 6), group(1, 6), group(2, 6)], 0.5).unwrap();
        let train = values(&p.training_samples(1).unwrap());
        let test = values(&p.testing_samples(1).unwrap());
        assert_eq!(test, vec![103.0, 104.0, 105.0, 2.0, 202.0, 3.0]);
        assert!(test.iter().all(|v| !train.contains(v)));

        let labels = labels(&p.testing_samples(1).unwrap());
        assert_eq!(labels.iter().filter(|l| **l == ClassLabel::Positive).count(), 3);
    }

    #[test]
    fn test_deterministic() {
        let groups = vec![group(0, 9), group(1, 9), group(2, 9), group(3, 9)];
        let a = Partitioner::new(groups.clone(), 0.5).unwrap();
        let b = Partitioner::new(groups, 0.5).unwrap();
        assert_eq!(a.training_samples(2).unwrap(), b.training_samples(2).unwrap());
        assert_eq!(a.testing_samples(2).unwrap(), b.testing_samples(2).unwrap());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            Partitioner::new(vec![group(0, 5)], 0.5).unwrap_err(),
            PartitionError::TooFewGroups(1)
        );
        assert_eq!(
            Partitioner::new(vec![group(0, 5), group(1, 5)], 1.0).unwrap_err(),
            PartitionError::InvalidRatio(1.0)
        );
        assert!(matches!(
            Partitioner::new(vec![group(0, 1), group(1, 5)], 0.5),
            Err(PartitionError::EmptySplit { .. })
        ));

        let p = Partitioner::new(vec![group(0, 4), group(1, 4)], 0.5).unwrap();
        assert_eq!(
            p.training_samples(2).unwrap_err(),
            PartitionError::TargetOutOfRange {
                target: 2,
                groups: 2
            }
        );
    }
}
