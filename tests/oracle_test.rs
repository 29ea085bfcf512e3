//! Integration tests for offline evaluation

use std::path::{Path, PathBuf};
use std::time::Duration;
use synheart_trust_agent::core::deflate;
use synheart_trust_agent::oracle::{run_evaluation, OracleError};
use synheart_trust_agent::{ClassLabel, EvaluationSettings, FeatureVector, RunConfiguration};

fn dataset_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("trust-oracle-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write `count` samples for `user`, well separated from other users.
fn write_user(dir: &Path, user: usize, count: usize) {
    let lines: Vec<String> = (0..count)
        .map(|i| {
            let values = (0..35)
                .map(|j| user as f64 * 100.0 + i as f64 * 0.1 + j as f64 * 0.01)
                .collect();
            deflate(&FeatureVector::new(values, ClassLabel::Positive))
        })
        .collect();
    let path = dir.join(format!("touch_samples_user{user}.log"));
    std::fs::write(path, lines.join("\n")).unwrap();
}

fn settings(dir: &Path) -> EvaluationSettings {
    EvaluationSettings {
        dataset_path: dir.to_path_buf(),
        ..EvaluationSettings::default()
    }
}

#[test]
fn test_separable_users_are_told_apart() {
    let dir = dataset_dir();
    for user in 0..4 {
        write_user(&dir, user, 20);
    }

    let report = run_evaluation(
        &settings(&dir),
        &RunConfiguration::touchalytics(),
        Some(0),
        Duration::from_secs(30),
    )
    .unwrap();

    assert_eq!(report.sources, 4);
    assert_eq!(report.partitions.len(), 1);
    let partition = &report.partitions[0];
    assert_eq!(partition.training_size, 20);
    assert_eq!(partition.test_size, 20);

    let m = report.total;
    assert_eq!(m.true_positives, 10);
    assert_eq!(m.true_negatives, 10);
    assert_eq!(m.false_positives, 0);
    assert_eq!(m.false_negatives, 0);
    assert_eq!(m.neutral, 0);
    assert_eq!(m.unscored, 0);
    assert_eq!(m.accuracy(), Some(1.0));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_every_user_evaluated_by_default() {
    let dir = dataset_dir();
    for user in 0..4 {
        write_user(&dir, user, 20);
    }

    let report = run_evaluation(
        &settings(&dir),
        &RunConfiguration::touchalytics(),
        None,
        Duration::from_secs(30),
    )
    .unwrap();

    assert_eq!(report.partitions.len(), 4);
    assert_eq!(
        report.total.scored() + report.total.neutral + report.total.unscored,
        4 * 20
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_too_few_sources() {
    let dir = dataset_dir();
    for user in 0..3 {
        write_user(&dir, user, 20);
    }
    // Too short to count as a source.
    write_user(&dir, 3, 5);

    let err = run_evaluation(
        &settings(&dir),
        &RunConfiguration::touchalytics(),
        None,
        Duration::from_secs(1),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        OracleError::NotEnoughSources {
            found: 3,
            required: 4
        }
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_empty_dataset() {
    let dir = dataset_dir();
    let err = run_evaluation(
        &settings(&dir),
        &RunConfiguration::touchalytics(),
        None,
        Duration::from_secs(1),
    )
    .unwrap_err();
    assert!(matches!(err, OracleError::NoData(_)));
    let _ = std::fs::remove_dir_all(&dir);
}
