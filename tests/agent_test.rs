//! Integration tests for the agent pipeline

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use synheart_trust_agent::classifier::ModelSnapshot;
use synheart_trust_agent::measurement::{ReplayMeasurement, TouchAction, TouchPoint};
use synheart_trust_agent::persistence::{restore_knn, save_classifier};
use synheart_trust_agent::{
    Agent, AgentConfig, AgentMode, AgentRunState, AgentStatus, BinLabel, ClassLabel, Classifier,
    ClassifierError, ClassifierState, EventKind, FeatureVector, FileStorage, InputRecord,
    PermanentStorage, RawEvent, RunConfiguration,
};

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("trust-agent-{tag}-{}", uuid::Uuid::new_v4()))
}

fn lock_step(threshold: usize) -> AgentConfig {
    AgentConfig {
        period: Duration::ZERO,
        training_threshold: threshold,
        score_history: 10,
        recent_capacity: 10,
    }
}

/// Events of one upward swipe starting at `start_ms`.
fn swipe(start_ms: i64, x: f64) -> Vec<RawEvent> {
    let points = (0..15)
        .map(|i| TouchPoint {
            timestamp_ms: start_ms + i * 10,
            x: x + i as f64,
            y: 1500.0 - i as f64 * 60.0,
            pressure: 0.6,
            area: 0.03,
            orientation: 0.0,
        })
        .collect();
    vec![
        RawEvent::Touch(TouchAction::Down),
        RawEvent::Touch(TouchAction::Move { points }),
        RawEvent::Touch(TouchAction::Up),
    ]
}

fn feed_swipe(agent: &Agent, start_ms: i64, x: f64) {
    for event in swipe(start_ms, x) {
        agent.dispatch(EventKind::TouchInput, &event);
    }
}

#[test]
fn test_online_touch_pipeline() {
    let preset = RunConfiguration::touchalytics();
    let agent = Agent::builder(AgentMode::Online)
        .config(lock_step(3))
        .classifier(Arc::new(preset.classifier().unwrap()))
        .measurement(Box::new(preset.touch_measurement()))
        .build()
        .unwrap();

    for n in 0..3 {
        feed_swipe(&agent, n * 1_000, 400.0);
    }
    assert_eq!(agent.storage().bin_size(BinLabel::Train), 3);
    assert_eq!(agent.storage().active_bin(), BinLabel::Recent);

    feed_swipe(&agent, 5_000, 400.0);
    let outcome = agent.step().unwrap();
    assert!(outcome.trained);
    let label = outcome.classified.expect("a sample was waiting");
    assert!(label.is_decisive());
    assert_eq!(agent.status(), AgentStatus::Scoring);
    assert_eq!(agent.classifier().unwrap().state(), ClassifierState::Trained);

    let stats = agent.transparency().stats();
    assert_eq!(stats.samples_collected, 4);
    assert_eq!(stats.trainings, 1);
    assert_eq!(stats.touch_events, 12);
}

#[test]
fn test_log_only_writes_deflated_samples() {
    let dir = temp_dir("log");
    let storage = Arc::new(FileStorage::new(&dir).unwrap());
    let preset = RunConfiguration::touchalytics();
    let agent = Agent::builder(AgentMode::Config)
        .log_to(storage.clone(), "touch_samples")
        .measurement(Box::new(preset.touch_measurement()))
        .build()
        .unwrap();
    agent.start().unwrap();

    feed_swipe(&agent, 0, 300.0);
    feed_swipe(&agent, 2_000, 320.0);

    let lines = storage.read_log("touch_samples").unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.starts_with("1;1:")));
    assert!(lines[0].contains(";29:"));
    assert!(!lines[0].contains(";30:"));
    assert_eq!(agent.status(), AgentStatus::Logging);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_model_survives_restart() {
    let dir = temp_dir("model");
    let storage = FileStorage::new(&dir).unwrap();
    let preset = RunConfiguration::touchalytics();

    let first = Agent::builder(AgentMode::Online)
        .config(lock_step(2))
        .classifier(Arc::new(preset.classifier().unwrap()))
        .measurement(Box::new(preset.touch_measurement()))
        .build()
        .unwrap();
    feed_swipe(&first, 0, 400.0);
    feed_swipe(&first, 1_000, 410.0);
    assert!(first.step().unwrap().trained);
    assert!(save_classifier(&storage, "model", first.classifier().unwrap().as_ref()).unwrap());

    let restored = restore_knn(&storage, "model", preset.knn).unwrap();
    assert_eq!(restored.state(), ClassifierState::Trained);
    assert_eq!(restored.sample_count(), 2 + 20);

    let second = Agent::builder(AgentMode::Online)
        .config(lock_step(2))
        .classifier(Arc::new(restored))
        .measurement(Box::new(preset.touch_measurement()))
        .build()
        .unwrap();
    assert_eq!(second.status(), AgentStatus::Scoring);
    feed_swipe(&second, 0, 400.0);
    let outcome = second.step().unwrap();
    assert!(!outcome.trained);
    assert!(outcome.classified.is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_records_drive_the_agent() {
    let preset = RunConfiguration::touchalytics();
    let agent = Agent::builder(AgentMode::Online)
        .config(lock_step(1))
        .classifier(Arc::new(preset.classifier().unwrap()))
        .measurement(Box::new(preset.touch_measurement()))
        .build()
        .unwrap();

    let lines: Vec<String> = swipe(0, 250.0)
        .into_iter()
        .map(|event| {
            serde_json::to_string(&InputRecord {
                kind: EventKind::TouchInput,
                event,
            })
            .unwrap()
        })
        .collect();

    for line in &lines {
        let record: InputRecord = serde_json::from_str(line).unwrap();
        agent.dispatch(record.kind, &record.event);
    }
    assert_eq!(agent.storage().bin_size(BinLabel::Train), 1);
}

/// A classifier whose training always fails.
struct RejectsTraining;

impl Classifier for RejectsTraining {
    fn name(&self) -> &'static str {
        "rejects-training"
    }
    fn state(&self) -> ClassifierState {
        ClassifierState::NotTrained
    }
    fn train(&self, _: Vec<FeatureVector>) -> Result<(), ClassifierError> {
        Err(ClassifierError::EmptyTrainingSet)
    }
    fn classify(&self, _: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        Err(ClassifierError::NotTrained)
    }
    fn model_snapshot(&self) -> Option<ModelSnapshot> {
        None
    }
}

#[test]
fn test_training_failure_stops_running_loop() {
    let agent = Agent::builder(AgentMode::Oracle)
        .config(AgentConfig {
            period: Duration::from_millis(1),
            ..lock_step(1)
        })
        .classifier(Arc::new(RejectsTraining))
        .measurement(Box::new(ReplayMeasurement::touch()))
        .build()
        .unwrap();

    agent.start().unwrap();
    assert_eq!(agent.run_state(), AgentRunState::Running);
    agent.dispatch(
        EventKind::TouchInput,
        &RawEvent::Sample(FeatureVector::new(vec![1.0; 29], ClassLabel::Positive)),
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    while agent.run_state() == AgentRunState::Running && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    agent.join().unwrap();

    assert_eq!(agent.run_state(), AgentRunState::Stopped);
    match agent.status() {
        AgentStatus::Stopped {
            reason: Some(reason),
        } => assert!(reason.contains("training failed")),
        other => panic!("expected a stop with a reason, got {other:?}"),
    }
    assert!(!agent.is_training_triggered());
    assert!(agent.take_scores().is_empty());
}
