//! Transparency log of agent activity.
//!
//! Tracks how many events, samples and decisions the agent handled so that
//! a user can see what the agent did, without recording any sample content.

use crate::core::feature_vector::ClassLabel;
use crate::measurement::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Events dispatched, indexed by [`kind_slot`]
    events: [AtomicU64; 4],
    /// Samples added to storage
    samples_collected: AtomicU64,
    /// Samples written to the durable log
    samples_logged: AtomicU64,
    /// Log writes that failed
    log_failures: AtomicU64,
    /// Samples classified
    classifications: AtomicU64,
    /// Positive decisions
    accepted: AtomicU64,
    /// Negative decisions
    rejected: AtomicU64,
    /// Successful trainings
    trainings: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

fn kind_slot(kind: EventKind) -> usize {
    match kind {
        EventKind::TouchInput => 0,
        EventKind::KeyInput => 1,
        EventKind::MotionEvent => 2,
        EventKind::Periodic => 3,
    }
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            events: Default::default(),
            samples_collected: AtomicU64::new(0),
            samples_logged: AtomicU64::new(0),
            log_failures: AtomicU64::new(0),
            classifications: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            trainings: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that restores and saves its counters at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous transparency stats");
        }

        log
    }

    pub fn record_event(&self, kind: EventKind) {
        self.events[kind_slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_collected(&self) {
        self.samples_collected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_logged(&self) {
        self.samples_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_failure(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one classification and its outcome.
    pub fn record_decision(&self, label: ClassLabel) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
        match label {
            ClassLabel::Positive => self.accepted.fetch_add(1, Ordering::Relaxed),
            ClassLabel::Negative => self.rejected.fetch_add(1, Ordering::Relaxed),
            ClassLabel::Unknown => 0,
        };
    }

    pub fn record_training(&self) {
        self.trainings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransparencyStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        TransparencyStats {
            touch_events: load(&self.events[0]),
            key_events: load(&self.events[1]),
            motion_events: load(&self.events[2]),
            periodic_events: load(&self.events[3]),
            samples_collected: load(&self.samples_collected),
            samples_logged: load(&self.samples_logged),
            log_failures: load(&self.log_failures),
            classifications: load(&self.classifications),
            accepted: load(&self.accepted),
            rejected: load(&self.rejected),
            trainings: load(&self.trainings),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Touch events: {}\n\
             - Key events: {}\n\
             - Motion events: {}\n\
             - Samples collected: {}\n\
             - Samples logged: {} ({} failed writes)\n\
             - Trainings: {}\n\
             - Classifications: {} ({} accepted, {} rejected)\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No typed text is stored, only inter-key timing\n\
             - Samples never leave the configured data directory",
            stats.touch_events,
            stats.key_events,
            stats.motion_events,
            stats.samples_collected,
            stats.samples_logged,
            stats.log_failures,
            stats.trainings,
            stats.classifications,
            stats.accepted,
            stats.rejected,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk, if persistence is enabled.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let persisted = PersistedStats {
                stats: self.stats(),
                last_updated: Utc::now(),
            };
            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;
                let s = persisted.stats;

                let pairs = [
                    (&self.events[0], s.touch_events),
                    (&self.events[1], s.key_events),
                    (&self.events[2], s.motion_events),
                    (&self.events[3], s.periodic_events),
                    (&self.samples_collected, s.samples_collected),
                    (&self.samples_logged, s.samples_logged),
                    (&self.log_failures, s.log_failures),
                    (&self.classifications, s.classifications),
                    (&self.accepted, s.accepted),
                    (&self.rejected, s.rejected),
                    (&self.trainings, s.trainings),
                ];
                for (counter, value) in pairs {
                    counter.store(value, Ordering::Relaxed);
                }
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.events
            .iter()
            .chain([
                &self.samples_collected,
                &self.samples_logged,
                &self.log_failures,
                &self.classifications,
                &self.accepted,
                &self.rejected,
                &self.trainings,
            ])
            .for_each(|c| c.store(0, Ordering::Relaxed));
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub touch_events: u64,
    pub key_events: u64,
    pub motion_events: u64,
    pub periodic_events: u64,
    pub samples_collected: u64,
    pub samples_logged: u64,
    pub log_failures: u64,
    pub classifications: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub trainings: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(flatten)]
    stats: TransparencyStats,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counting_by_kind() {
        let log = TransparencyLog::new();

        log.record_event(EventKind::TouchInput);
        log.record_event(EventKind::TouchInput);
        log.record_event(EventKind::Periodic);

        let stats = log.stats();
        assert_eq!(stats.touch_events, 2);
        assert_eq!(stats.key_events, 0);
        assert_eq!(stats.periodic_events, 1);
    }

    #[test]
    fn test_decisions() {
        let log = TransparencyLog::new();
        log.record_decision(ClassLabel::Positive);
        log.record_decision(ClassLabel::Negative);
        log.record_decision(ClassLabel::Unknown);

        let stats = log.stats();
        assert_eq!(stats.classifications, 3);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_reset() {
        let log = TransparencyLog::new();
        log.record_sample_collected();
        log.record_training();
        log.record_event(EventKind::KeyInput);
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.samples_collected, 0);
        assert_eq!(stats.trainings, 0);
        assert_eq!(stats.key_events, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("trust-transparency-{}", uuid::Uuid::new_v4()))
            .join("stats.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_sample_logged();
        log.record_log_failure();
        log.save().unwrap();

        let restored = TransparencyLog::with_persistence(path.clone());
        let stats = restored.stats();
        assert_eq!(stats.samples_logged, 1);
        assert_eq!(stats.log_failures, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_format() {
        let summary = TransparencyLog::new().summary();
        assert!(summary.contains("Samples collected"));
        assert!(summary.contains("Privacy Guarantee"));
    }
}
