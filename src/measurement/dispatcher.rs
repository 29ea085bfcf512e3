//! Routing of raw events to measurements.
//!
//! Measurements live in an arena of slots. Each [`EventKind`] maps to an
//! ordered list of slot indices, so one measurement can be bound to several
//! kinds and still be a single collector. When a measurement completes a
//! sample, its exported vector goes to the [`SampleSink`] and the slot is
//! replaced by a fresh instance.

use super::{EventKind, Measurement, RawEvent};
use crate::core::deflate::deflate;
use crate::core::feature_vector::FeatureVector;
use crate::core::storage::{BinLabel, DataStorage};
use crate::persistence::PermanentStorage;
use crate::transparency::SharedTransparencyLog;
use std::collections::HashMap;
use std::sync::Arc;

/// Destination of completed samples.
#[derive(Clone)]
pub enum SampleSink {
    /// Append to the active bin of the storage
    Store(Arc<DataStorage>),
    /// Write deflated lines to a durable log and keep nothing in memory
    Log {
        storage: Arc<dyn PermanentStorage>,
        log_name: String,
    },
}

impl std::fmt::Debug for SampleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleSink::Store(_) => write!(f, "SampleSink::Store"),
            SampleSink::Log { log_name, .. } => write!(f, "SampleSink::Log({log_name})"),
        }
    }
}

/// Outcome of one [`Dispatcher::dispatch`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Measurements the event was delivered to
    pub delivered: usize,
    /// Samples appended to storage, with the bin each went to
    pub stored: Vec<BinLabel>,
    /// Samples written to the log
    pub logged: usize,
    /// Log writes that failed, as error messages
    pub log_failures: Vec<String>,
}

impl DispatchReport {
    /// Number of samples completed by this event.
    pub fn completed(&self) -> usize {
        self.stored.len() + self.logged + self.log_failures.len()
    }
}

/// Typed publish/subscribe router from event kinds to measurements.
pub struct Dispatcher {
    slots: Vec<Option<Box<dyn Measurement>>>,
    routes: HashMap<EventKind, Vec<usize>>,
    sink: SampleSink,
    transparency: Option<SharedTransparencyLog>,
}

impl Dispatcher {
    pub fn new(sink: SampleSink) -> Self {
        Self {
            slots: Vec::new(),
            routes: HashMap::new(),
            sink,
            transparency: None,
        }
    }

    /// Count events and samples in `log`.
    pub fn with_transparency(mut self, log: SharedTransparencyLog) -> Self {
        self.transparency = Some(log);
        self
    }

    pub fn sink(&self) -> &SampleSink {
        &self.sink
    }

    /// Bind a measurement to every kind it declares.
    pub fn install(&mut self, measurement: Box<dyn Measurement>) {
        let kinds = measurement.subscriptions();
        let slot = self.push_slot(measurement);
        for kind in kinds {
            self.routes.entry(kind).or_default().push(slot);
        }
    }

    /// Append a measurement to the subscriber list of one kind.
    pub fn register(&mut self, kind: EventKind, measurement: Box<dyn Measurement>) {
        let slot = self.push_slot(measurement);
        self.routes.entry(kind).or_default().push(slot);
    }

    /// Drop every subscriber of `kind`. Returns whether anything was bound.
    pub fn unregister(&mut self, kind: EventKind) -> bool {
        let removed = self.routes.remove(&kind).is_some();
        if removed {
            // Slots still referenced by another kind stay alive.
            for (index, slot) in self.slots.iter_mut().enumerate() {
                let referenced = self.routes.values().any(|list| list.contains(&index));
                if !referenced {
                    *slot = None;
                }
            }
        }
        removed
    }

    /// Kinds that currently have at least one subscriber.
    pub fn subscribed_kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self.routes.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Number of measurements subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.routes.get(&kind).map_or(0, Vec::len)
    }

    /// Default negative samples of every installed measurement.
    pub fn default_negative_samples(&self) -> Vec<FeatureVector> {
        self.slots
            .iter()
            .flatten()
            .flat_map(|m| m.default_negative_samples())
            .collect()
    }

    /// Default positive samples of every installed measurement.
    pub fn default_positive_samples(&self) -> Vec<FeatureVector> {
        self.slots
            .iter()
            .flatten()
            .flat_map(|m| m.default_positive_samples())
            .collect()
    }

    /// Deliver `event` to every subscriber of `kind` in registration order.
    pub fn dispatch(&mut self, kind: EventKind, event: &RawEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        if let Some(log) = &self.transparency {
            log.record_event(kind);
        }

        let Some(route) = self.routes.get(&kind) else {
            return report;
        };

        for &index in route {
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            let Some(measurement) = slot.as_mut() else {
                continue;
            };
            report.delivered += 1;
            if !measurement.handle_event(event, kind) {
                continue;
            }

            let exported = measurement.export();
            let fresh = measurement.fresh_instance();
            *slot = Some(fresh);

            match exported {
                Some(fv) => deliver(&self.sink, self.transparency.as_ref(), fv, &mut report),
                None => tracing::warn!(kind = %kind, "measurement reported a sample but exported none"),
            }
        }

        report
    }

    fn push_slot(&mut self, measurement: Box<dyn Measurement>) -> usize {
        tracing::debug!(measurement = measurement.name(), "measurement registered");
        self.slots.push(Some(measurement));
        self.slots.len() - 1
    }
}

fn deliver(
    sink: &SampleSink,
    transparency: Option<&SharedTransparencyLog>,
    fv: FeatureVector,
    report: &mut DispatchReport,
) {
    match sink {
        SampleSink::Store(storage) => {
            let bin = storage.add_active(fv);
            tracing::debug!(bin = %bin, "sample stored");
            if let Some(log) = transparency {
                log.record_sample_collected();
            }
            report.stored.push(bin);
        }
        SampleSink::Log { storage, log_name } => {
            match storage.append_log(log_name, &deflate(&fv)) {
                Ok(()) => {
                    if let Some(log) = transparency {
                        log.record_sample_logged();
                    }
                    report.logged += 1;
                }
                Err(e) => {
                    tracing::warn!(log = %log_name, error = %e, "failed to log sample");
                    if let Some(log) = transparency {
                        log.record_log_failure();
                    }
                    report.log_failures.push(e.to_string());
                }
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("slots", &self.slots.iter().flatten().count())
            .field("kinds", &self.subscribed_kinds())
            .field("sink", &self.sink)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feature_vector::ClassLabel;
    use crate::core::storage::StorageConfig;
    use crate::persistence::{MemoryStorage, PersistenceError};
    use crate::transparency::create_shared_log;

    /// Completes a sample every `every` events; the sample holds the number
    /// of events this instance saw, so reuse of an instance is visible.
    struct Counter {
        every: usize,
        seen: usize,
    }

    impl Counter {
        fn boxed(every: usize) -> Box<dyn Measurement> {
            Box::new(Counter { every, seen: 0 })
        }
    }

    impl Measurement for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn subscriptions(&self) -> Vec<EventKind> {
            vec![EventKind::TouchInput, EventKind::KeyInput]
        }

        fn handle_event(&mut self, _event: &RawEvent, _kind: EventKind) -> bool {
            self.seen += 1;
            self.seen == self.every
        }

        fn export(&self) -> Option<FeatureVector> {
            Some(FeatureVector::new(vec![self.seen as f64], ClassLabel::Positive))
        }

        fn fresh_instance(&self) -> Box<dyn Measurement> {
            Counter::boxed(self.every)
        }
    }

    struct BrokenLog;

    impl PermanentStorage for BrokenLog {
        fn save_model(&self, _: &str, _: &[u8]) -> Result<(), PersistenceError> {
            Ok(())
        }
        fn load_model(&self, name: &str) -> Result<Vec<u8>, PersistenceError> {
            Err(PersistenceError::NotFound(name.to_string()))
        }
        fn append_log(&self, _: &str, _: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk full")))
        }
        fn read_log(&self, name: &str) -> Result<Vec<String>, PersistenceError> {
            Err(PersistenceError::NotFound(name.to_string()))
        }
    }

    fn store() -> Arc<DataStorage> {
        Arc::new(DataStorage::new(StorageConfig {
            recent_capacity: 100,
            training_threshold: 100,
        }))
    }

    #[test]
    fn test_completed_sample_is_stored_and_slot_replaced() {
        let storage = store();
        let mut dispatcher = Dispatcher::new(SampleSink::Store(Arc::clone(&storage)));
        dispatcher.register(EventKind::TouchInput, Counter::boxed(2));

        for _ in 0..4 {
            dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        }

        // Each sample starts counting from zero in a fresh instance.
        let samples = storage.snapshot(BinLabel::Train).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|fv| fv.as_slice() == [2.0]));
    }

    #[test]
    fn test_unsubscribed_kind_is_ignored() {
        let mut dispatcher = Dispatcher::new(SampleSink::Store(store()));
        dispatcher.register(EventKind::TouchInput, Counter::boxed(1));
        let report = dispatcher.dispatch(EventKind::MotionEvent, &RawEvent::Tick);
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn test_registration_order_and_sharing() {
        let storage = store();
        let mut dispatcher = Dispatcher::new(SampleSink::Store(Arc::clone(&storage)));
        dispatcher.register(EventKind::TouchInput, Counter::boxed(1));
        dispatcher.register(EventKind::TouchInput, Counter::boxed(2));
        assert_eq!(dispatcher.subscriber_count(EventKind::TouchInput), 2);

        let first = dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        assert_eq!(first.delivered, 2);
        assert_eq!(first.completed(), 1);

        let second = dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        assert_eq!(second.completed(), 2);
        let values: Vec<f64> = storage
            .snapshot(BinLabel::Train)
            .unwrap()
            .iter()
            .map(|fv| fv.as_slice()[0])
            .collect();
        assert_eq!(values, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_installed_measurement_spans_kinds() {
        let storage = store();
        let mut dispatcher = Dispatcher::new(SampleSink::Store(Arc::clone(&storage)));
        dispatcher.install(Counter::boxed(2));
        assert_eq!(
            dispatcher.subscribed_kinds(),
            vec![EventKind::TouchInput, EventKind::KeyInput]
        );

        dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        let report = dispatcher.dispatch(EventKind::KeyInput, &RawEvent::Tick);
        assert_eq!(report.stored, vec![BinLabel::Train]);
    }

    #[test]
    fn test_unregister() {
        let mut dispatcher = Dispatcher::new(SampleSink::Store(store()));
        dispatcher.install(Counter::boxed(1));
        assert!(dispatcher.unregister(EventKind::TouchInput));
        assert!(!dispatcher.unregister(EventKind::TouchInput));
        assert!(!dispatcher.unregister(EventKind::Periodic));

        // The shared measurement still serves its other kind.
        let report = dispatcher.dispatch(EventKind::KeyInput, &RawEvent::Tick);
        assert_eq!(report.completed(), 1);

        assert!(dispatcher.unregister(EventKind::KeyInput));
        assert!(dispatcher.subscribed_kinds().is_empty());
    }

    #[test]
    fn test_log_sink_writes_deflated_lines() {
        let storage = Arc::new(MemoryStorage::new());
        let transparency = create_shared_log();
        let mut dispatcher = Dispatcher::new(SampleSink::Log {
            storage: storage.clone(),
            log_name: "touch_samples".to_string(),
        })
        .with_transparency(transparency.clone());
        dispatcher.register(EventKind::TouchInput, Counter::boxed(1));

        let report = dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        assert_eq!(report.logged, 1);
        assert_eq!(storage.read_log("touch_samples").unwrap(), vec!["1;1:1.0"]);

        let stats = transparency.stats();
        assert_eq!(stats.touch_events, 1);
        assert_eq!(stats.samples_logged, 1);
    }

    #[test]
    fn test_log_failure_is_reported_not_fatal() {
        let mut dispatcher = Dispatcher::new(SampleSink::Log {
            storage: Arc::new(BrokenLog),
            log_name: "touch_samples".to_string(),
        });
        dispatcher.register(EventKind::TouchInput, Counter::boxed(1));
        dispatcher.register(EventKind::TouchInput, Counter::boxed(1));

        let report = dispatcher.dispatch(EventKind::TouchInput, &RawEvent::Tick);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.log_failures.len(), 2);
        assert!(report.log_failures[0].contains("disk full"));
    }
}
