//! Fan-in of several measurements into one combined sample.
//!
//! The composite owns its children behind a private router. It reports a
//! sample only once every child has completed one since the last export,
//! then concatenates the children's exports in child order. A child fed by a
//! sparse event kind holds the whole composite back until it fires.

use super::{EventKind, Measurement, RawEvent};
use crate::core::feature_vector::{ClassLabel, FeatureVector};
use std::collections::BTreeMap;

/// Private router for the children of a composite.
struct SubDispatcher {
    children: Vec<Box<dyn Measurement>>,
    routes: BTreeMap<EventKind, Vec<usize>>,
    ready: Vec<bool>,
}

impl SubDispatcher {
    fn new(children: Vec<Box<dyn Measurement>>) -> Self {
        let mut routes: BTreeMap<EventKind, Vec<usize>> = BTreeMap::new();
        for (index, child) in children.iter().enumerate() {
            for kind in child.subscriptions() {
                let list = routes.entry(kind).or_default();
                if !list.contains(&index) {
                    list.push(index);
                }
            }
        }
        let ready = vec![false; children.len()];
        Self {
            children,
            routes,
            ready,
        }
    }

    fn dispatch(&mut self, kind: EventKind, event: &RawEvent) {
        let Some(route) = self.routes.get(&kind) else {
            return;
        };
        for &index in route {
            if self.children[index].handle_event(event, kind) {
                self.ready[index] = true;
            }
        }
    }

    fn all_ready(&self) -> bool {
        !self.ready.is_empty() && self.ready.iter().all(|&r| r)
    }
}

/// AND-join of child measurements.
pub struct CompositeMeasurement {
    inner: SubDispatcher,
}

impl CompositeMeasurement {
    pub fn new(children: Vec<Box<dyn Measurement>>) -> Self {
        Self {
            inner: SubDispatcher::new(children),
        }
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.len()
    }
}

impl Measurement for CompositeMeasurement {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        self.inner.routes.keys().copied().collect()
    }

    fn handle_event(&mut self, event: &RawEvent, kind: EventKind) -> bool {
        self.inner.dispatch(kind, event);
        if self.inner.all_ready() {
            self.inner.ready.iter_mut().for_each(|r| *r = false);
            true
        } else {
            false
        }
    }

    /// Children's exports concatenated in order. The label is the label of
    /// the last child.
    fn export(&self) -> Option<FeatureVector> {
        let mut combined = FeatureVector::new(Vec::new(), ClassLabel::Unknown);
        for child in &self.inner.children {
            combined.extend_from(&child.export()?);
        }
        Some(combined)
    }

    fn fresh_instance(&self) -> Box<dyn Measurement> {
        let children = self
            .inner
            .children
            .iter()
            .map(|c| c.fresh_instance())
            .collect();
        Box::new(CompositeMeasurement::new(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Completes on every event of its kind, exporting `width` copies of the
    /// number of events seen.
    struct Pulse {
        kind: EventKind,
        width: usize,
        label: ClassLabel,
        seen: usize,
    }

    fn pulse(kind: EventKind, width: usize, label: ClassLabel) -> Box<dyn Measurement> {
        Box::new(Pulse {
            kind,
            width,
            label,
            seen: 0,
        })
    }

    impl Measurement for Pulse {
        fn name(&self) -> &'static str {
            "pulse"
        }
        fn subscriptions(&self) -> Vec<EventKind> {
            vec![self.kind]
        }
        fn handle_event(&mut self, _: &RawEvent, _: EventKind) -> bool {
            self.seen += 1;
            true
        }
        fn export(&self) -> Option<FeatureVector> {
            (self.seen > 0).then(|| FeatureVector::new(vec![self.seen as f64; self.width], self.label))
        }
        fn fresh_instance(&self) -> Box<dyn Measurement> {
            pulse(self.kind, self.width, self.label)
        }
    }

    fn composite() -> CompositeMeasurement {
        CompositeMeasurement::new(vec![
            pulse(EventKind::TouchInput, 2, ClassLabel::Positive),
            pulse(EventKind::KeyInput, 3, ClassLabel::Unknown),
        ])
    }

    #[test]
    fn test_ready_only_after_every_child() {
        let mut c = composite();
        assert!(!c.handle_event(&RawEvent::Tick, EventKind::TouchInput));
        assert!(!c.handle_event(&RawEvent::Tick, EventKind::TouchInput));
        assert!(c.handle_event(&RawEvent::Tick, EventKind::KeyInput));

        // Flags reset after a completed sample.
        assert!(!c.handle_event(&RawEvent::Tick, EventKind::KeyInput));
        assert!(c.handle_event(&RawEvent::Tick, EventKind::TouchInput));
    }

    #[test]
    fn test_export_concatenates_in_child_order() {
        let mut c = composite();
        c.handle_event(&RawEvent::Tick, EventKind::TouchInput);
        c.handle_event(&RawEvent::Tick, EventKind::TouchInput);
        c.handle_event(&RawEvent::Tick, EventKind::KeyInput);

        let fv = c.export().unwrap();
        assert_eq!(fv.len(), 5);
        assert_eq!(fv.as_slice(), &[2.0, 2.0, 1.0, 1.0, 1.0]);
        assert_eq!(fv.label(), ClassLabel::Unknown);
    }

    #[test]
    fn test_subscriptions_are_union_of_children() {
        let c = composite();
        assert_eq!(
            c.subscriptions(),
            vec![EventKind::TouchInput, EventKind::KeyInput]
        );
        assert_eq!(c.child_count(), 2);
    }

    #[test]
    fn test_fresh_instance_starts_clean() {
        let mut c = composite();
        c.handle_event(&RawEvent::Tick, EventKind::TouchInput);
        let fresh = c.fresh_instance();
        assert!(fresh.export().is_none());
    }

    #[test]
    fn test_unrelated_kind_is_ignored() {
        let mut c = composite();
        assert!(!c.handle_event(&RawEvent::Tick, EventKind::MotionEvent));
    }
}
