//! Keystroke bigram timing measurement.
//!
//! Observes successive contents of a text field. When exactly one character
//! was appended and both it and the previous character are letters or
//! spaces, the inter-key time is stored at the index of that bigram in a
//! 27 x 27 vector (space, a..z). Deletions, host suggestions and edits in
//! the middle of the text reset the typing context.

use super::{EventKind, FeatureSelection, Measurement, RawEvent};
use crate::core::feature_vector::{ClassLabel, FeatureVector};

const ALPHABET: usize = 27;

/// Size of the bigram vector.
pub const NUM_BIGRAM_FEATURES: usize = ALPHABET * ALPHABET;

/// Names of the bigram features, e.g. `"th"` or `" a"`.
pub fn bigram_feature_names() -> Vec<String> {
    let symbols: Vec<char> = std::iter::once(' ').chain('a'..='z').collect();
    symbols
        .iter()
        .flat_map(|&a| symbols.iter().map(move |&b| format!("{a}{b}")))
        .collect()
}

fn symbol_index(c: char) -> Option<usize> {
    match c.to_ascii_lowercase() {
        ' ' => Some(0),
        l @ 'a'..='z' => Some(l as usize - 'a' as usize + 1),
        _ => None,
    }
}

/// Index of the bigram `(first, second)`, if both are letters or spaces.
pub fn bigram_index(first: char, second: char) -> Option<usize> {
    Some(symbol_index(first)? * ALPHABET + symbol_index(second)?)
}

#[derive(Debug, Clone, Default)]
struct TypingContext {
    text: String,
    last_char: Option<char>,
    last_timestamp_ms: i64,
}

/// Bigram timing collector for key input.
#[derive(Debug, Clone)]
pub struct KeystrokeMeasurement {
    selection: FeatureSelection,
    context: TypingContext,
    completed: Option<FeatureVector>,
}

impl KeystrokeMeasurement {
    pub fn new() -> Self {
        Self::with_selection(FeatureSelection::all(&bigram_feature_names()))
    }

    pub fn with_selection(selection: FeatureSelection) -> Self {
        Self {
            selection,
            context: TypingContext::default(),
            completed: None,
        }
    }

    fn observe(&mut self, text: &str, timestamp_ms: i64) -> bool {
        let previous = &self.context.text;
        let prev_len = previous.chars().count();
        let len = text.chars().count();

        if len == prev_len {
            // Replacement by the host, e.g. an autocorrect suggestion.
            return false;
        }

        let mut sample = None;
        let mut appended = None;
        if len == prev_len + 1 && text.starts_with(previous.as_str()) {
            if let Some(c) = text.chars().last() {
                appended = Some(c);
                let bigram = self.context.last_char.and_then(|prev| bigram_index(prev, c));
                if let Some(index) = bigram {
                    let mut values = vec![0.0; NUM_BIGRAM_FEATURES];
                    values[index] =
                        timestamp_ms.saturating_sub(self.context.last_timestamp_ms) as f64;
                    sample = Some(FeatureVector::new(values, ClassLabel::Unknown));
                }
            }
        }

        self.context = TypingContext {
            text: text.to_string(),
            last_char: appended,
            last_timestamp_ms: if appended.is_some() { timestamp_ms } else { 0 },
        };

        match sample {
            Some(fv) => {
                self.completed = Some(fv);
                true
            }
            None => false,
        }
    }
}

impl Default for KeystrokeMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurement for KeystrokeMeasurement {
    fn name(&self) -> &'static str {
        "keystroke"
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![EventKind::KeyInput]
    }

    fn handle_event(&mut self, event: &RawEvent, _kind: EventKind) -> bool {
        match event {
            RawEvent::Text { text, timestamp_ms } => self.observe(text, *timestamp_ms),
            _ => false,
        }
    }

    fn export(&self) -> Option<FeatureVector> {
        self.completed.as_ref().map(|fv| self.selection.filter(fv))
    }

    fn fresh_instance(&self) -> Box<dyn Measurement> {
        let mut fresh = KeystrokeMeasurement::with_selection(self.selection.clone());
        fresh.context = self.context.clone();
        Box::new(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(m: &mut KeystrokeMeasurement, text: &str, at: i64) -> bool {
        m.handle_event(
            &RawEvent::Text {
                text: text.to_string(),
                timestamp_ms: at,
            },
            EventKind::KeyInput,
        )
    }

    #[test]
    fn test_bigram_index() {
        assert_eq!(bigram_index(' ', ' '), Some(0));
        assert_eq!(bigram_index('a', 'b'), Some(27 + 2));
        assert_eq!(bigram_index('T', 'h'), bigram_index('t', 'h'));
        assert_eq!(bigram_index('1', 'a'), None);
        assert_eq!(bigram_feature_names()[27 + 2], "ab");
        assert_eq!(bigram_feature_names().len(), NUM_BIGRAM_FEATURES);
    }

    #[test]
    fn test_first_key_has_no_bigram() {
        let mut m = KeystrokeMeasurement::new();
        assert!(!typed(&mut m, "t", 100));
        assert!(typed(&mut m, "th", 250));

        let fv = m.export().unwrap();
        assert_eq!(fv.len(), NUM_BIGRAM_FEATURES);
        assert_eq!(fv.label(), ClassLabel::Unknown);
        let index = bigram_index('t', 'h').unwrap();
        assert_eq!(fv.as_slice()[index], 150.0);
        assert_eq!(fv.as_slice().iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn test_deletion_and_suggestion_reset_context() {
        let mut m = KeystrokeMeasurement::new();
        typed(&mut m, "a", 0);
        assert!(typed(&mut m, "ab", 10));
        assert!(!typed(&mut m, "a", 20)); // backspace
        assert!(!typed(&mut m, "ac", 30)); // no previous char after deletion
        assert!(!typed(&mut m, "ad", 40)); // same length replacement
    }

    #[test]
    fn test_non_letters_do_not_complete() {
        let mut m = KeystrokeMeasurement::new();
        typed(&mut m, "a", 0);
        assert!(!typed(&mut m, "a1", 10));
        assert!(!typed(&mut m, "a1b", 20));
    }

    #[test]
    fn test_fresh_instance_keeps_context() {
        let mut m = KeystrokeMeasurement::new();
        typed(&mut m, "h", 0);
        assert!(typed(&mut m, "hi", 90));

        let mut fresh = m.fresh_instance();
        assert!(fresh.export().is_none());
        assert!(fresh.handle_event(
            &RawEvent::Text {
                text: "hi ".to_string(),
                timestamp_ms: 200,
            },
            EventKind::KeyInput,
        ));
        let index = bigram_index('i', ' ').unwrap();
        assert_eq!(fresh.export().unwrap().as_slice()[index], 110.0);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut m = KeystrokeMeasurement::new();
        typed(&mut m, "a", i64::MAX);
        assert!(typed(&mut m, "ab", i64::MIN));

        let index = bigram_index('a', 'b').unwrap();
        assert_eq!(m.export().unwrap().as_slice()[index], i64::MIN as f64);
    }
}
