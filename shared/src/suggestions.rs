//! Per-input place suggestions with independent debounce timers.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::MIN_SEARCH_LENGTH;
use crate::debounce::Debouncer;
use crate::geocode::{GeocodeFeature, filter_suggestions};

#[derive(Debug)]
struct FieldState<H> {
    debouncer: Debouncer<H>,
    term: String,
    suggestions: Vec<GeocodeFeature>,
}

#[derive(Debug)]
pub struct SuggestionBoard<H> {
    delay: Duration,
    fields: HashMap<usize, FieldState<H>>,
}

impl<H> SuggestionBoard<H> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fields: HashMap::new(),
        }
    }

    fn field(&mut self, index: usize) -> &mut FieldState<H> {
        let delay = self.delay;
        self.fields.entry(index).or_insert_with(|| FieldState {
            debouncer: Debouncer::new(delay),
            term: String::new(),
            suggestions: Vec::new(),
        })
    }

    /// Handles a keystroke in input `index`.
    ///
    /// Terms of at least two characters (re)start that input's timer and
    /// return `true`; shorter ones cancel it and clear its suggestions.
    pub fn on_input(&mut self, index: usize, text: &str, start: impl FnOnce(Duration) -> H) -> bool {
        let field = self.field(index);
        field.term = text.to_string();
        if text.trim().chars().count() >= MIN_SEARCH_LENGTH {
            field.debouncer.schedule(start);
            true
        } else {
            field.debouncer.cancel();
            field.suggestions.clear();
            false
        }
    }

    /// Timer for input `index` elapsed; returns the term to search for.
    pub fn fire(&mut self, index: usize) -> Option<String> {
        let field = self.fields.get_mut(&index)?;
        field.debouncer.fire().then(|| field.term.clone())
    }

    /// Stores a geocoding answer for input `index`.
    ///
    /// Answers are applied in arrival order, so a slow response for an older
    /// term can replace a newer one.
    // TODO: tag requests with a per-input generation and drop stale answers.
    pub fn apply(&mut self, index: usize, term: &str, features: Vec<GeocodeFeature>) {
        let filtered = filter_suggestions(term, features);
        tracing::debug!(index, term, count = filtered.len(), "suggestions updated");
        self.field(index).suggestions = filtered;
    }

    pub fn suggestions(&self, index: usize) -> &[GeocodeFeature] {
        self.fields
            .get(&index)
            .map(|field| field.suggestions.as_slice())
            .unwrap_or_default()
    }

    /// Hides suggestions for input `index` and cancels its pending search.
    pub fn dismiss(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(&index) {
            field.debouncer.cancel();
            field.suggestions.clear();
        }
    }

    /// Drops all state for input `index` and shifts later inputs down by one.
    pub fn remove(&mut self, index: usize) {
        self.fields.remove(&index);
        let mut shifted: Vec<usize> = self.fields.keys().copied().filter(|k| *k > index).collect();
        // Ascending, so `key - 1` is always already vacated.
        shifted.sort_unstable();
        for key in shifted {
            if let Some(field) = self.fields.remove(&key) {
                self.fields.insert(key - 1, field);
            }
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::testing::{FakeClock, FakeTimer};
    use crate::geocode::{PlaceProperties, PointGeometry};

    fn board() -> SuggestionBoard<FakeTimer> {
        SuggestionBoard::new(Duration::from_millis(200))
    }

    fn place(label: &str) -> GeocodeFeature {
        GeocodeFeature {
            geometry: PointGeometry {
                coordinates: [2.35, 48.85],
            },
            properties: PlaceProperties {
                label: Some(label.to_string()),
                ..PlaceProperties::default()
            },
        }
    }

    #[test]
    fn test_short_terms_do_not_search() {
        let clock = FakeClock::default();
        let mut board = board();
        assert!(!board.on_input(0, " p ", |d| clock.start(d)));
        assert_eq!(board.fire(0), None);
    }

    #[test]
    fn test_keystrokes_restart_only_their_own_field() {
        let clock = FakeClock::default();
        let mut board = board();

        assert!(board.on_input(0, "pa", |d| clock.start(d))); // timer 1
        assert!(board.on_input(1, "lo", |d| clock.start(d))); // timer 2
        assert!(board.on_input(0, "par", |d| clock.start(d))); // timer 3 replaces 1

        assert_eq!(clock.cancelled(), vec![1]);
        assert_eq!(board.fire(0).as_deref(), Some("par"));
        assert_eq!(board.fire(1).as_deref(), Some("lo"));
        assert_eq!(board.fire(0), None);
    }

    #[test]
    fn test_shortening_the_term_cancels_and_clears() {
        let clock = FakeClock::default();
        let mut board = board();
        board.apply(0, "pa", vec![place("Paris")]);
        board.on_input(0, "pa", |d| clock.start(d));

        assert!(!board.on_input(0, "p", |d| clock.start(d)));
        assert!(board.suggestions(0).is_empty());
        assert_eq!(board.fire(0), None);
    }

    #[test]
    fn test_late_answer_for_older_term_wins() {
        let mut board = board();
        board.apply(0, "pari", vec![place("Paris, France")]);
        board.apply(0, "pa", vec![place("Pamplona")]);

        let labels: Vec<_> = board.suggestions(0).iter().filter_map(|f| f.title()).collect();
        assert_eq!(labels, vec!["Pamplona"]);
    }

    #[test]
    fn test_remove_shifts_later_fields() {
        let mut board = board();
        board.apply(0, "a", vec![place("Alpha")]);
        board.apply(1, "b", vec![place("Bravo")]);
        board.apply(2, "c", vec![place("Charlie")]);

        board.remove(1);
        assert_eq!(board.suggestions(1)[0].title(), Some("Charlie"));
        assert!(board.suggestions(2).is_empty());
    }

    #[test]
    fn test_remove_first_of_many_keeps_order() {
        let clock = FakeClock::default();
        let mut board = board();
        let labels = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"];
        for (index, label) in labels.iter().enumerate() {
            board.on_input(index, label, |d| clock.start(d));
            board.apply(index, "x", vec![place(label)]);
        }

        board.remove(0);
        let remaining: Vec<_> = (0..labels.len())
            .map(|index| board.suggestions(index).first().and_then(|f| f.title()))
            .collect();
        assert_eq!(
            remaining,
            vec![Some("Bravo"), Some("Charlie"), Some("Delta"), Some("Echo"), Some("Foxtrot"), None]
        );
        // Pending searches moved with their fields.
        assert_eq!(board.fire(0).as_deref(), Some("Bravo"));
        assert_eq!(board.fire(4).as_deref(), Some("Foxtrot"));
        assert_eq!(board.fire(5), None);
    }

    #[test]
    fn test_dismiss() {
        let clock = FakeClock::default();
        let mut board = board();
        board.on_input(3, "lon", |d| clock.start(d));
        board.apply(3, "lon", vec![place("London")]);

        board.dismiss(3);
        assert!(board.suggestions(3).is_empty());
        assert_eq!(clock.cancelled(), vec![1]);
    }
}
