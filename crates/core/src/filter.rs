use crate::{Entity, Millis, TimerId, TimerQueue};
use tracing::debug;

pub const SEARCH_TERM_KEY: &str = "searchTerm";

/// Case-insensitive substring match on the name. A blank term keeps everything.
pub fn filter_catalog(catalog: &[Entity], term: &str) -> Vec<Entity> {
    if term.trim().is_empty() {
        return catalog.to_vec();
    }
    let needle = term.to_lowercase();
    catalog
        .iter()
        .filter(|entity| entity.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Delays a value until it has been left alone for `delay` milliseconds.
/// Pushing a new value cancels the pending one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Millis,
    timers: TimerQueue<()>,
    pending: Option<(TimerId, T)>,
    settled: T,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Millis) -> Self {
        Self {
            delay,
            timers: TimerQueue::new(),
            pending: None,
            settled: initial,
        }
    }

    pub fn push(&mut self, value: T, now: Millis) {
        if let Some((id, _)) = self.pending.take() {
            self.timers.cancel(id);
        }
        let id = self.timers.once(now, self.delay, ());
        self.pending = Some((id, value));
    }

    /// Settles the pending value if its quiet period is over. Returns the new
    /// settled value only when it differs from the previous one.
    pub fn poll(&mut self, now: Millis) -> Option<&T> {
        let fired = self.timers.pop_due(now)?;
        let (id, value) = self.pending.take()?;
        if id != fired.id {
            self.pending = Some((id, value));
            return None;
        }
        if value == self.settled {
            return None;
        }
        self.settled = value;
        Some(&self.settled)
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.timers.next_due()
    }
}

/// Derived, debounced view of the catalog for the current search term.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    raw: String,
    term: Debouncer<String>,
    view: Vec<Entity>,
}

impl FilterEngine {
    /// A restored term takes effect immediately.
    pub fn new(initial_term: impl Into<String>, delay: Millis) -> Self {
        let raw = initial_term.into();
        Self {
            term: Debouncer::new(raw.clone(), delay),
            raw,
            view: Vec::new(),
        }
    }

    pub fn set_term(&mut self, term: impl Into<String>, now: Millis) {
        self.raw = term.into();
        self.term.push(self.raw.clone(), now);
    }

    pub fn raw_term(&self) -> &str {
        &self.raw
    }

    pub fn effective_term(&self) -> &str {
        self.term.settled()
    }

    pub fn is_settling(&self) -> bool {
        self.term.is_pending()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.term.deadline()
    }

    pub fn refresh(&mut self, catalog: &[Entity]) {
        self.view = filter_catalog(catalog, self.term.settled());
    }

    /// Applies a settled term to the view. Returns true when the view changed.
    pub fn poll(&mut self, now: Millis, catalog: &[Entity]) -> bool {
        let Some(term) = self.term.poll(now) else {
            return false;
        };
        self.view = filter_catalog(catalog, term);
        debug!(term = %term, matches = self.view.len(), "filter applied");
        true
    }

    pub fn view(&self) -> &[Entity] {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Entity> {
        ["Ashka", "Brann", "Cassia", "dashiel", "Ember"]
            .into_iter()
            .map(|name| Entity::new(name, ""))
            .collect()
    }

    fn names(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|entity| entity.name.as_str()).collect()
    }

    #[test]
    fn blank_term_keeps_catalog() {
        let all = catalog();
        assert_eq!(filter_catalog(&all, ""), all);
        assert_eq!(filter_catalog(&all, "   "), all);
    }

    #[test]
    fn matches_case_insensitive_substring_in_order() {
        let all = catalog();
        assert_eq!(names(&filter_catalog(&all, "ASH")), vec!["Ashka", "dashiel"]);
        assert_eq!(names(&filter_catalog(&all, "a")).len(), 4);
        assert!(filter_catalog(&all, "zz").is_empty());
    }

    #[test]
    fn rapid_edits_collapse_to_last_value() {
        let all = catalog();
        let mut engine = FilterEngine::new("", 200);
        engine.refresh(&all);
        let mut updates = Vec::new();
        for (at, term) in [(0, "a"), (50, "as"), (100, "ash")] {
            engine.set_term(term, at);
        }
        for now in (100..=600).step_by(10) {
            if engine.poll(now, &all) {
                updates.push((now, engine.effective_term().to_string()));
            }
        }
        assert_eq!(updates, vec![(300, "ash".to_string())]);
        assert_eq!(names(engine.view()), vec!["Ashka", "dashiel"]);
    }

    #[test]
    fn term_does_not_apply_before_quiet_period() {
        let all = catalog();
        let mut engine = FilterEngine::new("", 200);
        engine.refresh(&all);
        engine.set_term("ember", 1_000);
        assert!(!engine.poll(1_199, &all));
        assert_eq!(engine.effective_term(), "");
        assert_eq!(engine.view().len(), 5);
        assert!(engine.poll(1_200, &all));
        assert_eq!(names(engine.view()), vec!["Ember"]);
    }

    #[test]
    fn settling_on_same_term_is_not_an_update() {
        let all = catalog();
        let mut engine = FilterEngine::new("ash", 200);
        engine.refresh(&all);
        engine.set_term("ashk", 0);
        engine.set_term("ash", 100);
        assert!(!engine.poll(1_000, &all));
        assert!(!engine.is_settling());
    }
}
