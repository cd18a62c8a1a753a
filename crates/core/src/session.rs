//! The picker session: one catalog, one selection, one reveal at a time.
//!
//! `Session` is the single owner of all mutable picker state. Front-ends hold it
//! by value and pass the current clock reading into every call that can start
//! or observe a timer.

use crate::{
    load_json, save_json, CatalogState, Entity, Event, EventBus, FilterEngine, KeyValueStore,
    LoadError, Millis, Notification, Notifier, PickerConfig, RandomSelector, RevealError,
    RevealPhase, RevealSequencer, RngState, SelectionError, SelectionManager, Severity, Toggled,
    SEARCH_TERM_KEY,
};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Session<S> {
    config: PickerConfig,
    store: S,
    catalog: CatalogState,
    selection: SelectionManager,
    filter: FilterEngine,
    selector: RandomSelector,
    reveal: RevealSequencer,
    notifier: Notifier,
    events: EventBus,
}

impl<S: KeyValueStore> Session<S> {
    /// Restores selection and search term from `store`. The catalog starts out
    /// loading.
    pub fn open(config: PickerConfig, store: S) -> Self {
        let (selector, confetti) = match config.seed {
            Some(seed) => (
                RandomSelector::seeded(seed),
                RngState::from_seed(seed.rotate_left(17)),
            ),
            None => (RandomSelector::new(), RngState::from_clock()),
        };
        Self::with_selector(config, store, selector, confetti)
    }

    pub fn with_selector(
        config: PickerConfig,
        store: S,
        selector: RandomSelector,
        confetti: RngState,
    ) -> Self {
        let selection = SelectionManager::restore(&store);
        let term = load_json::<String>(&store, SEARCH_TERM_KEY).unwrap_or_default();
        info!(selected = selection.len(), term = %term, "session opened");
        Self {
            filter: FilterEngine::new(term, config.search_debounce_ms),
            reveal: RevealSequencer::new(config.reveal, confetti),
            notifier: Notifier::new(config.notification_ms),
            catalog: CatalogState::Loading,
            events: EventBus::default(),
            config,
            store,
            selection,
            selector,
        }
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn reveal(&self) -> &RevealSequencer {
        &self.reveal
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn search_term(&self) -> &str {
        self.filter.raw_term()
    }

    pub fn effective_term(&self) -> &str {
        self.filter.effective_term()
    }

    /// Catalog entries matching the effective search term, in catalog order.
    pub fn filtered(&self) -> &[Entity] {
        self.filter.view()
    }

    pub fn begin_load(&mut self) {
        self.catalog = CatalogState::Loading;
        self.events.push(Event::CatalogLoading);
    }

    pub fn finish_load(&mut self, result: Result<Vec<Entity>, LoadError>) {
        match result {
            Ok(entities) => {
                info!(count = entities.len(), "catalog loaded");
                self.events.push(Event::CatalogLoaded {
                    count: entities.len(),
                });
                self.filter.refresh(&entities);
                self.catalog = CatalogState::Ready(entities);
            }
            Err(err) => {
                warn!(error = %err, "catalog failed to load");
                self.events.push(Event::CatalogFailed {
                    message: err.to_string(),
                });
                self.filter.refresh(&[]);
                self.catalog = CatalogState::Failed(err);
            }
        }
    }

    /// Moves a failed catalog back to loading. The caller then reloads and
    /// reports through `finish_load`. Returns false when there is nothing to
    /// retry.
    pub fn retry_load(&mut self) -> bool {
        if self.catalog.error().is_none() {
            return false;
        }
        self.begin_load();
        true
    }

    pub fn set_search_term(&mut self, term: impl Into<String>, now: Millis) {
        self.filter.set_term(term, now);
        save_json(&mut self.store, SEARCH_TERM_KEY, self.filter.raw_term());
    }

    pub fn toggle_entity(
        &mut self,
        entity: &Entity,
        now: Millis,
    ) -> Result<Toggled, SelectionError> {
        match self.selection.toggle(entity, &mut self.store) {
            Ok(toggled) => {
                let name = entity.name.clone();
                let len = self.selection.len();
                self.events.push(match toggled {
                    Toggled::Added => Event::SelectionAdded { name, len },
                    Toggled::Removed => Event::SelectionRemoved { name, len },
                });
                self.reveal
                    .on_selection_changed(self.selection.items(), &mut self.events);
                Ok(toggled)
            }
            Err(err) => {
                let SelectionError::CapacityExceeded { capacity } = &err;
                self.events.push(Event::SelectionRejected {
                    name: entity.name.clone(),
                    capacity: *capacity,
                });
                self.notify(err.to_string(), Severity::Error, now);
                Err(err)
            }
        }
    }

    pub fn clear_selection(&mut self) {
        let removed = self.selection.clear(&mut self.store);
        self.events.push(Event::SelectionCleared { removed });
        self.reveal
            .on_selection_changed(self.selection.items(), &mut self.events);
    }

    pub fn can_pick(&self) -> bool {
        self.selection.can_pick() && !self.reveal.is_active()
    }

    /// Draws a winner from the current selection and starts the reveal.
    pub fn request_pick(&mut self, now: Millis) -> Result<Entity, RevealError> {
        if self.reveal.is_active() {
            return Err(RevealError::InvalidTransition {
                action: "request a pick",
                phase: self.reveal.phase(),
            });
        }
        let pool = self.selection.snapshot();
        let winner = match self.selector.pick(&pool) {
            Ok(winner) => winner.clone(),
            Err(err) => {
                warn!(error = %err, "pick requested with an invalid selection");
                return Err(err.into());
            }
        };
        debug!(pool = pool.len(), winner = %winner.name, "pick requested");
        self.reveal
            .start(pool, winner.clone(), now, &mut self.events)?;
        Ok(winner)
    }

    pub fn pick_again(&mut self, now: Millis) -> Result<Entity, RevealError> {
        self.reveal
            .pick_again(&mut self.selector, now, &mut self.events)
            .cloned()
    }

    pub fn close_reveal(&mut self) {
        self.reveal.close(&mut self.events);
    }

    pub fn reveal_phase(&self) -> RevealPhase {
        self.reveal.phase()
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Millis) {
        let message = message.into();
        self.events.push(Event::Notified {
            severity,
            message: message.clone(),
        });
        self.notifier.show(message, severity, now);
    }

    /// Runs everything that became due by `now`: the debounced filter, reveal
    /// timers and notification expiry.
    pub fn advance(&mut self, now: Millis) {
        if self.filter.poll(now, self.catalog.entities()) {
            self.events.push(Event::FilterApplied {
                term: self.filter.effective_term().to_string(),
                matches: self.filter.view().len(),
            });
        }
        self.reveal.advance(now, &mut self.events);
        if self.notifier.expire(now).is_some() {
            self.events.push(Event::NotificationExpired);
        }
    }

    /// Earliest pending deadline across debounce, reveal and notification timers.
    pub fn next_deadline(&self) -> Option<Millis> {
        let notification = self.notifier.current().map(Notification::expires_at);
        [self.filter.deadline(), self.reveal.next_deadline(), notification]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain().collect()
    }

    /// Closes any reveal, writes both slots one last time and hands the store
    /// back.
    pub fn shutdown(mut self) -> S {
        self.reveal.close(&mut self.events);
        self.selection.persist(&mut self.store);
        save_json(&mut self.store, SEARCH_TERM_KEY, self.filter.raw_term());
        if let Err(err) = self.store.flush() {
            warn!(error = %err, "final flush failed");
        }
        info!("session closed");
        self.store
    }
}
