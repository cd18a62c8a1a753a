use crate::persistence::JsonFileStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use heropick_core::{
    CatalogState, Entity, Event, Millis, PickerConfig, RevealError, RevealPhase, Session, Severity,
    Toggled,
};
use heropick_data::load_catalog;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

const MAX_EVENT_LOG: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Catalog,
    Selected,
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    Wall(Instant),
    #[cfg_attr(not(test), allow(dead_code))]
    Manual(Millis),
}

impl Clock {
    fn now(self) -> Millis {
        match self {
            Self::Wall(started) => started.elapsed().as_millis() as Millis,
            Self::Manual(now) => now,
        }
    }
}

pub struct App {
    pub session: Session<JsonFileStore>,
    pub catalog_path: PathBuf,
    pub focus: FocusPane,
    pub catalog_cursor: usize,
    pub selected_cursor: usize,
    pub items_to_show: usize,
    pub search_active: bool,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub should_quit: bool,
    clock: Clock,
}

impl App {
    pub fn bootstrap(config: PickerConfig, store: JsonFileStore, catalog_path: PathBuf) -> Self {
        Self::with_clock(config, store, catalog_path, Clock::Wall(Instant::now()))
    }

    fn with_clock(
        config: PickerConfig,
        store: JsonFileStore,
        catalog_path: PathBuf,
        clock: Clock,
    ) -> Self {
        let items_to_show = config.page_size;
        let mut app = Self {
            session: Session::open(config, store),
            catalog_path,
            focus: FocusPane::Catalog,
            catalog_cursor: 0,
            selected_cursor: 0,
            items_to_show,
            search_active: false,
            event_log: VecDeque::new(),
            status_line: "ready".to_string(),
            show_help: false,
            should_quit: false,
            clock,
        };
        app.reload();
        app
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    pub fn reload(&mut self) {
        self.session.begin_load();
        let result = load_catalog(&self.catalog_path);
        self.session.finish_load(result);
        self.items_to_show = self.page_size();
        self.flush_events();
        self.normalize_cursors();
    }

    pub fn retry(&mut self) {
        if !self.session.retry_load() {
            self.push_status("catalog already loaded");
            return;
        }
        let result = load_catalog(&self.catalog_path);
        self.session.finish_load(result);
        self.items_to_show = self.page_size();
        self.flush_events();
        self.normalize_cursors();
    }

    pub fn on_tick(&mut self) {
        let now = self.now();
        self.session.advance(now);
        self.flush_events();
        self.normalize_cursors();
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Catalog => FocusPane::Selected,
            FocusPane::Selected => FocusPane::Catalog,
        };
    }

    pub fn move_cursor(&mut self, down: bool) {
        match self.focus {
            FocusPane::Catalog => {
                let len = self.visible_catalog().len();
                move_index(&mut self.catalog_cursor, len, down);
            }
            FocusPane::Selected => {
                let len = self.session.selection().len();
                move_index(&mut self.selected_cursor, len, down);
            }
        }
    }

    pub fn toggle_focused(&mut self) {
        let target = match self.focus {
            FocusPane::Catalog => self.visible_catalog().get(self.catalog_cursor).cloned(),
            FocusPane::Selected => self
                .session
                .selection()
                .items()
                .get(self.selected_cursor)
                .cloned(),
        };
        let Some(entity) = target else {
            return;
        };
        let now = self.now();
        match self.session.toggle_entity(&entity, now) {
            Ok(Toggled::Added) => self.push_status(format!("selected {}", entity.name)),
            Ok(Toggled::Removed) => self.push_status(format!("removed {}", entity.name)),
            Err(err) => self.push_status(err.to_string()),
        }
        self.flush_events();
        self.normalize_cursors();
    }

    pub fn clear_selection(&mut self) {
        if self.session.selection().is_empty() {
            self.push_status("nothing selected");
            return;
        }
        self.session.clear_selection();
        let now = self.now();
        self.session.notify("selection cleared", Severity::Info, now);
        self.push_status("selection cleared");
        self.flush_events();
        self.normalize_cursors();
    }

    pub fn can_pick(&self) -> bool {
        self.session.can_pick()
    }

    pub fn request_pick(&mut self) {
        if !self.session.selection().can_pick() {
            self.push_status("select between 1 and 10 heroes to pick");
            return;
        }
        let now = self.now();
        match self.session.request_pick(now) {
            Ok(_) => self.push_status("spinning"),
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn pick_again(&mut self) {
        if self.session.reveal_phase() != RevealPhase::Revealed {
            return;
        }
        let now = self.now();
        match self.session.pick_again(now) {
            Ok(_) => self.push_status("spinning again"),
            Err(err) => self.push_error(err),
        }
        self.flush_events();
    }

    pub fn close_reveal(&mut self) {
        self.session.close_reveal();
        self.flush_events();
    }

    pub fn reveal_open(&self) -> bool {
        self.session.reveal_phase() != RevealPhase::Idle
    }

    pub fn activate_primary(&mut self) {
        if self.session.catalog().error().is_some() {
            self.retry();
            return;
        }
        match self.session.reveal_phase() {
            RevealPhase::Revealed => self.close_reveal(),
            RevealPhase::Spinning | RevealPhase::Decelerating => {}
            RevealPhase::Idle => {
                if self.focus == FocusPane::Catalog
                    && self.catalog_cursor + 1 == self.visible_catalog().len()
                    && self.remaining() > 0
                {
                    self.load_more();
                } else {
                    self.toggle_focused();
                }
            }
        }
    }

    pub fn load_more(&mut self) {
        let remaining = self.remaining();
        if remaining == 0 {
            self.push_status("all heroes shown");
            return;
        }
        self.items_to_show += self.page_size();
        self.push_status(format!("showing {} more", remaining.min(self.page_size())));
    }

    pub fn begin_search(&mut self) {
        self.search_active = true;
    }

    pub fn clear_search(&mut self) {
        let now = self.now();
        self.session.set_search_term("", now);
    }

    /// Consumes keys while the search box is focused.
    pub fn handle_search_key(&mut self, key: KeyEvent) -> bool {
        if !self.search_active {
            return false;
        }
        let mut term = self.session.search_term().to_string();
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => {
                self.search_active = false;
                return true;
            }
            KeyCode::Backspace => {
                if term.pop().is_none() {
                    return true;
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => term.clear(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return true;
            }
            KeyCode::Char(ch) => term.push(ch),
            _ => return true,
        }
        let now = self.now();
        self.session.set_search_term(term, now);
        true
    }

    pub fn is_filtering(&self) -> bool {
        self.session.search_term() != self.session.effective_term()
    }

    pub fn visible_catalog(&self) -> &[Entity] {
        let filtered = self.session.filtered();
        &filtered[..filtered.len().min(self.items_to_show)]
    }

    pub fn remaining(&self) -> usize {
        self.session
            .filtered()
            .len()
            .saturating_sub(self.items_to_show)
    }

    pub fn catalog(&self) -> &CatalogState {
        self.session.catalog()
    }

    pub fn normalize_cursors(&mut self) {
        let catalog_len = self.visible_catalog().len();
        clamp_index(&mut self.catalog_cursor, catalog_len);
        let selected_len = self.session.selection().len();
        clamp_index(&mut self.selected_cursor, selected_len);
    }

    pub fn push_status(&mut self, value: impl Into<String>) {
        self.status_line = value.into();
    }

    pub fn push_error(&mut self, err: RevealError) {
        self.status_line = format!("error: {err}");
    }

    /// Writes the session out and hands the state file back.
    pub fn shutdown(self) -> JsonFileStore {
        let store = self.session.shutdown();
        info!(path = %store.path().display(), "state saved");
        store
    }

    fn page_size(&self) -> usize {
        self.session.config().page_size.max(1)
    }

    fn flush_events(&mut self) {
        let drained = self.session.drain_events();
        for event in drained {
            match &event {
                Event::FilterApplied { .. } => {
                    self.items_to_show = self.page_size();
                    self.catalog_cursor = 0;
                }
                Event::WinnerRevealed { name, .. } => {
                    self.status_line = format!("winner: {name}");
                }
                Event::RevealFailedClosed { reason } => {
                    self.status_line = format!("reveal closed: {reason}");
                }
                _ => {}
            }
            self.push_event_line(format_event(&event));
        }
    }

    fn push_event_line(&mut self, line: String) {
        if self.event_log.len() >= MAX_EVENT_LOG {
            let _ = self.event_log.pop_front();
        }
        self.event_log.push_back(line);
    }
}

fn move_index(value: &mut usize, len: usize, down: bool) {
    if len == 0 {
        *value = 0;
        return;
    }
    if down {
        *value = (*value + 1) % len;
    } else if *value == 0 {
        *value = len - 1;
    } else {
        *value -= 1;
    }
}

fn clamp_index(value: &mut usize, len: usize) {
    if len == 0 {
        *value = 0;
    } else if *value >= len {
        *value = len - 1;
    }
}

pub fn phase_label(phase: RevealPhase) -> &'static str {
    match phase {
        RevealPhase::Idle => "idle",
        RevealPhase::Spinning => "spinning",
        RevealPhase::Decelerating => "slowing down",
        RevealPhase::Revealed => "revealed",
    }
}

fn format_event(event: &Event) -> String {
    match event {
        Event::CatalogLoading => "loading heroes".to_string(),
        Event::CatalogLoaded { count } => format!("loaded {count} heroes"),
        Event::CatalogFailed { message } => format!("load failed: {message}"),
        Event::SelectionAdded { name, len } => format!("+ {name} ({len}/10)"),
        Event::SelectionRemoved { name, len } => format!("- {name} ({len}/10)"),
        Event::SelectionCleared { removed } => format!("cleared {removed} heroes"),
        Event::SelectionRejected { name, capacity } => {
            format!("rejected {name}: limit is {capacity}")
        }
        Event::FilterApplied { term, matches } => {
            if term.trim().is_empty() {
                format!("filter cleared ({matches} heroes)")
            } else {
                format!("filter {term:?}: {matches} matches")
            }
        }
        Event::PhaseEntered { phase } => format!("reveal {}", phase_label(*phase)),
        Event::WinnerRevealed { name, round } => format!("round {round} winner: {name}"),
        Event::RevealClosed => "reveal closed".to_string(),
        Event::RevealFailedClosed { reason } => format!("reveal aborted: {reason}"),
        Event::Notified { severity, message } => format!("[{severity:?}] {message}"),
        Event::NotificationExpired => "notification dismissed".to_string(),
    }
}
