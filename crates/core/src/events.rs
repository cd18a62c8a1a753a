use crate::{RevealPhase, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    CatalogLoading,
    CatalogLoaded { count: usize },
    CatalogFailed { message: String },
    SelectionAdded { name: String, len: usize },
    SelectionRemoved { name: String, len: usize },
    SelectionCleared { removed: usize },
    SelectionRejected { name: String, capacity: usize },
    FilterApplied { term: String, matches: usize },
    PhaseEntered { phase: RevealPhase },
    WinnerRevealed { name: String, round: u32 },
    RevealClosed,
    RevealFailedClosed { reason: String },
    Notified { severity: Severity, message: String },
    NotificationExpired,
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
