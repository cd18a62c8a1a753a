use crate::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub shown_at: Millis,
    pub duration: Millis,
}

impl Notification {
    pub fn expires_at(&self) -> Millis {
        self.shown_at.saturating_add(self.duration)
    }
}

/// Holds at most one visible notification; showing another replaces it.
#[derive(Debug, Clone)]
pub struct Notifier {
    default_duration: Millis,
    current: Option<Notification>,
}

impl Notifier {
    pub fn new(default_duration: Millis) -> Self {
        Self {
            default_duration,
            current: None,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now: Millis) {
        self.show_for(message, severity, now, self.default_duration);
    }

    pub fn show_for(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: Millis,
        duration: Millis,
    ) {
        self.current = Some(Notification {
            message: message.into(),
            severity,
            shown_at: now,
            duration,
        });
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.current.take()
    }

    /// Drops the current notification once its duration has passed.
    pub fn expire(&mut self, now: Millis) -> Option<Notification> {
        match &self.current {
            Some(current) if now >= current.expires_at() => self.current.take(),
            _ => None,
        }
    }
}
