use std::time::{Duration, Instant};

const MAX_TOASTS: usize = 4;
const DEFAULT_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToastEntry {
    pub id: u64,
    pub level: ToastLevel,
    pub title: String,
    pub body: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl ToastEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }
}

/// Newest-first queue of transient notifications.
#[derive(Debug, Default)]
pub struct Toast {
    next_id: u64,
    pub entries: Vec<ToastEntry>,
}

impl Toast {
    pub fn push(&mut self, level: ToastLevel, title: impl Into<String>, body: impl Into<String>) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;

        let entry = ToastEntry {
            id,
            level,
            title: title.into(),
            body: body.into(),
            created_at: Instant::now(),
            ttl: DEFAULT_TTL,
        };

        self.entries.insert(0, entry);
        self.entries.truncate(MAX_TOASTS);
        id
    }

    pub fn push_saved(&mut self, title: &str, updated: bool) {
        let heading = if updated { "Document updated" } else { "Document saved" };
        self.push(ToastLevel::Success, heading, title);
    }

    pub fn push_storage_error(&mut self, error: &dyn std::error::Error) {
        self.push(ToastLevel::Error, "Could not save documents", error.to_string());
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn latest(&self) -> Option<&ToastEntry> {
        self.entries.first()
    }

    /// Drops entries whose time-to-live has passed.
    pub fn tick(&mut self, now: Instant) {
        self.entries.retain(|entry| !entry.is_expired(now));
    }

    /// Removes and returns all entries, oldest first.
    pub fn drain(&mut self) -> Vec<ToastEntry> {
        let mut drained: Vec<ToastEntry> = self.entries.drain(..).collect();
        drained.reverse();
        drained
    }
}
