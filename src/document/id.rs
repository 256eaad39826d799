use chrono::{DateTime, Utc};

use crate::document::{Document, DocumentId};

/// Hands out millisecond-timestamp ids that never repeat within a process
/// and never collide with ids already in the collection.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(existing: &[Document]) -> Self {
        let last = existing
            .iter()
            .filter_map(|doc| doc.id.as_millis())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next_id(&mut self, existing: &[Document]) -> DocumentId {
        self.next_at(Utc::now(), existing)
    }

    pub fn next_at(&mut self, now: DateTime<Utc>, existing: &[Document]) -> DocumentId {
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let mut candidate = now_ms.max(self.last.saturating_add(1));
        while existing.iter().any(|doc| doc.id.as_str() == candidate.to_string()) {
            candidate = candidate.saturating_add(1);
        }
        self.last = candidate;
        DocumentId::new(candidate.to_string())
    }
}
