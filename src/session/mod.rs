//! Create/update/cancel/delete lifecycle of the document being edited.
//!
//! The session owns the in-memory collection and writes it through the store
//! in full after every mutation. Draft content lives only in the engine.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    document::{
        Document, DocumentId, IdGenerator, TitleDeriver,
        store::{DocumentStore, KeyValueBackend, StorageError},
    },
    editor::{EMPTY_DOCUMENT, RichTextEngine},
};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The in-memory collection changed but could not be written.
    #[error("could not persist documents: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Composing,
    Editing(DocumentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Buffer was blank; nothing happened.
    Skipped,
    Created(DocumentId),
    Updated(DocumentId),
    /// The edited document no longer exists. Nothing was written.
    TargetMissing(DocumentId),
}

pub fn is_blank_content(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == EMPTY_DOCUMENT
}

#[derive(Debug)]
pub struct Session<B> {
    store: DocumentStore<B>,
    documents: Vec<Document>,
    state: SessionState,
    ids: IdGenerator,
    titles: TitleDeriver,
}

impl<B: KeyValueBackend> Session<B> {
    pub fn open(store: DocumentStore<B>) -> Self {
        Self::with_title_deriver(store, TitleDeriver::default())
    }

    pub fn with_title_deriver(store: DocumentStore<B>, titles: TitleDeriver) -> Self {
        let documents = store.load_all();
        let ids = IdGenerator::seeded(&documents);
        info!(key = store.key(), count = documents.len(), "session opened");
        Self {
            store,
            documents,
            state: SessionState::Composing,
            ids,
            titles,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn editing_target(&self) -> Option<&DocumentId> {
        match &self.state {
            SessionState::Editing(id) => Some(id),
            SessionState::Composing => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing_target().is_some()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| &doc.id == id)
    }

    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }

    pub fn titles(&self) -> &TitleDeriver {
        &self.titles
    }

    pub fn save(&mut self, engine: &mut dyn RichTextEngine) -> Result<SaveOutcome> {
        self.save_at(engine, Utc::now())
    }

    /// Saves the buffer as of `now`. Except for a blank buffer, the session
    /// always returns to composing with a cleared engine, even when the write
    /// fails; the in-memory collection then stays ahead of storage.
    pub fn save_at(&mut self, engine: &mut dyn RichTextEngine, now: DateTime<Utc>) -> Result<SaveOutcome> {
        let content = engine.serialized_text();
        if is_blank_content(content.as_str()) {
            debug!("save skipped, buffer is empty");
            return Ok(SaveOutcome::Skipped);
        }

        let title = self.titles.derive(content.as_str());
        let outcome = match std::mem::take(&mut self.state) {
            SessionState::Composing => {
                let id = self.ids.next_at(now, &self.documents);
                self.documents.push(Document {
                    id: id.clone(),
                    title,
                    content,
                    last_modified: now,
                });
                SaveOutcome::Created(id)
            }
            SessionState::Editing(id) => match self.documents.iter_mut().find(|doc| doc.id == id) {
                Some(doc) => {
                    doc.title = title;
                    doc.content = content;
                    doc.last_modified = now;
                    SaveOutcome::Updated(id)
                }
                None => SaveOutcome::TargetMissing(id),
            },
        };

        engine.clear();

        match &outcome {
            SaveOutcome::Created(id) => {
                self.persist()?;
                info!(id = %id, count = self.documents.len(), "document created");
            }
            SaveOutcome::Updated(id) => {
                self.persist()?;
                info!(id = %id, "document updated");
            }
            SaveOutcome::TargetMissing(id) => {
                warn!(id = %id, "edited document no longer exists, nothing saved");
            }
            SaveOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// Replaces the buffer with `doc` and starts editing it. Unsaved buffer
    /// content is discarded.
    pub fn load(&mut self, engine: &mut dyn RichTextEngine, doc: &Document) {
        engine.set_content(doc.content.as_str());
        self.state = SessionState::Editing(doc.id.clone());
        debug!(id = %doc.id, "document loaded");
    }

    /// Loads the stored document with `id`. Returns false when there is none.
    pub fn load_id(&mut self, engine: &mut dyn RichTextEngine, id: &DocumentId) -> bool {
        let Some(doc) = self.document(id).cloned() else {
            return false;
        };
        self.load(engine, &doc);
        true
    }

    pub fn cancel(&mut self, engine: &mut dyn RichTextEngine) {
        engine.clear();
        self.state = SessionState::Composing;
        debug!("edit cancelled");
    }

    /// Removes the document with `id` regardless of session state. Returns
    /// `Ok(false)` without writing when nothing matches.
    pub fn delete(&mut self, id: &DocumentId) -> Result<bool> {
        let Some(index) = self.documents.iter().position(|doc| &doc.id == id) else {
            debug!(id = %id, "delete ignored, no such document");
            return Ok(false);
        };

        self.documents.remove(index);
        if self.editing_target() == Some(id) {
            warn!(id = %id, "deleted the document being edited");
        }
        self.persist()?;
        info!(id = %id, count = self.documents.len(), "document deleted");
        Ok(true)
    }

    fn persist(&mut self) -> std::result::Result<(), StorageError> {
        self.store.save_all(&self.documents)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        document::store::MemoryBackend,
        editor::{BufferEngine, EngineCommand},
    };

    fn session() -> Session<MemoryBackend> {
        Session::open(DocumentStore::with_default_key(MemoryBackend::new()))
    }

    fn writes(session: &Session<MemoryBackend>) -> usize {
        session.store().backend().write_count()
    }

    fn type_over(engine: &mut BufferEngine, text: &str) {
        engine.execute(EngineCommand::SelectAll);
        engine.execute(EngineCommand::InsertText(text.to_string()));
    }

    fn create(session: &mut Session<MemoryBackend>, engine: &mut BufferEngine, text: &str) -> DocumentId {
        type_over(engine, text);
        match session.save(engine).unwrap() {
            SaveOutcome::Created(id) => id,
            other => panic!("expected a new document, got {other:?}"),
        }
    }

    struct ReadOnlyBackend;

    impl KeyValueBackend for ReadOnlyBackend {
        fn read(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn blank_buffer_save_is_a_no_op() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        assert_eq!(session.save(&mut engine).unwrap(), SaveOutcome::Skipped);

        engine.set_content("   ");
        assert_eq!(session.save(&mut engine).unwrap(), SaveOutcome::Skipped);
        assert!(session.documents().is_empty());
        assert_eq!(writes(&session), 0);
        assert_eq!(session.state(), &SessionState::Composing);
    }

    #[test]
    fn blank_save_while_editing_keeps_the_target() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let id = create(&mut session, &mut engine, "Keep me");
        let doc = session.document(&id).cloned().unwrap();

        session.load(&mut engine, &doc);
        engine.clear();
        assert_eq!(session.save(&mut engine).unwrap(), SaveOutcome::Skipped);
        assert_eq!(session.editing_target(), Some(&id));
        assert_eq!(session.document(&id), Some(&doc));
        assert_eq!(writes(&session), 1);
    }

    #[test]
    fn composing_save_appends_one_document_and_resets() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let first = create(&mut session, &mut engine, "Hello world");

        assert_eq!(session.documents().len(), 1);
        assert_eq!(session.documents()[0].title, "Hello world");
        assert_eq!(session.documents()[0].content, "<p>Hello world</p>");
        assert_eq!(engine.serialized_text(), EMPTY_DOCUMENT);
        assert_eq!(session.state(), &SessionState::Composing);

        let second = create(&mut session, &mut engine, "Second");
        assert_ne!(first, second);
        assert_eq!(session.documents().len(), 2);
        assert_eq!(writes(&session), 2);
    }

    #[test]
    fn hello_world_then_hello_universe_updates_in_place() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let id = create(&mut session, &mut engine, "Hello world");

        let doc = session.document(&id).cloned().unwrap();
        session.load(&mut engine, &doc);
        assert_eq!(session.state(), &SessionState::Editing(id.clone()));

        type_over(&mut engine, "Hello universe");
        assert_eq!(session.save(&mut engine).unwrap(), SaveOutcome::Updated(id.clone()));

        assert_eq!(session.documents().len(), 1);
        assert_eq!(session.documents()[0].id, id);
        assert_eq!(session.documents()[0].title, "Hello universe");
        assert_eq!(session.state(), &SessionState::Composing);
        assert_eq!(engine.serialized_text(), EMPTY_DOCUMENT);
    }

    #[test]
    fn update_touches_only_the_matching_document() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let ids: Vec<DocumentId> = ["a", "b", "c"]
            .iter()
            .map(|text| create(&mut session, &mut engine, text))
            .collect();
        let before = session.documents().to_vec();

        assert!(session.load_id(&mut engine, &ids[1]));
        type_over(&mut engine, "b2");
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        session.save_at(&mut engine, later).unwrap();

        let after = session.documents();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].id, ids[1]);
        assert_eq!(after[1].title, "b2");
        assert_eq!(after[1].last_modified, later);
    }

    #[test]
    fn load_then_cancel_never_writes() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let id = create(&mut session, &mut engine, "Draft");
        let stored = writes(&session);

        assert!(session.load_id(&mut engine, &id));
        type_over(&mut engine, "changed but abandoned");
        session.cancel(&mut engine);

        assert_eq!(writes(&session), stored);
        assert_eq!(session.state(), &SessionState::Composing);
        assert_eq!(engine.serialized_text(), EMPTY_DOCUMENT);
        assert_eq!(session.document(&id).unwrap().title, "Draft");
    }

    #[test]
    fn delete_removes_exactly_the_match_in_order() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let ids: Vec<DocumentId> = ["one", "two", "three"]
            .iter()
            .map(|text| create(&mut session, &mut engine, text))
            .collect();

        assert!(session.delete(&ids[1]).unwrap());
        let titles: Vec<&str> = session.documents().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "three"]);

        let stored = writes(&session);
        assert!(!session.delete(&ids[1]).unwrap());
        assert_eq!(writes(&session), stored);
    }

    #[test]
    fn deleting_the_edited_document_leaves_a_dangling_target() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let id = create(&mut session, &mut engine, "Doomed");
        assert!(session.load_id(&mut engine, &id));

        assert!(session.delete(&id).unwrap());
        assert_eq!(session.editing_target(), Some(&id));
        let stored = writes(&session);

        type_over(&mut engine, "edited after delete");
        assert_eq!(session.save(&mut engine).unwrap(), SaveOutcome::TargetMissing(id));
        assert!(session.documents().is_empty());
        assert_eq!(writes(&session), stored);
        assert_eq!(session.state(), &SessionState::Composing);
        assert_eq!(engine.serialized_text(), EMPTY_DOCUMENT);
    }

    #[test]
    fn write_failure_keeps_memory_state_and_still_resets() {
        let mut session = Session::open(DocumentStore::with_default_key(ReadOnlyBackend));
        let mut engine = BufferEngine::new();
        engine.execute(EngineCommand::InsertText("Unsaved".to_string()));

        let err = session.save(&mut engine).unwrap_err();
        assert!(matches!(err, SessionError::Storage(StorageError::Unavailable(_))));
        assert_eq!(session.documents().len(), 1);
        assert_eq!(session.state(), &SessionState::Composing);
        assert_eq!(engine.serialized_text(), EMPTY_DOCUMENT);
    }

    #[test]
    fn reopening_picks_up_saved_documents() {
        let mut session = session();
        let mut engine = BufferEngine::new();
        let id = create(&mut session, &mut engine, "Persisted");

        let backend = session.store().backend().clone();
        let reopened = Session::open(DocumentStore::with_default_key(backend));
        assert_eq!(reopened.documents(), session.documents());
        assert_eq!(reopened.document(&id).unwrap().title, "Persisted");
    }

    #[test]
    fn load_id_for_unknown_document_changes_nothing() {
        let mut session = session();
        let mut engine = BufferEngine::with_content("<p>draft</p>");
        assert!(!session.load_id(&mut engine, &DocumentId::from("404")));
        assert_eq!(engine.serialized_text(), "<p>draft</p>");
        assert_eq!(session.state(), &SessionState::Composing);
    }
}
