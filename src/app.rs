use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use tracing::debug;

use crate::{
    document::{
        DocumentId, TitleDeriver,
        store::{DocumentStore, KeyValueBackend},
    },
    editor::{BufferEngine, EngineCommand, RichTextEngine, commands::Selection},
    session::{SaveOutcome, Session, SessionError},
    settings::schema::Settings,
    ui::{
        color_picker::ColorPicker,
        preview::LivePreview,
        saved_list::SavedList,
        toast::{Toast, ToastLevel},
        toolbar::{Affordance, Toolbar},
    },
};

/// Everything the page lets a user do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Toolbar click. Apply-color opens or closes the palette.
    Format(Affordance),
    PickColor(usize),
    DismissPalette,
    Select(Selection),
    SelectAll,
    Type(String),
    Enter,
    Save,
    Cancel,
    Load(DocumentId),
    Delete(DocumentId),
}

pub struct App<B> {
    engine: BufferEngine,
    session: Session<B>,
    toolbar: Toolbar,
    picker: ColorPicker,
    preview: Rc<RefCell<LivePreview>>,
    toasts: Toast,
    date_format: String,
}

impl<B: KeyValueBackend> App<B> {
    pub fn new(settings: &Settings, backend: B) -> Self {
        let store = DocumentStore::new(backend, settings.storage.key.as_str());
        let titles = TitleDeriver::new(
            settings.editor.max_title_chars,
            settings.editor.untitled_label.as_str(),
        );
        let session = Session::with_title_deriver(store, titles);

        let mut engine = BufferEngine::with_content(settings.editor.initial_content.as_str());
        let toolbar = Toolbar::new();
        let preview = Rc::new(RefCell::new(LivePreview::capture(&engine, &toolbar)));

        let live = Rc::clone(&preview);
        let live_toolbar = toolbar.clone();
        engine.on_update(Box::new(move |engine| {
            live.borrow_mut().refresh(engine, &live_toolbar);
        }));

        Self {
            engine,
            session,
            toolbar,
            picker: ColorPicker::new(settings.toolbar.palette.clone()),
            preview,
            toasts: Toast::default(),
            date_format: settings.editor.date_format.clone(),
        }
    }

    pub fn engine(&self) -> &BufferEngine {
        &self.engine
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn picker(&self) -> &ColorPicker {
        &self.picker
    }

    pub fn preview(&self) -> Ref<'_, LivePreview> {
        self.preview.borrow()
    }

    pub fn toasts_mut(&mut self) -> &mut Toast {
        &mut self.toasts
    }

    pub fn saved_list(&self) -> SavedList {
        SavedList::from_documents(
            self.session.documents(),
            self.date_format.as_str(),
            self.session.editing_target(),
        )
    }

    pub fn save_label(&self) -> &'static str {
        if self.session.is_editing() { "Update" } else { "Save" }
    }

    pub fn cancel_visible(&self) -> bool {
        self.session.is_editing()
    }

    /// Runs one user action. Returns false when it had no effect.
    pub fn handle(&mut self, action: Action) -> bool {
        debug!(?action, "action");
        match action {
            Action::Format(Affordance::ApplyColor) => {
                self.picker.toggle();
                true
            }
            Action::PickColor(index) => self.picker.select(index, &self.toolbar, &mut self.engine),
            Action::DismissPalette => self.picker.dismiss(),
            // The open overlay's backdrop swallows the click.
            _ if self.picker.dismiss() => true,
            other => self.handle_outside_palette(other),
        }
    }

    fn handle_outside_palette(&mut self, action: Action) -> bool {
        match action {
            Action::Format(affordance) => self.toolbar.dispatch(&mut self.engine, affordance, None),
            Action::Select(selection) => self.engine.execute(EngineCommand::SetSelection(selection)),
            Action::SelectAll => self.engine.execute(EngineCommand::SelectAll),
            Action::Type(text) => self.engine.execute(EngineCommand::InsertText(text)),
            Action::Enter => self.engine.execute(EngineCommand::SplitBlock),
            Action::Save => self.save(),
            Action::Cancel => {
                if !self.cancel_visible() {
                    return false;
                }
                self.session.cancel(&mut self.engine);
                true
            }
            Action::Load(id) => self.session.load_id(&mut self.engine, &id),
            Action::Delete(id) => match self.session.delete(&id) {
                Ok(deleted) => deleted,
                Err(error) => {
                    self.report(&error);
                    true
                }
            },
            Action::PickColor(_) | Action::DismissPalette => false,
        }
    }

    fn save(&mut self) -> bool {
        match self.session.save(&mut self.engine) {
            Ok(SaveOutcome::Skipped) => false,
            Ok(SaveOutcome::Created(id)) => {
                let title = self.title_of(&id);
                self.toasts.push_saved(title.as_str(), false);
                true
            }
            Ok(SaveOutcome::Updated(id)) => {
                let title = self.title_of(&id);
                self.toasts.push_saved(title.as_str(), true);
                true
            }
            Ok(SaveOutcome::TargetMissing(_)) => {
                self.toasts.push(
                    ToastLevel::Warning,
                    "Nothing saved",
                    "The document being edited was deleted",
                );
                true
            }
            Err(error) => {
                self.report(&error);
                true
            }
        }
    }

    fn title_of(&self, id: &DocumentId) -> String {
        self.session
            .document(id)
            .map(|doc| doc.title.clone())
            .unwrap_or_default()
    }

    fn report(&mut self, error: &SessionError) {
        self.toasts.push_storage_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::store::{MemoryBackend, StorageError},
        editor::EMPTY_DOCUMENT,
        settings::schema::EditorSettings,
        ui::{Color, toast::ToastLevel},
    };

    fn blank_settings() -> Settings {
        Settings {
            editor: EditorSettings {
                initial_content: String::new(),
                ..EditorSettings::default()
            },
            ..Settings::default()
        }
    }

    fn app() -> App<MemoryBackend> {
        App::new(&blank_settings(), MemoryBackend::new())
    }

    struct FullDisk;

    impl KeyValueBackend for FullDisk {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".to_string()))
        }
    }

    #[test]
    fn starts_with_the_welcome_content() {
        let app = App::new(&Settings::default(), MemoryBackend::new());
        let preview = app.preview();
        assert!(preview.html.starts_with("<h1>Welcome to the editor!</h1>"));
        assert!(preview.html.contains("<ul><li><p><strong>Rich text</strong>"));
        assert!(preview.json.contains("\"bulletList\""));
    }

    #[test]
    fn preview_follows_every_edit() {
        let mut app = app();
        assert_eq!(app.preview().html, EMPTY_DOCUMENT);

        app.handle(Action::Type("Hello".to_string()));
        assert_eq!(app.preview().html, "<p>Hello</p>");

        app.handle(Action::SelectAll);
        app.handle(Action::Format(Affordance::Bold));
        assert_eq!(app.preview().html, "<p><strong>Hello</strong></p>");
        assert!(app.preview().toolbar.is_active(Affordance::Bold));
    }

    #[test]
    fn save_and_update_flow_updates_labels_and_list() {
        let mut app = app();
        assert!(!app.saved_list().is_visible());
        assert_eq!(app.save_label(), "Save");
        assert!(!app.cancel_visible());

        app.handle(Action::Type("Hello world".to_string()));
        assert!(app.handle(Action::Save));
        assert_eq!(app.preview().html, EMPTY_DOCUMENT);

        let list = app.saved_list();
        assert!(list.is_visible());
        assert_eq!(list.rows[0].title, "Hello world");
        assert_eq!(app.toasts_mut().latest().unwrap().title, "Document saved");

        let id = list.rows[0].id.clone();
        assert!(app.handle(Action::Load(id.clone())));
        assert_eq!(app.save_label(), "Update");
        assert!(app.cancel_visible());
        assert!(app.saved_list().rows[0].editing);

        app.handle(Action::SelectAll);
        app.handle(Action::Type("Hello universe".to_string()));
        assert!(app.handle(Action::Save));
        assert_eq!(app.saved_list().rows.len(), 1);
        assert_eq!(app.saved_list().rows[0].title, "Hello universe");
        assert_eq!(app.toasts_mut().latest().unwrap().title, "Document updated");
        assert_eq!(app.save_label(), "Save");
    }

    #[test]
    fn empty_save_is_silent() {
        let mut app = app();
        assert!(!app.handle(Action::Save));
        assert!(app.toasts_mut().latest().is_none());
    }

    #[test]
    fn cancel_is_only_available_while_editing() {
        let mut app = app();
        app.handle(Action::Type("draft".to_string()));
        assert!(!app.handle(Action::Cancel));
        assert_eq!(app.preview().html, "<p>draft</p>");
    }

    #[test]
    fn palette_applies_colour_and_closes() {
        let mut app = app();
        app.handle(Action::Type("tint".to_string()));
        app.handle(Action::SelectAll);

        app.handle(Action::Format(Affordance::ApplyColor));
        assert!(app.picker().is_open());
        assert!(app.handle(Action::PickColor(2)));
        assert!(!app.picker().is_open());
        assert_eq!(
            app.preview().html,
            format!("<p><span style=\"color: {}\">tint</span></p>", Color::blue())
        );
    }

    #[test]
    fn clicking_elsewhere_only_closes_the_palette() {
        let mut app = app();
        app.handle(Action::Type("x".to_string()));
        let before = app.preview().html.clone();

        app.handle(Action::Format(Affordance::ApplyColor));
        assert!(app.handle(Action::Format(Affordance::Bold)));
        assert!(!app.picker().is_open());
        assert_eq!(app.preview().html, before);
        assert!(!app.preview().toolbar.is_active(Affordance::Bold));

        app.handle(Action::Format(Affordance::ApplyColor));
        app.handle(Action::Save);
        assert!(app.session().documents().is_empty());
        assert_eq!(app.preview().html, before);

        assert!(app.handle(Action::Format(Affordance::Bold)));
        assert!(app.preview().toolbar.is_active(Affordance::Bold));
    }

    #[test]
    fn storage_failure_raises_an_error_toast() {
        let mut app = App::new(&blank_settings(), FullDisk);
        app.handle(Action::Type("will not persist".to_string()));
        assert!(app.handle(Action::Save));

        let toast = app.toasts_mut().latest().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert!(toast.body.contains("disk full"));
        assert_eq!(app.session().documents().len(), 1);
    }
}
