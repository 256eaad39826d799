use docpad::{
    app::{Action, App},
    document::{
        Document, DocumentId,
        store::{DEFAULT_STORAGE_KEY, DocumentStore, FileBackend, KeyValueBackend, MemoryBackend},
    },
    editor::{EMPTY_DOCUMENT, RichTextEngine},
    settings::schema::{EditorSettings, Settings},
    shell,
    ui::{Color, toolbar::Affordance},
};

fn settings() -> Settings {
    Settings {
        editor: EditorSettings {
            initial_content: String::new(),
            ..EditorSettings::default()
        },
        ..Settings::default()
    }
}

fn type_over<B: KeyValueBackend>(app: &mut App<B>, text: &str) {
    app.handle(Action::SelectAll);
    app.handle(Action::Type(text.to_string()));
}

fn stored(dir: &std::path::Path) -> Vec<Document> {
    DocumentStore::with_default_key(FileBackend::new(dir)).load_all()
}

#[test]
fn documents_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut app = App::new(&settings(), FileBackend::new(dir.path()));
    type_over(&mut app, "Shopping list");
    app.handle(Action::Enter);
    app.handle(Action::Type("eggs".to_string()));
    assert!(app.handle(Action::Save));
    drop(app);

    assert!(dir.path().join(format!("{DEFAULT_STORAGE_KEY}.json")).exists());

    let mut reopened = App::new(&settings(), FileBackend::new(dir.path()));
    let list = reopened.saved_list();
    assert_eq!(list.len(), 1);
    assert_eq!(list.rows[0].title, "Shopping list");

    assert!(reopened.handle(Action::Load(list.rows[0].id.clone())));
    assert_eq!(reopened.engine().serialized_text(), "<p>Shopping list</p><p>eggs</p>");
}

#[test]
fn hello_world_becomes_hello_universe() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(&settings(), FileBackend::new(dir.path()));

    type_over(&mut app, "Hello world");
    app.handle(Action::Save);
    let id = app.saved_list().rows[0].id.clone();

    app.handle(Action::Load(id.clone()));
    type_over(&mut app, "Hello universe");
    app.handle(Action::Save);

    let docs = stored(dir.path());
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, id);
    assert_eq!(docs[0].title, "Hello universe");
    assert_eq!(docs[0].content, "<p>Hello universe</p>");
    assert!(!app.session().is_editing());
    assert_eq!(app.preview().html, EMPTY_DOCUMENT);
}

#[test]
fn formatting_is_saved_as_markup() {
    let mut app = App::new(&settings(), MemoryBackend::new());
    type_over(&mut app, "Title");
    app.handle(Action::Format(Affordance::from_id("h2").unwrap()));
    app.handle(Action::Format(Affordance::AlignCenter));
    assert!(app.preview().toolbar.is_active(Affordance::AlignCenter));

    app.handle(Action::Save);
    let doc = &app.session().documents()[0];
    assert_eq!(doc.content, r#"<h2 style="text-align: center">Title</h2>"#);
    assert_eq!(doc.title, "Title");
}

#[test]
fn deleting_keeps_the_rest_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(&settings(), FileBackend::new(dir.path()));
    for text in ["one", "two", "three"] {
        type_over(&mut app, text);
        app.handle(Action::Save);
    }
    let ids: Vec<DocumentId> = app.saved_list().rows.iter().map(|row| row.id.clone()).collect();

    assert!(app.handle(Action::Delete(ids[1].clone())));
    assert!(!app.handle(Action::Delete(ids[1].clone())));

    let titles: Vec<String> = stored(dir.path()).into_iter().map(|doc| doc.title).collect();
    assert_eq!(titles, vec!["one", "three"]);
}

#[test]
fn corrupt_storage_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(format!("{DEFAULT_STORAGE_KEY}.json")), "[{ broken").unwrap();

    let mut app = App::new(&settings(), FileBackend::new(dir.path()));
    assert!(!app.saved_list().is_visible());

    type_over(&mut app, "fresh start");
    assert!(app.handle(Action::Save));
    assert_eq!(stored(dir.path()).len(), 1);
}

#[test]
fn shell_session_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(&settings(), FileBackend::new(dir.path()));

    let script = "\
type Hello
all
italic
palette
color 2
toolbar
save
status
";
    let mut out = Vec::new();
    shell::run(&mut app, script.as_bytes(), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[0].contains("[I]"));
    assert!(lines[0].contains("[A]"));
    assert!(!lines[0].contains("[B]"));
    assert_eq!(lines[1], "[ok] Document saved: Hello");
    assert_eq!(lines[2], "composing | button: Save | cancel: hidden | palette: closed");

    let docs = stored(dir.path());
    assert_eq!(
        docs[0].content,
        format!("<p><em><span style=\"color: {}\">Hello</span></em></p>", Color::red())
    );
}
