pub mod app;
pub mod document;
pub mod editor;
pub mod logging;
pub mod markup;
pub mod session;
pub mod settings;
pub mod shell;
pub mod ui;
