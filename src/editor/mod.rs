use serde_json::Value;

use crate::{
    editor::{commands::Selection, model::TextAlign},
    ui::Color,
};

pub mod commands;
pub mod engine;
pub mod html;
pub mod json;
pub mod model;

pub use engine::BufferEngine;

/// Serialized form of a buffer holding nothing but one blank paragraph.
pub const EMPTY_DOCUMENT: &str = "<p></p>";

/// Callback run synchronously after every buffer change.
pub type UpdateListener = Box<dyn FnMut(&dyn RichTextEngine)>;

/// Formatting attribute that can be queried against the selection context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Bold,
    Italic,
    Strike,
    Heading { level: u8 },
    BulletList,
    OrderedList,
    TextAlign(TextAlign),
    /// `None` matches any colour.
    TextColor(Option<Color>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    ToggleBold,
    ToggleItalic,
    ToggleStrike,
    ToggleHeading { level: u8 },
    ToggleBulletList,
    ToggleOrderedList,
    SetTextAlign(TextAlign),
    SetColor(Color),
    SetSelection(Selection),
    SelectAll,
    InsertText(String),
    SplitBlock,
}

impl EngineCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleBold => "toggleBold",
            Self::ToggleItalic => "toggleItalic",
            Self::ToggleStrike => "toggleStrike",
            Self::ToggleHeading { .. } => "toggleHeading",
            Self::ToggleBulletList => "toggleBulletList",
            Self::ToggleOrderedList => "toggleOrderedList",
            Self::SetTextAlign(_) => "setTextAlign",
            Self::SetColor(_) => "setColor",
            Self::SetSelection(_) => "setTextSelection",
            Self::SelectAll => "selectAll",
            Self::InsertText(_) => "insertContent",
            Self::SplitBlock => "splitBlock",
        }
    }
}

/// The narrow surface the session and toolbar rely on. Everything else about
/// the engine (selection model, mark application) stays behind it.
pub trait RichTextEngine {
    /// Markup form of the buffer, as persisted in a document's `content`.
    fn serialized_text(&self) -> String;

    /// Structured node tree of the buffer.
    fn serialized_structure(&self) -> Value;

    /// Replaces the buffer wholesale and notifies listeners.
    fn set_content(&mut self, content: &str);

    fn clear(&mut self) {
        self.set_content(EMPTY_DOCUMENT);
    }

    fn is_active(&self, attribute: &Attribute) -> bool;

    /// Applies `command` to the current selection. Returns whether the command
    /// was applicable; listeners are notified only when something changed.
    fn execute(&mut self, command: EngineCommand) -> bool;

    fn on_update(&mut self, listener: UpdateListener);
}
