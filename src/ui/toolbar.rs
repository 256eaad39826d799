use std::fmt;

use tracing::debug;

use crate::{
    editor::{Attribute, EngineCommand, RichTextEngine, model::TextAlign},
    ui::Color,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub const fn level(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButtonType {
    Toggle,
    Dropdown,
}

/// One formatting capability exposed on the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    Bold,
    Italic,
    Strikethrough,
    Heading(HeadingLevel),
    BulletList,
    OrderedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    ApplyColor,
}

impl Affordance {
    pub const ALL: [Affordance; 12] = [
        Self::Bold,
        Self::Italic,
        Self::Strikethrough,
        Self::Heading(HeadingLevel::H1),
        Self::Heading(HeadingLevel::H2),
        Self::Heading(HeadingLevel::H3),
        Self::BulletList,
        Self::OrderedList,
        Self::AlignLeft,
        Self::AlignCenter,
        Self::AlignRight,
        Self::ApplyColor,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strike",
            Self::Heading(HeadingLevel::H1) => "h1",
            Self::Heading(HeadingLevel::H2) => "h2",
            Self::Heading(HeadingLevel::H3) => "h3",
            Self::BulletList => "bullet",
            Self::OrderedList => "ordered",
            Self::AlignLeft => "left",
            Self::AlignCenter => "center",
            Self::AlignRight => "right",
            Self::ApplyColor => "color",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Strikethrough => "S",
            Self::Heading(HeadingLevel::H1) => "H1",
            Self::Heading(HeadingLevel::H2) => "H2",
            Self::Heading(HeadingLevel::H3) => "H3",
            Self::BulletList => "•",
            Self::OrderedList => "1.",
            Self::AlignLeft => "⇤",
            Self::AlignCenter => "≡",
            Self::AlignRight => "⇥",
            Self::ApplyColor => "A",
        }
    }

    pub const fn tooltip(self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Strikethrough => "Strikethrough",
            Self::Heading(HeadingLevel::H1) => "Heading 1",
            Self::Heading(HeadingLevel::H2) => "Heading 2",
            Self::Heading(HeadingLevel::H3) => "Heading 3",
            Self::BulletList => "Bullet list",
            Self::OrderedList => "Numbered list",
            Self::AlignLeft => "Align left",
            Self::AlignCenter => "Align center",
            Self::AlignRight => "Align right",
            Self::ApplyColor => "Text color",
        }
    }

    pub const fn shortcut(self) -> Option<&'static str> {
        match self {
            Self::Bold => Some("⌘B"),
            Self::Italic => Some("⌘I"),
            _ => None,
        }
    }

    pub const fn kind(self) -> ToolbarButtonType {
        match self {
            Self::ApplyColor => ToolbarButtonType::Dropdown,
            _ => ToolbarButtonType::Toggle,
        }
    }

    /// Selection-context query backing the active flag.
    pub fn attribute(self) -> Attribute {
        match self {
            Self::Bold => Attribute::Bold,
            Self::Italic => Attribute::Italic,
            Self::Strikethrough => Attribute::Strike,
            Self::Heading(level) => Attribute::Heading {
                level: level.level(),
            },
            Self::BulletList => Attribute::BulletList,
            Self::OrderedList => Attribute::OrderedList,
            Self::AlignLeft => Attribute::TextAlign(TextAlign::Left),
            Self::AlignCenter => Attribute::TextAlign(TextAlign::Center),
            Self::AlignRight => Attribute::TextAlign(TextAlign::Right),
            Self::ApplyColor => Attribute::TextColor(None),
        }
    }

    /// Command issued on activation. Apply-color needs a colour.
    pub fn command(self, color: Option<Color>) -> Option<EngineCommand> {
        let command = match self {
            Self::Bold => EngineCommand::ToggleBold,
            Self::Italic => EngineCommand::ToggleItalic,
            Self::Strikethrough => EngineCommand::ToggleStrike,
            Self::Heading(level) => EngineCommand::ToggleHeading {
                level: level.level(),
            },
            Self::BulletList => EngineCommand::ToggleBulletList,
            Self::OrderedList => EngineCommand::ToggleOrderedList,
            Self::AlignLeft => EngineCommand::SetTextAlign(TextAlign::Left),
            Self::AlignCenter => EngineCommand::SetTextAlign(TextAlign::Center),
            Self::AlignRight => EngineCommand::SetTextAlign(TextAlign::Right),
            Self::ApplyColor => EngineCommand::SetColor(color?),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    pub affordance: Affordance,
    pub id: &'static str,
    pub label: &'static str,
    pub tooltip: String,
    pub kind: ToolbarButtonType,
    pub active: bool,
}

impl ToolbarButton {
    fn for_affordance(affordance: Affordance) -> Self {
        let tooltip = match affordance.shortcut() {
            Some(shortcut) => format!("{} ({shortcut})", affordance.tooltip()),
            None => affordance.tooltip().to_string(),
        };
        Self {
            affordance,
            id: affordance.id(),
            label: affordance.label(),
            tooltip,
            kind: affordance.kind(),
            active: false,
        }
    }
}

/// Active flag of every button, pulled from the engine at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarState {
    pub buttons: Vec<ToolbarButton>,
}

impl Default for ToolbarState {
    fn default() -> Self {
        Self {
            buttons: default_buttons(),
        }
    }
}

impl ToolbarState {
    pub fn is_active(&self, affordance: Affordance) -> bool {
        self.buttons
            .iter()
            .any(|b| b.affordance == affordance && b.active)
    }

    pub fn active_ids(&self) -> Vec<&'static str> {
        self.buttons.iter().filter(|b| b.active).map(|b| b.id).collect()
    }
}

impl fmt::Display for ToolbarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, button) in self.buttons.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            if button.active {
                write!(f, "[{}]", button.label)?;
            } else {
                write!(f, " {} ", button.label)?;
            }
        }
        Ok(())
    }
}

/// Binds affordances to the engine. Holds no formatting state of its own;
/// every answer is a fresh engine query.
#[derive(Debug, Clone)]
pub struct Toolbar {
    buttons: Vec<ToolbarButton>,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolbar {
    pub fn new() -> Self {
        Self {
            buttons: default_buttons(),
        }
    }

    pub fn buttons(&self) -> &[ToolbarButton] {
        &self.buttons
    }

    pub fn button(&self, id: &str) -> Option<&ToolbarButton> {
        self.buttons.iter().find(|b| b.id == id)
    }

    pub fn is_active(&self, engine: &dyn RichTextEngine, affordance: Affordance) -> bool {
        engine.is_active(&affordance.attribute())
    }

    /// Issues the affordance's command. Returns false when it was not
    /// applicable, including apply-color without a colour.
    pub fn dispatch(
        &self,
        engine: &mut dyn RichTextEngine,
        affordance: Affordance,
        color: Option<Color>,
    ) -> bool {
        let Some(command) = affordance.command(color) else {
            debug!(affordance = affordance.id(), "dispatch ignored, no colour given");
            return false;
        };
        debug!(affordance = affordance.id(), command = command.name(), "dispatch");
        engine.execute(command)
    }

    pub fn snapshot(&self, engine: &dyn RichTextEngine) -> ToolbarState {
        let mut buttons = self.buttons.clone();
        for button in &mut buttons {
            apply_state_to_button(button, engine);
        }
        ToolbarState { buttons }
    }
}

fn default_buttons() -> Vec<ToolbarButton> {
    Affordance::ALL
        .into_iter()
        .map(ToolbarButton::for_affordance)
        .collect()
}

fn apply_state_to_button(button: &mut ToolbarButton, engine: &dyn RichTextEngine) {
    button.active = engine.is_active(&button.affordance.attribute());
}
