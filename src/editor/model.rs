use serde::{Deserialize, Serialize};

use crate::ui::Color;

/// Live contents of the engine: an ordered list of blocks, never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Buffer {
    pub blocks: Vec<Block>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Buffer {
    pub fn empty() -> Self {
        Self {
            blocks: vec![Block::paragraph()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::empty()
        } else {
            Self { blocks }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1
            && self.blocks[0].kind == BlockKind::Paragraph
            && self.blocks[0].is_empty()
    }

    pub fn last_position(&self) -> (usize, usize) {
        let last = self.blocks.len().saturating_sub(1);
        (last, self.blocks.get(last).map(Block::char_len).unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub alignment: TextAlign,
    pub runs: Vec<Run>,
}

impl Default for Block {
    fn default() -> Self {
        Self::paragraph()
    }
}

impl Block {
    pub fn paragraph() -> Self {
        Self::with_kind(BlockKind::Paragraph)
    }

    pub fn with_kind(kind: BlockKind) -> Self {
        Self {
            kind,
            alignment: TextAlign::Left,
            runs: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem(ListKind),
}

impl BlockKind {
    pub fn heading(level: u8) -> Self {
        Self::Heading(level.clamp(1, 6))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::default())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub color: Option<Color>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_holds_one_blank_paragraph() {
        let buffer = Buffer::empty();
        assert!(buffer.is_empty());
        assert_eq!(buffer.blocks.len(), 1);
        assert_eq!(Buffer::from_blocks(Vec::new()), buffer);
    }

    #[test]
    fn block_lengths_count_characters() {
        let block = Block {
            runs: vec![Run::plain("Başlık"), Run::plain(" 1")],
            ..Block::paragraph()
        };
        assert_eq!(block.char_len(), 8);
        assert_eq!(block.text(), "Başlık 1");
    }

    #[test]
    fn heading_levels_are_clamped() {
        assert_eq!(BlockKind::heading(0), BlockKind::Heading(1));
        assert_eq!(BlockKind::heading(9), BlockKind::Heading(6));
    }
}
