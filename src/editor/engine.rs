use std::{fmt, mem, ops::RangeInclusive};

use serde_json::Value;
use tracing::trace;

use crate::{
    editor::{
        Attribute, EngineCommand, RichTextEngine, UpdateListener,
        commands::{
            CharRange, Position, RunStylePatch, Selection, SelectionToggleState, apply_style_patch,
            delete_range, detect_toggle_state, insert_run_at, merge_adjacent_runs, split_off_at,
            style_at,
        },
        html, json,
        model::{Block, BlockKind, Buffer, ListKind, Run, RunStyle, TextAlign},
    },
    ui::Color,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Rejected,
    Unchanged,
    Changed,
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    Bold,
    Italic,
    Strike,
}

impl Mark {
    fn get(self, style: &RunStyle) -> bool {
        match self {
            Self::Bold => style.bold,
            Self::Italic => style.italic,
            Self::Strike => style.strikethrough,
        }
    }

    fn set(self, style: &mut RunStyle, value: bool) {
        match self {
            Self::Bold => style.bold = value,
            Self::Italic => style.italic = value,
            Self::Strike => style.strikethrough = value,
        }
    }

    fn patch(self, value: bool) -> RunStylePatch {
        let mut patch = RunStylePatch::default();
        match self {
            Self::Bold => patch.bold = Some(value),
            Self::Italic => patch.italic = Some(value),
            Self::Strike => patch.strikethrough = Some(value),
        }
        patch
    }
}

/// In-process rich-text buffer with a selection and stored marks.
#[derive(Default)]
pub struct BufferEngine {
    buffer: Buffer,
    selection: Selection,
    stored_marks: Option<RunStyle>,
    listeners: Vec<UpdateListener>,
}

impl fmt::Debug for BufferEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferEngine")
            .field("buffer", &self.buffer)
            .field("selection", &self.selection)
            .field("stored_marks", &self.stored_marks)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BufferEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        let mut engine = Self::new();
        engine.replace_buffer(html::from_html(content));
        engine
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    fn replace_buffer(&mut self, buffer: Buffer) {
        self.buffer = buffer;
        let (block, offset) = self.buffer.last_position();
        self.selection = Selection::caret(Position::new(block, offset));
        self.stored_marks = None;
    }

    fn notify(&mut self) {
        let mut listeners = mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener(&*self);
        }
        // Keep anything registered from inside a callback.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    fn clamp(&self, position: Position) -> Position {
        let block = position.block.min(self.buffer.blocks.len().saturating_sub(1));
        let len = self.buffer.blocks.get(block).map(Block::char_len).unwrap_or(0);
        Position::new(block, position.offset.min(len))
    }

    fn touched_blocks(&self) -> RangeInclusive<usize> {
        self.selection.start().block..=self.selection.end().block
    }

    /// Per-block character ranges covered by a non-collapsed selection.
    fn selected_ranges(&self) -> Vec<(usize, CharRange)> {
        let start = self.selection.start();
        let end = self.selection.end();
        self.touched_blocks()
            .filter_map(|index| {
                let block = self.buffer.blocks.get(index)?;
                let from = if index == start.block { start.offset } else { 0 };
                let to = if index == end.block {
                    end.offset
                } else {
                    block.char_len()
                };
                let range = CharRange::new(from, to);
                (!range.is_empty()).then_some((index, range))
            })
            .collect()
    }

    fn caret_style(&self) -> RunStyle {
        if let Some(marks) = &self.stored_marks {
            return marks.clone();
        }
        let head = self.selection.head;
        self.buffer
            .blocks
            .get(head.block)
            .map(|block| style_at(block, head.offset))
            .unwrap_or_default()
    }

    fn selection_state<F>(&self, selector: F) -> Option<SelectionToggleState>
    where
        F: Fn(&RunStyle) -> bool,
    {
        self.selected_ranges()
            .into_iter()
            .map(|(index, range)| detect_toggle_state(&self.buffer.blocks[index].runs, range, &selector))
            .reduce(SelectionToggleState::combine)
    }

    fn style_active<F>(&self, selector: F) -> bool
    where
        F: Fn(&RunStyle) -> bool,
    {
        if self.selection.is_collapsed() {
            return selector(&self.caret_style());
        }
        match self.selection_state(&selector) {
            Some(state) => state == SelectionToggleState::On,
            None => selector(&self.caret_style()),
        }
    }

    fn blocks_all<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Block) -> bool,
    {
        self.touched_blocks()
            .filter_map(|index| self.buffer.blocks.get(index))
            .all(predicate)
    }

    fn toggle_mark(&mut self, mark: Mark) -> Outcome {
        if self.selection.is_collapsed() {
            let mut style = self.caret_style();
            let current = mark.get(&style);
            mark.set(&mut style, !current);
            self.stored_marks = Some(style);
            return Outcome::Changed;
        }

        let target = self
            .selection_state(|style| mark.get(style))
            .map(SelectionToggleState::toggled_target)
            .unwrap_or(true);
        self.patch_selection(&mark.patch(target))
    }

    fn set_color(&mut self, color: Color) -> Outcome {
        if self.selection.is_collapsed() {
            let mut style = self.caret_style();
            style.color = Some(color);
            self.stored_marks = Some(style);
            return Outcome::Changed;
        }
        self.patch_selection(&RunStylePatch {
            color: Some(color),
            ..RunStylePatch::default()
        })
    }

    fn patch_selection(&mut self, patch: &RunStylePatch) -> Outcome {
        let ranges = self.selected_ranges();
        if ranges.is_empty() {
            return Outcome::Unchanged;
        }
        for (index, range) in ranges {
            apply_style_patch(&mut self.buffer.blocks[index], range, patch);
        }
        Outcome::Changed
    }

    fn toggle_block_kind(&mut self, kind: BlockKind) -> Outcome {
        let next = if self.blocks_all(|block| block.kind == kind) {
            BlockKind::Paragraph
        } else {
            kind
        };
        for index in self.touched_blocks() {
            if let Some(block) = self.buffer.blocks.get_mut(index) {
                block.kind = next;
            }
        }
        Outcome::Changed
    }

    fn set_alignment(&mut self, alignment: TextAlign) -> Outcome {
        if self.blocks_all(|block| block.alignment == alignment) {
            return Outcome::Unchanged;
        }
        for index in self.touched_blocks() {
            if let Some(block) = self.buffer.blocks.get_mut(index) {
                block.alignment = alignment;
            }
        }
        Outcome::Changed
    }

    fn set_selection(&mut self, selection: Selection) -> Outcome {
        let clamped = Selection::range(self.clamp(selection.anchor), self.clamp(selection.head));
        if clamped == self.selection {
            return Outcome::Unchanged;
        }
        self.selection = clamped;
        self.stored_marks = None;
        Outcome::Changed
    }

    fn delete_selection(&mut self) {
        if self.selection.is_collapsed() {
            return;
        }
        let start = self.selection.start();
        let end = self.selection.end();

        if start.block == end.block {
            delete_range(
                &mut self.buffer.blocks[start.block].runs,
                CharRange::new(start.offset, end.offset),
            );
        } else {
            let tail = split_off_at(&mut self.buffer.blocks[end.block].runs, end.offset);
            let head = &mut self.buffer.blocks[start.block].runs;
            split_off_at(head, start.offset);
            head.extend(tail);
            merge_adjacent_runs(head);
            self.buffer.blocks.drain(start.block + 1..=end.block);
        }
        self.selection = Selection::caret(start);
    }

    fn insert_text(&mut self, text: &str) -> Outcome {
        if text.is_empty() && self.selection.is_collapsed() {
            return Outcome::Unchanged;
        }
        let style = self.caret_style();
        self.delete_selection();
        self.stored_marks = None;

        let normalized = text.replace("\r\n", "\n");
        for (index, line) in normalized.split('\n').enumerate() {
            if index > 0 {
                self.split_at_caret();
            }
            if line.is_empty() {
                continue;
            }
            let head = self.selection.head;
            let block = &mut self.buffer.blocks[head.block];
            insert_run_at(&mut block.runs, head.offset, Run::new(line, style.clone()));
            self.selection = Selection::caret(Position::new(
                head.block,
                head.offset + line.chars().count(),
            ));
        }
        Outcome::Changed
    }

    fn split_block(&mut self) -> Outcome {
        self.delete_selection();
        let head = self.selection.head;
        let block = &mut self.buffer.blocks[head.block];

        // Enter on an empty list item leaves the list.
        if matches!(block.kind, BlockKind::ListItem(_)) && block.is_empty() {
            block.kind = BlockKind::Paragraph;
            return Outcome::Changed;
        }

        self.split_at_caret();
        Outcome::Changed
    }

    fn split_at_caret(&mut self) {
        let head = self.selection.head;
        let block = &mut self.buffer.blocks[head.block];
        let tail = split_off_at(&mut block.runs, head.offset);
        let kind = match block.kind {
            BlockKind::Heading(_) if tail.is_empty() => BlockKind::Paragraph,
            other => other,
        };
        let next = Block {
            kind,
            alignment: block.alignment,
            runs: tail,
        };
        self.buffer.blocks.insert(head.block + 1, next);
        self.selection = Selection::caret(Position::new(head.block + 1, 0));
    }

    fn apply(&mut self, command: EngineCommand) -> Outcome {
        match command {
            EngineCommand::ToggleBold => self.toggle_mark(Mark::Bold),
            EngineCommand::ToggleItalic => self.toggle_mark(Mark::Italic),
            EngineCommand::ToggleStrike => self.toggle_mark(Mark::Strike),
            EngineCommand::ToggleHeading { level } => {
                if (1..=6).contains(&level) {
                    self.toggle_block_kind(BlockKind::Heading(level))
                } else {
                    Outcome::Rejected
                }
            }
            EngineCommand::ToggleBulletList => {
                self.toggle_block_kind(BlockKind::ListItem(ListKind::Bullet))
            }
            EngineCommand::ToggleOrderedList => {
                self.toggle_block_kind(BlockKind::ListItem(ListKind::Ordered))
            }
            EngineCommand::SetTextAlign(alignment) => self.set_alignment(alignment),
            EngineCommand::SetColor(color) => self.set_color(color),
            EngineCommand::SetSelection(selection) => self.set_selection(selection),
            EngineCommand::SelectAll => {
                let (block, offset) = self.buffer.last_position();
                self.set_selection(Selection::range(
                    Position::default(),
                    Position::new(block, offset),
                ))
            }
            EngineCommand::InsertText(text) => self.insert_text(text.as_str()),
            EngineCommand::SplitBlock => self.split_block(),
        }
    }
}

impl RichTextEngine for BufferEngine {
    fn serialized_text(&self) -> String {
        html::to_html(&self.buffer)
    }

    fn serialized_structure(&self) -> Value {
        json::to_json(&self.buffer)
    }

    fn set_content(&mut self, content: &str) {
        self.replace_buffer(html::from_html(content));
        self.notify();
    }

    fn is_active(&self, attribute: &Attribute) -> bool {
        match attribute {
            Attribute::Bold => self.style_active(|style| style.bold),
            Attribute::Italic => self.style_active(|style| style.italic),
            Attribute::Strike => self.style_active(|style| style.strikethrough),
            Attribute::TextColor(Some(color)) => {
                self.style_active(|style| style.color.as_ref() == Some(color))
            }
            Attribute::TextColor(None) => self.style_active(|style| style.color.is_some()),
            Attribute::Heading { level } => {
                self.blocks_all(|block| block.kind == BlockKind::Heading(*level))
            }
            Attribute::BulletList => {
                self.blocks_all(|block| block.kind == BlockKind::ListItem(ListKind::Bullet))
            }
            Attribute::OrderedList => {
                self.blocks_all(|block| block.kind == BlockKind::ListItem(ListKind::Ordered))
            }
            Attribute::TextAlign(alignment) => {
                self.blocks_all(|block| block.alignment == *alignment)
            }
        }
    }

    fn execute(&mut self, command: EngineCommand) -> bool {
        let name = command.name();
        let outcome = self.apply(command);
        trace!(command = name, ?outcome, "engine command");
        match outcome {
            Outcome::Rejected => false,
            Outcome::Unchanged => true,
            Outcome::Changed => {
                self.notify();
                true
            }
        }
    }

    fn on_update(&mut self, listener: UpdateListener) {
        self.listeners.push(listener);
    }
}
