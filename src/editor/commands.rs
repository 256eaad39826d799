use crate::{
    editor::model::{Block, Run, RunStyle},
    ui::Color,
};

/// A caret location: block index plus character offset inside that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub const fn caret(at: Position) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub const fn range(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Selection inside one block, `start..end` in characters.
    pub const fn within(block: usize, start: usize, end: usize) -> Self {
        Self::range(Position::new(block, start), Position::new(block, end))
    }

    pub fn is_collapsed(self) -> bool {
        self.anchor == self.head
    }

    pub fn start(self) -> Position {
        self.anchor.min(self.head)
    }

    pub fn end(self) -> Position {
        self.anchor.max(self.head)
    }
}

/// Character range within a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionToggleState {
    Off,
    On,
    Mixed,
}

impl SelectionToggleState {
    pub fn toggled_target(self) -> bool {
        !matches!(self, Self::On)
    }

    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::On, Self::On) => Self::On,
            (Self::Off, Self::Off) => Self::Off,
            _ => Self::Mixed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStylePatch {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strikethrough: Option<bool>,
    pub color: Option<Color>,
}

impl RunStylePatch {
    pub fn apply_to(&self, style: &mut RunStyle) {
        if let Some(v) = self.bold {
            style.bold = v;
        }
        if let Some(v) = self.italic {
            style.italic = v;
        }
        if let Some(v) = self.strikethrough {
            style.strikethrough = v;
        }
        if let Some(c) = &self.color {
            style.color = Some(c.clone());
        }
    }
}

pub fn detect_toggle_state<F>(runs: &[Run], range: CharRange, selector: F) -> SelectionToggleState
where
    F: Fn(&RunStyle) -> bool,
{
    let selected = selected_runs(runs, range);
    if selected.is_empty() {
        return SelectionToggleState::Off;
    }

    let on = selected.iter().filter(|run| selector(&run.style)).count();
    if on == 0 {
        SelectionToggleState::Off
    } else if on == selected.len() {
        SelectionToggleState::On
    } else {
        SelectionToggleState::Mixed
    }
}

/// Style the caret picks up at `offset`: the run before it, or the first run
/// when the caret sits at the start of the block.
pub fn style_at(block: &Block, offset: usize) -> RunStyle {
    let mut cursor = 0usize;
    for run in &block.runs {
        let next = cursor + run.char_len();
        if offset > cursor && offset <= next {
            return run.style.clone();
        }
        cursor = next;
    }
    block
        .runs
        .first()
        .map(|run| run.style.clone())
        .unwrap_or_default()
}

pub fn apply_style_patch(block: &mut Block, range: CharRange, patch: &RunStylePatch) {
    if block.runs.is_empty() || range.is_empty() {
        return;
    }

    let len = block.char_len();
    let s = range.start.min(len);
    let e = range.end.min(len).max(s);

    let start_idx = split_runs_at(&mut block.runs, s);
    let end_idx = split_runs_at(&mut block.runs, e);

    for run in block.runs.iter_mut().take(end_idx).skip(start_idx) {
        patch.apply_to(&mut run.style);
    }

    merge_adjacent_runs(&mut block.runs);
}

/// Splits the run containing `offset` so a run boundary lands on it and
/// returns the index of the first run at or after `offset`.
pub fn split_runs_at(runs: &mut Vec<Run>, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }

    let mut acc = 0usize;
    for i in 0..runs.len() {
        let len = runs[i].char_len();
        let end = acc + len;
        if offset == acc {
            return i;
        }
        if offset == end {
            return i + 1;
        }
        if offset > acc && offset < end {
            let cut = byte_index(&runs[i].text, offset - acc);
            let tail = runs[i].text[cut..].to_string();
            let style = runs[i].style.clone();
            runs[i].text.truncate(cut);
            runs.insert(i + 1, Run { text: tail, style });
            return i + 1;
        }
        acc = end;
    }

    runs.len()
}

pub fn insert_run_at(runs: &mut Vec<Run>, offset: usize, run: Run) {
    let idx = split_runs_at(runs, offset);
    runs.insert(idx, run);
    merge_adjacent_runs(runs);
}

pub fn delete_range(runs: &mut Vec<Run>, range: CharRange) {
    if range.is_empty() {
        return;
    }
    let start_idx = split_runs_at(runs, range.start);
    let end_idx = split_runs_at(runs, range.end);
    runs.drain(start_idx..end_idx);
    merge_adjacent_runs(runs);
}

/// Removes and returns every run after `offset`.
pub fn split_off_at(runs: &mut Vec<Run>, offset: usize) -> Vec<Run> {
    let idx = split_runs_at(runs, offset);
    let mut tail = runs.split_off(idx);
    merge_adjacent_runs(runs);
    merge_adjacent_runs(&mut tail);
    tail
}

pub fn merge_adjacent_runs(runs: &mut Vec<Run>) {
    runs.retain(|run| !run.text.is_empty());
    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i].style == runs[i + 1].style {
            let tail = runs.remove(i + 1);
            runs[i].text.push_str(&tail.text);
        } else {
            i += 1;
        }
    }
}

fn selected_runs(runs: &[Run], range: CharRange) -> Vec<&Run> {
    if runs.is_empty() || range.is_empty() {
        return Vec::new();
    }

    let mut selected = Vec::new();
    let mut cursor = 0usize;

    for run in runs {
        let next = cursor + run.char_len();
        if next > range.start && cursor < range.end {
            selected.push(run);
        }
        cursor = next;
    }

    selected
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
