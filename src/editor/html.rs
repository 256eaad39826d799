use quick_xml::{encoding::Decoder, events::BytesStart, events::Event};
use tracing::debug;

use crate::{
    editor::{
        commands::merge_adjacent_runs,
        model::{Block, BlockKind, Buffer, ListKind, Run, RunStyle, TextAlign},
    },
    markup::{
        collapse_whitespace, element_name, escape_attribute, escape_text, fragment_reader,
        resolve_entity, style_property, unescape_text, wrap_fragment,
    },
    ui::Color,
};

pub fn to_html(buffer: &Buffer) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in &buffer.blocks {
        let list = match block.kind {
            BlockKind::ListItem(kind) => Some(kind),
            _ => None,
        };
        if open_list != list {
            if let Some(kind) = open_list {
                out.push_str(list_tag(kind, true));
            }
            if let Some(kind) = list {
                out.push_str(list_tag(kind, false));
            }
            open_list = list;
        }

        let align = align_attr(block.alignment);
        let inner = runs_html(&block.runs);
        match block.kind {
            BlockKind::Paragraph => out.push_str(format!("<p{align}>{inner}</p>").as_str()),
            BlockKind::Heading(level) => {
                let level = level.clamp(1, 6);
                out.push_str(format!("<h{level}{align}>{inner}</h{level}>").as_str());
            }
            BlockKind::ListItem(_) => {
                out.push_str(format!("<li><p{align}>{inner}</p></li>").as_str());
            }
        }
    }

    if let Some(kind) = open_list {
        out.push_str(list_tag(kind, true));
    }
    out
}

/// Reads back the HTML subset produced by [`to_html`]. Unknown elements are
/// transparent; their text lands in the enclosing block.
pub fn from_html(markup: &str) -> Buffer {
    let wrapped = wrap_fragment(markup);
    let mut reader = fragment_reader(&wrapped);
    let decoder = reader.decoder();
    let mut builder = BufferBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(e.local_name().as_ref());
                builder.open(name.as_str(), &e, decoder);
            }
            Ok(Event::End(e)) => {
                let name = element_name(e.local_name().as_ref());
                builder.close(name.as_str());
            }
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.decode() {
                    builder.text(unescape_text(text.as_ref()).as_str());
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(resolved) = r.decode().ok().and_then(|name| resolve_entity(name.as_ref())) {
                    builder.text(resolved.as_str());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                debug!(%error, position = reader.buffer_position(), "stopping at malformed markup");
                break;
            }
        }
    }

    builder.finish()
}

fn list_tag(kind: ListKind, closing: bool) -> &'static str {
    match (kind, closing) {
        (ListKind::Bullet, false) => "<ul>",
        (ListKind::Bullet, true) => "</ul>",
        (ListKind::Ordered, false) => "<ol>",
        (ListKind::Ordered, true) => "</ol>",
    }
}

fn align_attr(alignment: TextAlign) -> String {
    match alignment {
        TextAlign::Left => String::new(),
        other => format!(" style=\"text-align: {}\"", other.as_str()),
    }
}

fn runs_html(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        let style = &run.style;
        if style.bold {
            out.push_str("<strong>");
        }
        if style.italic {
            out.push_str("<em>");
        }
        if style.strikethrough {
            out.push_str("<s>");
        }
        if let Some(color) = &style.color {
            out.push_str(format!("<span style=\"color: {}\">", escape_attribute(color.as_str())).as_str());
        }
        out.push_str(escape_text(run.text.as_str()).as_str());
        if style.color.is_some() {
            out.push_str("</span>");
        }
        if style.strikethrough {
            out.push_str("</s>");
        }
        if style.italic {
            out.push_str("</em>");
        }
        if style.bold {
            out.push_str("</strong>");
        }
    }
    out
}

#[derive(Debug, Default)]
struct BufferBuilder {
    blocks: Vec<Block>,
    current: Option<Block>,
    lists: Vec<ListKind>,
    bold: u32,
    italic: u32,
    strike: u32,
    colors: Vec<Option<Color>>,
}

impl BufferBuilder {
    fn open(&mut self, name: &str, event: &BytesStart<'_>, decoder: Decoder) {
        let alignment = style_property(event, "text-align", decoder)
            .and_then(|value| TextAlign::parse(value.as_str()));

        match name {
            "p" | "div" => match self.current.as_mut() {
                Some(block) if matches!(block.kind, BlockKind::ListItem(_)) && block.is_empty() => {
                    if let Some(alignment) = alignment {
                        block.alignment = alignment;
                    }
                }
                Some(block) if matches!(block.kind, BlockKind::ListItem(_)) => {
                    let kind = block.kind;
                    self.start_block(kind, alignment);
                }
                _ => self.start_block(BlockKind::Paragraph, alignment),
            },
            "li" => {
                let kind = self.lists.last().copied().unwrap_or(ListKind::Bullet);
                self.start_block(BlockKind::ListItem(kind), alignment);
            }
            "ul" => {
                self.finish_block();
                self.lists.push(ListKind::Bullet);
            }
            "ol" => {
                self.finish_block();
                self.lists.push(ListKind::Ordered);
            }
            "strong" | "b" => self.bold += 1,
            "em" | "i" => self.italic += 1,
            "s" | "strike" | "del" => self.strike += 1,
            "span" => {
                let color = style_property(event, "color", decoder)
                    .and_then(|value| Color::parse(value.as_str()).ok());
                self.colors.push(color);
            }
            "br" => {
                if let Some((kind, alignment)) = self.current.as_ref().map(|b| (b.kind, b.alignment)) {
                    self.finish_block();
                    self.current = Some(Block {
                        kind,
                        alignment,
                        runs: Vec::new(),
                    });
                }
            }
            other => {
                if let Some(level) = heading_level(other) {
                    self.start_block(BlockKind::heading(level), alignment);
                }
            }
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "p" | "div" => {
                let in_list_item = matches!(
                    self.current.as_ref().map(|b| b.kind),
                    Some(BlockKind::ListItem(_))
                );
                if !in_list_item {
                    self.finish_block();
                }
            }
            "li" => self.finish_block(),
            "ul" | "ol" => {
                self.finish_block();
                self.lists.pop();
            }
            "strong" | "b" => self.bold = self.bold.saturating_sub(1),
            "em" | "i" => self.italic = self.italic.saturating_sub(1),
            "s" | "strike" | "del" => self.strike = self.strike.saturating_sub(1),
            "span" => {
                self.colors.pop();
            }
            other => {
                if heading_level(other).is_some() {
                    self.finish_block();
                }
            }
        }
    }

    fn text(&mut self, raw: &str) {
        let collapsed = collapse_whitespace(raw);
        if self.current.is_none() {
            if collapsed.trim().is_empty() {
                return;
            }
            self.start_block(BlockKind::Paragraph, None);
        }

        let style = self.style();
        let Some(block) = self.current.as_mut() else {
            return;
        };
        let text = if block.is_empty() {
            collapsed.trim_start().to_string()
        } else {
            collapsed
        };
        if !text.is_empty() {
            block.runs.push(Run::new(text, style));
        }
    }

    fn style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            strikethrough: self.strike > 0,
            color: self.colors.iter().rev().find_map(Clone::clone),
        }
    }

    fn start_block(&mut self, kind: BlockKind, alignment: Option<TextAlign>) {
        self.finish_block();
        self.current = Some(Block {
            kind,
            alignment: alignment.unwrap_or_default(),
            runs: Vec::new(),
        });
    }

    fn finish_block(&mut self) {
        let Some(mut block) = self.current.take() else {
            return;
        };
        if let Some(last) = block.runs.last_mut() {
            let trimmed = last.text.trim_end().len();
            last.text.truncate(trimmed);
        }
        merge_adjacent_runs(&mut block.runs);
        self.blocks.push(block);
    }

    fn finish(mut self) -> Buffer {
        self.finish_block();
        Buffer::from_blocks(self.blocks)
    }
}

fn heading_level(name: &str) -> Option<u8> {
    let level = name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold_run(text: &str) -> Run {
        Run::new(
            text,
            RunStyle {
                bold: true,
                ..RunStyle::default()
            },
        )
    }

    #[test]
    fn empty_buffer_serializes_to_empty_paragraph() {
        assert_eq!(to_html(&Buffer::empty()), "<p></p>");
        assert_eq!(from_html(""), Buffer::empty());
        assert_eq!(from_html("   \n  "), Buffer::empty());
    }

    #[test]
    fn writes_marks_alignment_and_lists() {
        let buffer = Buffer::from_blocks(vec![
            Block {
                kind: BlockKind::Heading(2),
                alignment: TextAlign::Center,
                runs: vec![Run::plain("Title")],
            },
            Block {
                runs: vec![Run::plain("a "), bold_run("b & c")],
                ..Block::paragraph()
            },
            Block {
                runs: vec![Run::plain("one")],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Bullet))
            },
            Block {
                runs: vec![Run::plain("two")],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Bullet))
            },
            Block {
                runs: vec![Run::new(
                    "red",
                    RunStyle {
                        color: Some(Color::red()),
                        ..RunStyle::default()
                    },
                )],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Ordered))
            },
        ]);

        assert_eq!(
            to_html(&buffer),
            "<h2 style=\"text-align: center\">Title</h2>\
             <p>a <strong>b &amp; c</strong></p>\
             <ul><li><p>one</p></li><li><p>two</p></li></ul>\
             <ol><li><p><span style=\"color: #ef4444\">red</span></p></li></ol>"
        );
    }

    #[test]
    fn reads_back_its_own_output() {
        let markup = "<h1>Hi</h1><p style=\"text-align: right\">x <em><strong>y</strong></em></p>\
                      <ol><li><p>first</p></li></ol><p><s>gone</s></p>";
        let buffer = from_html(markup);
        assert_eq!(buffer.blocks.len(), 4);
        assert_eq!(buffer.blocks[0].kind, BlockKind::Heading(1));
        assert_eq!(buffer.blocks[1].alignment, TextAlign::Right);
        assert!(buffer.blocks[1].runs[1].style.bold && buffer.blocks[1].runs[1].style.italic);
        assert_eq!(buffer.blocks[2].kind, BlockKind::ListItem(ListKind::Ordered));
        assert!(buffer.blocks[3].runs[0].style.strikethrough);
        assert_eq!(to_html(&buffer), markup.replace("<em><strong>y</strong></em>", "<strong><em>y</em></strong>"));
    }

    #[test]
    fn tolerates_indentation_and_void_elements() {
        let markup = "\n      <h1>Welcome</h1>\n      <p>line one<br>line two</p>\n      <ul>\n        <li><strong>Rich</strong> text</li>\n      </ul>\n    ";
        let buffer = from_html(markup);
        let texts: Vec<String> = buffer.blocks.iter().map(Block::text).collect();
        assert_eq!(texts, vec!["Welcome", "line one", "line two", "Rich text"]);
        assert_eq!(buffer.blocks[3].kind, BlockKind::ListItem(ListKind::Bullet));
    }

    #[test]
    fn bare_text_becomes_a_paragraph() {
        let buffer = from_html("Hello world");
        assert_eq!(buffer.blocks.len(), 1);
        assert_eq!(buffer.blocks[0].text(), "Hello world");
        assert_eq!(to_html(&buffer), "<p>Hello world</p>");
    }

    #[test]
    fn stray_ampersand_and_angle_bracket_keep_the_rest() {
        let buffer = from_html("<p>Tom & Jerry</p><p>a < b</p><p>second</p>");
        let texts: Vec<String> = buffer.blocks.iter().map(Block::text).collect();
        assert_eq!(texts, vec!["Tom & Jerry", "a < b", "second"]);
        assert_eq!(
            to_html(&buffer),
            "<p>Tom &amp; Jerry</p><p>a &lt; b</p><p>second</p>"
        );
    }
}
