use serde_json::{Map, Value, json};

use crate::editor::model::{Block, BlockKind, Buffer, ListKind, Run};

/// Structured form of the buffer as a ProseMirror-style node tree.
pub fn to_json(buffer: &Buffer) -> Value {
    let mut content: Vec<Value> = Vec::new();
    let mut list: Option<(ListKind, Vec<Value>)> = None;

    for block in &buffer.blocks {
        let item_kind = match block.kind {
            BlockKind::ListItem(kind) => Some(kind),
            _ => None,
        };
        if list.as_ref().map(|(kind, _)| *kind) != item_kind {
            if let Some(finished) = list.take() {
                content.push(list_node(finished));
            }
            list = item_kind.map(|kind| (kind, Vec::new()));
        }

        let node = block_node(block);
        match list.as_mut() {
            Some((_, items)) => items.push(node),
            None => content.push(node),
        }
    }
    if let Some(finished) = list.take() {
        content.push(list_node(finished));
    }

    json!({ "type": "doc", "content": content })
}

fn list_node((kind, items): (ListKind, Vec<Value>)) -> Value {
    let name = match kind {
        ListKind::Bullet => "bulletList",
        ListKind::Ordered => "orderedList",
    };
    let mut node = json!({ "type": name, "content": items });
    if kind == ListKind::Ordered {
        node["attrs"] = json!({ "start": 1 });
    }
    node
}

fn block_node(block: &Block) -> Value {
    let mut attrs = Map::new();
    attrs.insert(
        "textAlign".to_string(),
        Value::String(block.alignment.as_str().to_string()),
    );

    let paragraph = |attrs: Map<String, Value>| {
        let mut node = json!({ "type": "paragraph", "attrs": attrs });
        let content = inline_nodes(&block.runs);
        if !content.is_empty() {
            node["content"] = Value::Array(content);
        }
        node
    };

    match block.kind {
        BlockKind::Paragraph => paragraph(attrs),
        BlockKind::Heading(level) => {
            attrs.insert("level".to_string(), json!(level));
            let mut node = paragraph(attrs);
            node["type"] = json!("heading");
            node
        }
        BlockKind::ListItem(_) => json!({ "type": "listItem", "content": [paragraph(attrs)] }),
    }
}

fn inline_nodes(runs: &[Run]) -> Vec<Value> {
    runs.iter()
        .filter(|run| !run.text.is_empty())
        .map(|run| {
            let mut marks = Vec::new();
            if run.style.bold {
                marks.push(json!({ "type": "bold" }));
            }
            if run.style.italic {
                marks.push(json!({ "type": "italic" }));
            }
            if run.style.strikethrough {
                marks.push(json!({ "type": "strike" }));
            }
            if let Some(color) = &run.style.color {
                marks.push(json!({ "type": "textStyle", "attrs": { "color": color.as_str() } }));
            }

            let mut node = json!({ "type": "text", "text": run.text });
            if !marks.is_empty() {
                node["marks"] = Value::Array(marks);
            }
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        editor::model::{RunStyle, TextAlign},
        ui::Color,
    };

    fn align_of(value: &Value) -> TextAlign {
        value
            .pointer("/attrs/textAlign")
            .and_then(Value::as_str)
            .and_then(TextAlign::parse)
            .unwrap_or_default()
    }

    #[test]
    fn empty_buffer_is_a_doc_with_one_bare_paragraph() {
        let value = to_json(&Buffer::empty());
        assert_eq!(
            value,
            json!({
                "type": "doc",
                "content": [{ "type": "paragraph", "attrs": { "textAlign": "left" } }]
            })
        );
    }

    #[test]
    fn groups_list_items_and_carries_marks() {
        let buffer = Buffer::from_blocks(vec![
            Block {
                kind: BlockKind::Heading(1),
                alignment: TextAlign::Center,
                runs: vec![Run::plain("Hi")],
            },
            Block {
                runs: vec![Run::new(
                    "one",
                    RunStyle {
                        bold: true,
                        color: Some(Color::blue()),
                        ..RunStyle::default()
                    },
                )],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Bullet))
            },
            Block {
                runs: vec![Run::plain("two")],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Bullet))
            },
            Block {
                runs: vec![Run::plain("1st")],
                ..Block::with_kind(BlockKind::ListItem(ListKind::Ordered))
            },
        ]);

        let value = to_json(&buffer);
        let content = value["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);

        assert_eq!(content[0]["type"], "heading");
        assert_eq!(content[0]["attrs"]["level"], 1);
        assert_eq!(align_of(&content[0]), TextAlign::Center);

        assert_eq!(content[1]["type"], "bulletList");
        assert_eq!(content[1]["content"].as_array().unwrap().len(), 2);
        let text = &content[1]["content"][0]["content"][0]["content"][0];
        assert_eq!(text["text"], "one");
        assert_eq!(text["marks"][0]["type"], "bold");
        assert_eq!(text["marks"][1]["attrs"]["color"], "#3b82f6");

        assert_eq!(content[2]["type"], "orderedList");
        assert_eq!(content[2]["attrs"]["start"], 1);
    }
}
