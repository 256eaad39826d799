use quick_xml::events::Event;

use crate::markup::{element_name, fragment_reader, is_block_element, resolve_entity, unescape_text, wrap_fragment};

pub const DEFAULT_MAX_TITLE_CHARS: usize = 50;
pub const DEFAULT_UNTITLED_LABEL: &str = "Untitled Document";

/// Turns serialized content into a short list label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDeriver {
    max_chars: usize,
    untitled_label: String,
}

impl Default for TitleDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TITLE_CHARS, DEFAULT_UNTITLED_LABEL)
    }
}

impl TitleDeriver {
    /// `max_chars` is clamped to `1..=DEFAULT_MAX_TITLE_CHARS`.
    pub fn new(max_chars: usize, untitled_label: impl Into<String>) -> Self {
        let max_chars = max_chars.clamp(1, DEFAULT_MAX_TITLE_CHARS);
        let label = untitled_label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_UNTITLED_LABEL.to_string()
        } else {
            label
        };
        Self {
            max_chars,
            untitled_label: truncate_chars(label.trim(), max_chars),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn untitled_label(&self) -> &str {
        self.untitled_label.as_str()
    }

    pub fn derive(&self, content: &str) -> String {
        let text = plain_text(content);
        let first_line = text.trim().lines().next().unwrap_or_default().trim();
        if first_line.is_empty() {
            return self.untitled_label.clone();
        }
        truncate_chars(first_line, self.max_chars)
    }
}

pub fn derive_title(content: &str) -> String {
    TitleDeriver::default().derive(content)
}

/// Strips markup, ending a line at every block element boundary.
pub fn plain_text(content: &str) -> String {
    let wrapped = wrap_fragment(content);
    let mut reader = fragment_reader(&wrapped);
    let mut out = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_block_element(element_name(e.local_name().as_ref()).as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                if is_block_element(element_name(e.local_name().as_ref()).as_str()) {
                    out.push('\n');
                }
            }
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.decode() {
                    out.push_str(unescape_text(text.as_ref()).as_str());
                }
            }
            Ok(Event::CData(c)) => out.push_str(String::from_utf8_lossy(&c).as_ref()),
            Ok(Event::GeneralRef(r)) => {
                if let Some(resolved) = r.decode().ok().and_then(|name| resolve_entity(name.as_ref())) {
                    out.push_str(resolved.as_str());
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_first_line_of_plain_text() {
        assert_eq!(derive_title("<p>Hello world</p>"), "Hello world");
        assert_eq!(derive_title("<h1>Plan</h1><p>details</p>"), "Plan");
        assert_eq!(derive_title("<p>one<br>two</p>"), "one");
        assert_eq!(derive_title("<ul><li><p>item</p></li></ul>"), "item");
        assert_eq!(derive_title("plain text\nsecond"), "plain text");
    }

    #[test]
    fn inline_marks_do_not_break_the_line() {
        assert_eq!(
            derive_title("<p><strong>Bold</strong> and <span style=\"color: #ef4444\">red</span></p>"),
            "Bold and red"
        );
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(derive_title("<p>Fish &amp; chips &lt;3</p>"), "Fish & chips <3");
    }

    #[test]
    fn blank_content_gets_the_placeholder() {
        assert_eq!(derive_title(""), DEFAULT_UNTITLED_LABEL);
        assert_eq!(derive_title("<p></p>"), DEFAULT_UNTITLED_LABEL);
        assert_eq!(derive_title("<p>   </p><p>\t</p>"), DEFAULT_UNTITLED_LABEL);
    }

    #[test]
    fn leading_blank_blocks_are_skipped() {
        assert_eq!(derive_title("<p></p><p>  Real title  </p>"), "Real title");
    }

    #[test]
    fn truncates_to_fifty_characters() {
        let long = "ş".repeat(80);
        let title = derive_title(format!("<p>{long}</p>").as_str());
        assert_eq!(title.chars().count(), DEFAULT_MAX_TITLE_CHARS);
        assert_eq!(title, derive_title(format!("<p>{long}</p>").as_str()));
    }

    #[test]
    fn unclosed_markup_keeps_the_text_read_so_far() {
        assert_eq!(derive_title("<p>Draft <em>note"), "Draft note");
    }

    #[test]
    fn custom_deriver_clamps_its_label() {
        let deriver = TitleDeriver::new(8, "Başlıksız Döküman");
        assert_eq!(deriver.untitled_label(), "Başlıksı");
        assert_eq!(deriver.derive("<p>Merhaba dünya</p>"), "Merhaba ");
        assert_eq!(deriver.derive("<p></p>"), "Başlıksı");

        let fallback = TitleDeriver::new(50, "  ");
        assert_eq!(fallback.untitled_label(), DEFAULT_UNTITLED_LABEL);
    }

    #[test]
    fn wider_limits_are_capped_at_fifty() {
        let deriver = TitleDeriver::new(120, DEFAULT_UNTITLED_LABEL);
        assert_eq!(deriver.max_chars(), DEFAULT_MAX_TITLE_CHARS);

        let long = "x".repeat(120);
        let title = deriver.derive(format!("<p>{long}</p>").as_str());
        assert_eq!(title.chars().count(), DEFAULT_MAX_TITLE_CHARS);
    }

    #[test]
    fn stray_ampersands_and_angle_brackets_stay_text() {
        assert_eq!(derive_title("<p>Tom & Jerry</p>"), "Tom & Jerry");
        assert_eq!(derive_title("<p>a < b</p><p>next</p>"), "a < b");
        assert_eq!(derive_title("<p>R&D &amp; QA</p>"), "R&D & QA");
    }
}
