//! Lenient reading of HTML fragments with `quick-xml`.
//!
//! Stored content is whatever the editor emitted, which is well-formed in
//! practice, but hand-edited stores and pasted fragments may carry void
//! elements (`<br>`), stray closing tags, or a bare `&` or `<` in text. The
//! reader tolerates the first two, [`wrap_fragment`] escapes the last two, and
//! callers treat any remaining hard parse error as end of input.

use std::sync::LazyLock;

use quick_xml::{Reader, events::BytesStart};
use regex::Regex;

static ENTITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("entity pattern is valid")
});

/// Elements whose boundaries end a line of plain text.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "pre", "br",
    "hr",
];

/// Wraps `fragment` in a synthetic root so multiple top-level elements parse.
pub fn wrap_fragment(fragment: &str) -> String {
    format!("<root>{}</root>", escape_stray_markup(fragment))
}

/// Escapes `&` that does not start an entity and `<` that does not start a
/// tag, comment or declaration, so both read back as literal text.
pub fn escape_stray_markup(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for (index, ch) in fragment.char_indices() {
        let rest = &fragment[index..];
        match ch {
            '&' if !ENTITY_PREFIX.is_match(rest) => out.push_str("&amp;"),
            '<' if !starts_tag(&rest[1..]) => out.push_str("&lt;"),
            other => out.push(other),
        }
    }
    out
}

fn starts_tag(after_lt: &str) -> bool {
    let mut chars = after_lt.chars();
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some(c) => c.is_ascii_alphabetic() || c == '!' || c == '?',
        None => false,
    }
}

pub fn fragment_reader(wrapped: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(wrapped);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.expand_empty_elements = true;
    reader
}

pub fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Looks up a CSS property inside an element's inline `style` attribute.
pub fn style_property(
    event: &BytesStart<'_>,
    property: &str,
    decoder: quick_xml::encoding::Decoder,
) -> Option<String> {
    let style = event.attributes().flatten().find_map(|a| {
        if a.key.as_ref().eq_ignore_ascii_case(b"style") {
            a.decode_and_unescape_value(decoder).ok().map(|v| v.to_string())
        } else {
            None
        }
    })?;

    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Resolves a general entity reference body such as `amp` or `#x27`.
pub fn resolve_entity(name: &str) -> Option<String> {
    let resolved = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some(resolved.to_string())
}

/// Decodes any entity references left inside a text chunk.
pub fn unescape_text(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(semi) if semi <= 10 => match resolve_entity(&after[..semi]) {
                Some(resolved) => {
                    out.push_str(&resolved);
                    rest = &after[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapses runs of whitespace the way HTML layout does.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
