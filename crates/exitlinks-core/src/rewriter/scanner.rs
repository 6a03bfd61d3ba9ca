//! Tag-level HTML scanner.
//!
//! Walks an HTML fragment without building a tree and reports where the
//! `href` value of every anchor start tag lives. Only the reported byte
//! ranges are ever replaced, so everything else in the fragment survives
//! byte for byte. A DOM parser such as `scraper` or `html5ever` is not used
//! because it re-serializes the whole fragment on output.
//!
//! Comments, declarations, end tags and the bodies of raw-text elements
//! (`<script>`, `<style>`, ...) are skipped so that markup-like text inside
//! them is never mistaken for an anchor.

use crate::error::{LinkError, Result};

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

/// Location of an anchor's `href` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HrefSpan {
    /// Byte offset of the first character of the value.
    pub start: usize,
    /// Byte offset one past the last character of the value.
    pub end: usize,
}

/// An attribute as found in a start tag.
#[derive(Debug)]
struct Attribute {
    name_start: usize,
    name_end: usize,
    value: Option<HrefSpan>,
}

/// Finds the `href` value of every `<a>` start tag in `html`.
///
/// Only the first `href` of a tag counts, matching how browsers resolve
/// duplicate attributes.
///
/// # Errors
///
/// Returns [`LinkError::UnparsableContent`] when a comment, tag, quoted value
/// or raw-text element is left unterminated.
pub fn find_anchor_hrefs(html: &str) -> Result<Vec<HrefSpan>> {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(lt) = find_byte(bytes, b'<', pos) {
        let next = bytes.get(lt + 1).copied();

        if bytes[lt + 1..].starts_with(b"!--") {
            let end =
                find_seq(bytes, b"-->", lt + 4).ok_or(unparsable(lt, "end of comment"))?;
            pos = end + 3;
        } else if matches!(next, Some(b'!') | Some(b'?')) {
            let end =
                find_byte(bytes, b'>', lt + 2).ok_or(unparsable(lt, "end of declaration"))?;
            pos = end + 1;
        } else if next == Some(b'/') {
            let end =
                find_byte(bytes, b'>', lt + 2).ok_or(unparsable(lt, "end of closing tag"))?;
            pos = end + 1;
        } else if next.is_some_and(|b| b.is_ascii_alphabetic()) {
            let name_start = lt + 1;
            let mut name_end = name_start;
            while name_end < bytes.len() && !is_tag_name_terminator(bytes[name_end]) {
                name_end += 1;
            }
            let name = html[name_start..name_end].to_ascii_lowercase();
            let (attributes, tag_end) = scan_attributes(bytes, name_end, lt)?;

            if name == "a" {
                let href = attributes
                    .iter()
                    .find(|a| html[a.name_start..a.name_end].eq_ignore_ascii_case("href"));
                if let Some(span) = href.and_then(|a| a.value) {
                    spans.push(span);
                }
            }

            pos = if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                find_raw_text_end(bytes, &name, tag_end)
                    .ok_or(unparsable(lt, "closing raw text tag"))?
            } else {
                tag_end
            };
        } else {
            // A bare '<' in text.
            pos = lt + 1;
        }
    }

    Ok(spans)
}

/// Scans attributes starting after the tag name. Returns them with the
/// offset just past the closing `>`.
fn scan_attributes(
    bytes: &[u8],
    mut pos: usize,
    tag_start: usize,
) -> Result<(Vec<Attribute>, usize)> {
    let mut attributes = Vec::new();

    loop {
        while pos < bytes.len() && (is_html_space(bytes[pos]) || bytes[pos] == b'/') {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Err(unparsable(tag_start, "end of tag")),
            Some(b'>') => return Ok((attributes, pos + 1)),
            Some(_) => {}
        }

        let name_start = pos;
        // A leading '=' belongs to the name.
        pos += 1;
        while pos < bytes.len() && !is_attr_name_terminator(bytes[pos]) {
            pos += 1;
        }
        let name_end = pos;

        while pos < bytes.len() && is_html_space(bytes[pos]) {
            pos += 1;
        }

        let mut value = None;
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && is_html_space(bytes[pos]) {
                pos += 1;
            }
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let close = find_byte(bytes, quote, pos + 1)
                        .ok_or(unparsable(pos, "closing quote"))?;
                    value = Some(HrefSpan {
                        start: pos + 1,
                        end: close,
                    });
                    pos = close + 1;
                }
                Some(_) => {
                    let start = pos;
                    while pos < bytes.len() && !is_html_space(bytes[pos]) && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    value = Some(HrefSpan { start, end: pos });
                }
                None => return Err(unparsable(tag_start, "end of tag")),
            }
        }

        attributes.push(Attribute {
            name_start,
            name_end,
            value,
        });
    }
}

/// Returns the offset of the `</name` that closes a raw-text element.
fn find_raw_text_end(bytes: &[u8], name: &str, from: usize) -> Option<usize> {
    let name = name.as_bytes();
    let mut pos = from;
    while let Some(lt) = find_seq(bytes, b"</", pos) {
        let candidate = &bytes[lt + 2..];
        if candidate.len() >= name.len()
            && candidate[..name.len()].eq_ignore_ascii_case(name)
            && candidate
                .get(name.len())
                .map_or(true, |&b| is_tag_name_terminator(b))
        {
            return Some(lt);
        }
        pos = lt + 2;
    }
    None
}

fn unparsable(offset: usize, reason: &'static str) -> LinkError {
    LinkError::UnparsableContent { offset, reason }
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find_seq(bytes: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

fn is_html_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn is_tag_name_terminator(b: u8) -> bool {
    is_html_space(b) || b == b'/' || b == b'>'
}

fn is_attr_name_terminator(b: u8) -> bool {
    is_html_space(b) || matches!(b, b'/' | b'>' | b'=')
}
