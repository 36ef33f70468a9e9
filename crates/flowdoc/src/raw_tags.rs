//! Syntactic JSDoc block parsing
//!
//! Splits `/** ... */` blocks into tags without interpreting types. The type
//! text between braces is kept verbatim (including a trailing `=`), bracketed
//! names keep their optional marker and default value.

use serde::{Deserialize, Serialize};

use crate::js_doc::find_matching_brace;

/// A JSDoc block found in a piece of text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    /// Text before the first tag
    pub description: String,
    /// Tags in source order
    pub tags: Vec<RawTag>,
}

/// One tag of the raw parse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTag {
    /// Tag keyword without `@`
    pub tag: String,
    /// First word after the type, brackets removed
    pub name: String,
    /// Verbatim text between the type braces
    pub type_text: String,
    /// Name was written as `[name]` or `[name=default]`
    pub optional: bool,
    /// Default from `[name=default]`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<String>,
    pub description: String,
    /// Zero-based line within the block
    pub line: usize,
}

/// Parse every JSDoc block contained in `source`
///
/// Only blocks opened by exactly `/**` are recognised; `/*` and `/***`
/// openers are skipped.
pub fn parse_blocks(source: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("/*") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("*/") else {
            break;
        };
        let body = &after_open[..end];
        rest = &after_open[end + 2..];

        let is_jsdoc = body.starts_with('*') && !body.starts_with("**");
        if is_jsdoc {
            blocks.push(parse_block(&body[1..]));
        }
    }

    blocks
}

/// Parse the inside of one block (after `/**`, before `*/`)
fn parse_block(body: &str) -> RawBlock {
    let mut block = RawBlock::default();
    let mut description_lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (line_no, line) in body.lines().enumerate() {
        let content = strip_line_prefix(line);

        if content.starts_with('@') {
            if let Some((start, text)) = current.take() {
                block.tags.push(parse_tag(&text, start));
            }
            current = Some((line_no, content.to_string()));
        } else if let Some((_, ref mut text)) = current {
            let content = content.trim_start();
            if !content.is_empty() {
                text.push('\n');
                text.push_str(content);
            }
        } else if !content.is_empty() {
            description_lines.push(content);
        }
    }

    if let Some((start, text)) = current {
        block.tags.push(parse_tag(&text, start));
    }
    block.description = description_lines.join("\n");

    block
}

/// Remove leading whitespace, the `*` gutter and one space
fn strip_line_prefix(line: &str) -> &str {
    let trimmed = line.trim_start();
    let without_star = match trimmed.strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => trimmed,
    };
    without_star.trim_end()
}

/// Tokenize `@tag {type} name description`
fn parse_tag(text: &str, line: usize) -> RawTag {
    let text = text.strip_prefix('@').unwrap_or(text);
    let tag_end = text.find(char::is_whitespace).unwrap_or(text.len());
    let mut tag = RawTag {
        tag: text[..tag_end].to_string(),
        line,
        ..RawTag::default()
    };

    let mut rest = text[tag_end..].trim_start();

    if rest.starts_with('{') {
        if let Some(close) = find_matching_brace(rest) {
            tag.type_text = rest[1..close].trim().to_string();
            rest = rest[close + 1..].trim_start();
        }
    }

    rest = parse_name(rest, &mut tag);
    tag.description = rest.trim().to_string();

    tag
}

/// Consume the name token, returning what follows it
fn parse_name<'a>(rest: &'a str, tag: &mut RawTag) -> &'a str {
    if let Some(inner) = rest.strip_prefix('[') {
        if let Some(close) = find_closing_bracket(inner) {
            let spec = inner[..close].trim();
            match spec.split_once('=') {
                Some((name, default)) => {
                    tag.name = name.trim().to_string();
                    tag.default = Some(default.trim().to_string());
                }
                None => tag.name = spec.to_string(),
            }
            tag.optional = true;
            return &inner[close + 1..];
        }
    }

    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    tag.name = rest[..end].to_string();
    &rest[end..]
}

/// Closing `]` of a bracketed name; `[]` pairs inside (`a[].b`) are skipped
fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}
