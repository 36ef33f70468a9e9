//! Source comments and the dual (semantic + raw) parse

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::js_doc::{JsDoc, JsDocTag};
use crate::raw_tags::{self, RawTag};

lazy_static! {
    /// `@param {T} [name=default]`, which the semantic parser rejects
    static ref PARAM_DEFAULT: Regex =
        Regex::new(r"(@param\s+\{[^}]+\}\s+)\[([^=\]]+)=[^\]]+\]").unwrap();
}

/// Whether the comment was written as `/* */` or `//`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentKind {
    Block,
    Line,
}

/// A comment of the source file
///
/// Two comments are the same comment when span and text agree, which is what
/// the annotator's visited set keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub kind: CommentKind,
    /// Byte offset of the comment start
    pub start: usize,
    /// Byte offset one past the comment end
    pub end: usize,
    /// Text without the comment delimiters
    pub text: String,
}

impl Comment {
    /// Create a block comment from its value
    pub fn block(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Block,
            start,
            end,
            text: text.into(),
        }
    }

    /// Create a line comment from its value
    pub fn line(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Line,
            start,
            end,
            text: text.into(),
        }
    }

    /// The value re-wrapped as a block comment
    pub fn as_block_text(&self) -> String {
        format!("/*{}*/", self.text)
    }
}

/// Output of both parsers for one comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DualParse {
    pub semantic: Vec<JsDocTag>,
    pub raw: Vec<RawTag>,
    /// The raw parser found no JSDoc block and `raw` mirrors `semantic`
    pub raw_missing: bool,
}

/// Replace `[name=default]` by `[name]` in `@param` tags
pub fn strip_param_defaults(text: &str) -> String {
    PARAM_DEFAULT.replace_all(text, "${1}[${2}]").into_owned()
}

/// Parse a comment with both parsers
pub fn parse_dual(comment: &Comment) -> DualParse {
    let semantic = JsDoc::parse(&strip_param_defaults(&comment.text)).tags;

    let blocks = raw_tags::parse_blocks(&comment.as_block_text());
    match blocks.into_iter().next() {
        Some(block) => DualParse {
            semantic,
            raw: block.tags,
            raw_missing: false,
        },
        None => {
            tracing::debug!(start = comment.start, "no JSDoc block, using semantic tags");
            let raw = semantic.iter().map(raw_from_semantic).collect();
            DualParse {
                semantic,
                raw,
                raw_missing: true,
            }
        }
    }
}

/// Stand-in raw tag built from a semantic one; its type text stays empty
fn raw_from_semantic(tag: &JsDocTag) -> RawTag {
    RawTag {
        tag: tag.title.clone(),
        name: tag.name.clone().unwrap_or_default(),
        type_text: String::new(),
        optional: tag.bracketed,
        default: None,
        description: tag.description.clone().unwrap_or_default(),
        line: 0,
    }
}
