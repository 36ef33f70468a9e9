//! Merging the semantic and raw tag lists into one canonical tag record

use serde::{Deserialize, Serialize};

use crate::comment::DualParse;
use crate::doctype::DocType;
use crate::raw_tags::RawTag;

/// Tag titles the annotator acts on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "title")]
pub enum TagKind {
    /// `@param`, `@arg`, `@argument`
    Param,
    /// `@returns`, `@return`
    Returns,
    Other(String),
}

impl TagKind {
    /// Classify a tag keyword
    pub fn from_title(title: &str) -> Self {
        match title {
            "param" | "arg" | "argument" => TagKind::Param,
            "returns" | "return" => TagKind::Returns,
            other => TagKind::Other(other.to_string()),
        }
    }
}

/// One documented tag with the fields of both parses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub title: String,
    pub kind: TagKind,
    /// Possibly dotted name (`obj.a.b`)
    pub name: String,
    /// Structured type, absent when reconciliation was skipped
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub doc_type: Option<DocType>,
    /// Verbatim type text between the braces
    pub type_text: String,
    /// Bracketed name (`[a]`)
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<String>,
    pub description: String,
    pub line: usize,
}

impl Tag {
    /// Build from a raw tag alone
    pub fn from_raw(raw: RawTag) -> Self {
        Self {
            kind: TagKind::from_title(&raw.tag),
            title: raw.tag,
            name: raw.name,
            doc_type: None,
            type_text: raw.type_text,
            optional: raw.optional,
            default: raw.default,
            description: raw.description,
            line: raw.line,
        }
    }

    /// Attach the structured type of the matching semantic tag
    pub fn with_doc_type(mut self, doc_type: Option<DocType>) -> Self {
        self.doc_type = doc_type;
        self
    }

    /// Whether any type was documented
    pub fn has_type(&self) -> bool {
        self.doc_type.is_some() || !self.type_text.is_empty()
    }

    /// The type carries the trailing `=` marker (`{number=}`)
    ///
    /// Bracket notation on the name does not count.
    pub fn has_optional_marker(&self) -> bool {
        match &self.doc_type {
            Some(ty) => ty.is_optional(),
            None => self.type_text.trim_end().ends_with('='),
        }
    }

    /// Name split on `.`
    pub fn path(&self) -> Vec<&str> {
        self.name.split('.').collect()
    }

    /// First segment of the name
    pub fn root_name(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }

    /// Name has no `.`
    pub fn is_top_level(&self) -> bool {
        !self.name.is_empty() && !self.name.contains('.')
    }
}

/// Merge the two parses of one comment
///
/// Tags are paired by position. When the lists differ in length the raw tags
/// are used alone, without structured types.
pub fn reconcile(parse: DualParse) -> Vec<Tag> {
    let DualParse { semantic, raw, .. } = parse;

    if semantic.len() != raw.len() {
        tracing::debug!(
            semantic = semantic.len(),
            raw = raw.len(),
            "tag counts differ, using raw tags only"
        );
        return raw.into_iter().map(Tag::from_raw).collect();
    }

    raw.into_iter()
        .zip(semantic)
        .map(|(raw, sem)| {
            let mut tag = Tag::from_raw(raw).with_doc_type(sem.doc_type);
            if tag.description.is_empty() {
                if let Some(description) = sem.description {
                    tag.description = description;
                }
            }
            tag
        })
        .collect()
}
