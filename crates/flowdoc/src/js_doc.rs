//! JSDoc parsing with structured types
//!
//! This module provides the semantic parse of a JSDoc comment: every tag's
//! `{type}` is parsed into a [`DocType`]. Tags whose type expression does not
//! parse, and parameter tags without a name, are dropped from the result the
//! way a strict JSDoc parser would; callers notice the dropped tag through a
//! count mismatch against the raw parse (see `reconcile`).

use crate::doctype::DocType;
use serde::{Deserialize, Serialize};

/// Parsed JSDoc documentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsDoc {
    /// Main description text
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Parsed JSDoc tags, in source order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<JsDocTag>,
}

/// One tag of the semantic parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsDocTag {
    /// Tag keyword without `@` (e.g. "param")
    pub title: String,

    /// Name for tags that take one (`@param {T} name`)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,

    /// Structured type from `{...}`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub doc_type: Option<DocType>,

    /// Description text
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Name was written in brackets (`[name]`)
    #[serde(default)]
    pub bracketed: bool,
}

impl JsDoc {
    /// Create a new empty doc
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse JSDoc from a comment string
    ///
    /// Accepts either the full comment (`/** ... */`) or only its value
    /// (the text between `/*` and `*/`).
    pub fn parse(comment: &str) -> Self {
        let cleaned = clean_jsdoc_comment(comment);
        let description = extract_description(&cleaned);
        let tags = parse_tags(&cleaned);

        Self { description, tags }
    }

    /// Check if this doc is empty
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.tags.is_empty()
    }

    /// Get the main description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get all @param tags
    pub fn params(&self) -> impl Iterator<Item = &JsDocTag> {
        self.tags
            .iter()
            .filter(|t| matches!(t.title.as_str(), "param" | "arg" | "argument"))
    }

    /// Get param doc by name
    pub fn param(&self, name: &str) -> Option<&JsDocTag> {
        self.params().find(|t| t.name.as_deref() == Some(name))
    }

    /// Get @returns tag
    pub fn returns(&self) -> Option<&JsDocTag> {
        self.tags
            .iter()
            .find(|t| matches!(t.title.as_str(), "returns" | "return"))
    }
}

/// How the content after the keyword is split up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagShape {
    /// `{type} name description`
    TypeAndName,
    /// `{type} description`
    TypeOnly,
    /// `name description`
    NameOnly,
    /// free text
    Text,
}

fn tag_shape(title: &str) -> TagShape {
    match title {
        "param" | "arg" | "argument" | "property" | "prop" | "typedef" => TagShape::TypeAndName,
        "returns" | "return" | "type" | "throws" | "exception" | "enum" | "define" | "this" => {
            TagShape::TypeOnly
        }
        "callback" | "name" | "alias" | "memberof" | "template" | "typeparam" => TagShape::NameOnly,
        _ => TagShape::Text,
    }
}

/// Clean JSDoc comment by removing delimiters and normalizing whitespace
fn clean_jsdoc_comment(comment: &str) -> String {
    let mut result = String::new();

    for line in comment.lines() {
        let trimmed = line.trim();

        // Skip opening/closing delimiters
        if trimmed == "/**" || trimmed == "*/" || trimmed == "*" {
            if !result.is_empty() {
                result.push('\n');
            }
            continue;
        }

        let mut content = trimmed;

        if content.starts_with("/**") {
            content = content.trim_start_matches("/**").trim_start();
        }

        // Remove leading * and one space
        if content.starts_with("* ") {
            content = &content[2..];
        } else if content.starts_with('*') {
            content = &content[1..];
        }

        if content.ends_with("*/") {
            content = content.trim_end_matches("*/").trim_end();
        }

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(content);
    }

    result.trim().to_string()
}

/// Extract description text before the first tag
fn extract_description(text: &str) -> Option<String> {
    let first_tag_pos =
        text.find("\n@")
            .or_else(|| if text.starts_with('@') { Some(0) } else { None });

    let desc = match first_tag_pos {
        Some(0) => return None,
        Some(pos) => &text[..pos],
        None => text,
    };

    let trimmed = desc.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse all JSDoc tags from the cleaned comment
fn parse_tags(text: &str) -> Vec<JsDocTag> {
    let mut tags = Vec::new();
    let mut current_tag: Option<(String, String)> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(after_at) = trimmed.strip_prefix('@') {
            if let Some((tag_name, content)) = current_tag.take() {
                tags.extend(parse_single_tag(&tag_name, &content));
            }

            if let Some(space_pos) = after_at.find(char::is_whitespace) {
                let tag_name = after_at[..space_pos].to_string();
                let content = after_at[space_pos + 1..].to_string();
                current_tag = Some((tag_name, content));
            } else {
                current_tag = Some((after_at.to_string(), String::new()));
            }
        } else if let Some((_, ref mut content)) = current_tag {
            // Continue multi-line tag content
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(trimmed);
        }
    }

    if let Some((tag_name, content)) = current_tag {
        tags.extend(parse_single_tag(&tag_name, &content));
    }

    tags
}

/// Parse a single JSDoc tag, or `None` when the tag is rejected
fn parse_single_tag(title: &str, content: &str) -> Option<JsDocTag> {
    let content = content.trim();
    let shape = tag_shape(title);

    let (type_text, rest) = match shape {
        TagShape::TypeAndName | TagShape::TypeOnly => extract_type_and_rest(content),
        TagShape::NameOnly | TagShape::Text => (None, content),
    };

    let doc_type = match type_text {
        Some(text) => match DocType::parse(text) {
            Ok(ty) => Some(ty),
            Err(err) => {
                tracing::debug!(tag = %title, error = %err, "dropping tag with unparseable type");
                return None;
            }
        },
        None => None,
    };

    let mut tag = JsDocTag {
        title: title.to_string(),
        name: None,
        doc_type,
        description: None,
        bracketed: false,
    };

    match shape {
        TagShape::TypeAndName => {
            let (name, bracketed, doc) = split_param_name(rest)?;
            if name.is_empty() {
                tracing::debug!(tag = %title, "dropping tag without a name");
                return None;
            }
            tag.name = Some(name);
            tag.bracketed = bracketed;
            tag.description = doc;
        }
        TagShape::NameOnly => {
            let (name, doc) = split_name_and_doc(rest);
            tag.name = if name.is_empty() { None } else { Some(name) };
            tag.description = doc;
        }
        TagShape::TypeOnly | TagShape::Text => {
            tag.description = extract_doc_after_name(rest);
        }
    }

    Some(tag)
}

/// Split `name desc` or `[name] desc`; `[name=default]` is rejected
fn split_param_name(rest: &str) -> Option<(String, bool, Option<String>)> {
    if let Some(inner) = rest.strip_prefix('[') {
        let bracket_end = inner.find(']')?;
        let name = inner[..bracket_end].trim();
        if name.contains('=') {
            tracing::debug!(name = %name, "default values are not supported in bracketed names");
            return None;
        }
        let doc = extract_doc_after_name(&inner[bracket_end + 1..]);
        Some((name.to_string(), true, doc))
    } else {
        let (name, doc) = split_name_and_doc(rest);
        Some((name, false, doc))
    }
}

/// Extract type from {type} at start of content
fn extract_type_and_rest(content: &str) -> (Option<&str>, &str) {
    if content.starts_with('{') {
        if let Some(close_pos) = find_matching_brace(content) {
            let type_str = content[1..close_pos].trim();
            let rest = content[close_pos + 1..].trim();
            (Some(type_str), rest)
        } else {
            (None, content)
        }
    } else {
        (None, content)
    }
}

/// Find matching closing brace, handling nested braces
pub(crate) fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split "name - description" or "name description"
fn split_name_and_doc(s: &str) -> (String, Option<String>) {
    let s = s.trim();

    if let Some(space_pos) = s.find(char::is_whitespace) {
        let name = s[..space_pos].trim().to_string();
        (name, extract_doc_after_name(&s[space_pos..]))
    } else {
        (s.to_string(), None)
    }
}

/// Extract description after parameter name
fn extract_doc_after_name(s: &str) -> Option<String> {
    let trimmed = s.trim().trim_start_matches('-').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_jsdoc() {
        let doc = JsDoc::parse("/** Hello world */");
        assert_eq!(doc.description(), Some("Hello world"));
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_parse_comment_value() {
        // value of `/** ... */` as handed over by the source parser
        let doc = JsDoc::parse("*\n * Adds.\n * @param {number} a - First\n ");
        assert_eq!(doc.description(), Some("Adds."));
        let param = doc.param("a").unwrap();
        assert_eq!(param.doc_type, Some(DocType::name("number")));
        assert_eq!(param.description.as_deref(), Some("First"));
    }

    #[test]
    fn test_parse_typed_param() {
        let doc = JsDoc::parse("/** @param {string} path - The path */");
        let params: Vec<_> = doc.params().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name.as_deref(), Some("path"));
        assert_eq!(params[0].doc_type, Some(DocType::name("string")));
        assert!(!params[0].bracketed);
    }

    #[test]
    fn test_parse_bracketed_param() {
        let doc = JsDoc::parse("/** @param {number} [a] */");
        let param = doc.param("a").unwrap();
        assert!(param.bracketed);
        // brackets never change the type itself
        assert_eq!(param.doc_type, Some(DocType::name("number")));
    }

    #[test]
    fn test_parse_untyped_param() {
        let doc = JsDoc::parse("/** @param a */");
        let param = doc.param("a").unwrap();
        assert!(param.doc_type.is_none());
    }

    #[test]
    fn test_parse_dotted_param() {
        let doc = JsDoc::parse(
            r#"/**
             * @param {object} obj
             * @param {number=} obj.a
             */"#,
        );
        let param = doc.param("obj.a").unwrap();
        assert!(param.doc_type.as_ref().unwrap().is_optional());
    }

    #[test]
    fn test_drops_unparseable_type() {
        let doc = JsDoc::parse(
            r#"/**
             * @param {Array.<number} a
             * @param {string} b
             */"#,
        );
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(doc.tags[0].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_drops_default_value_and_missing_name() {
        let doc = JsDoc::parse("/** @param {number} [a=1] */");
        assert!(doc.tags.is_empty());

        let doc = JsDoc::parse("/** @param {number} */");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_parse_returns() {
        let doc = JsDoc::parse("/** @returns {Promise.<string>} The file contents */");
        let returns = doc.returns().unwrap();
        assert!(matches!(returns.doc_type, Some(DocType::Application { .. })));
        assert_eq!(returns.description.as_deref(), Some("The file contents"));
    }

    #[test]
    fn test_parse_callback() {
        let doc = JsDoc::parse("/** @callback promiseMeCoroutine */");
        assert_eq!(doc.tags[0].title, "callback");
        assert_eq!(doc.tags[0].name.as_deref(), Some("promiseMeCoroutine"));
        assert!(doc.tags[0].doc_type.is_none());
    }

    #[test]
    fn test_multiline_tag_content() {
        let doc = JsDoc::parse(
            r#"/**
             * @deprecated Use something
             *   else instead
             */"#,
        );
        assert_eq!(
            doc.tags[0].description.as_deref(),
            Some("Use something\nelse instead")
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(JsDoc::new().is_empty());
        assert!(!JsDoc::parse("/** hello */").is_empty());
    }
}
