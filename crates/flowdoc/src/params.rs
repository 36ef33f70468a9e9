//! Parameter patterns and matching them against documented types
//!
//! A [`ParamPattern`] mirrors the syntax of one entry of a parameter list
//! (identifier, destructuring, default, rest) with the byte ranges needed to
//! place an annotation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::edits::AnnotationEdit;
use crate::reconcile::{Tag, TagKind};
use crate::render;
use crate::type_tree::TypeTree;

/// Byte range in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Syntax of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ParamPattern {
    /// `name`
    Ident {
        name: String,
        range: SourceRange,
        #[serde(default)]
        annotated: bool,
    },
    /// `{ a, b: c, d = 1 }`
    Object {
        props: Vec<PropPattern>,
        range: SourceRange,
        #[serde(default)]
        annotated: bool,
    },
    /// `[a, b]`
    Array {
        range: SourceRange,
        #[serde(default)]
        annotated: bool,
    },
    /// `left = default`
    Assign {
        left: Box<ParamPattern>,
        range: SourceRange,
    },
    /// `...arg`
    Rest {
        arg: Box<ParamPattern>,
        range: SourceRange,
        #[serde(default)]
        annotated: bool,
    },
    /// Anything else (expression patterns in invalid code)
    Other { range: SourceRange },
}

/// One property of an object pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropPattern {
    pub key: String,
    /// Nested pattern for `key: pattern`, absent for shorthand `key`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<ParamPattern>,
    /// Written with a default value (`key = 1`, `key: x = 1`)
    #[serde(default)]
    pub has_default: bool,
}

impl PropPattern {
    /// Create a shorthand property
    pub fn shorthand(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            has_default: false,
        }
    }

    /// Mark as defaulted
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Set the nested pattern
    pub fn with_value(mut self, value: ParamPattern) -> Self {
        self.value = Some(value);
        self
    }

    /// Nested pattern with any default wrapper removed
    pub fn pattern(&self) -> Option<&ParamPattern> {
        self.value.as_ref().map(ParamPattern::base)
    }
}

impl ParamPattern {
    /// Create an identifier pattern
    pub fn ident(name: impl Into<String>, start: usize) -> Self {
        let name = name.into();
        let end = start + name.len();
        ParamPattern::Ident {
            name,
            range: SourceRange::new(start, end),
            annotated: false,
        }
    }

    /// Source range of the whole pattern
    pub fn range(&self) -> SourceRange {
        match self {
            ParamPattern::Ident { range, .. }
            | ParamPattern::Object { range, .. }
            | ParamPattern::Array { range, .. }
            | ParamPattern::Assign { range, .. }
            | ParamPattern::Rest { range, .. }
            | ParamPattern::Other { range } => *range,
        }
    }

    /// The pattern under default and rest wrappers
    pub fn base(&self) -> &ParamPattern {
        match self {
            ParamPattern::Assign { left, .. } => left.base(),
            ParamPattern::Rest { arg, .. } => arg.base(),
            other => other,
        }
    }

    /// Written with a default value
    pub fn has_default(&self) -> bool {
        match self {
            ParamPattern::Assign { .. } => true,
            ParamPattern::Rest { arg, .. } => arg.has_default(),
            _ => false,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, ParamPattern::Rest { .. })
    }

    /// Already carries a type annotation
    pub fn is_annotated(&self) -> bool {
        match self {
            ParamPattern::Ident { annotated, .. }
            | ParamPattern::Object { annotated, .. }
            | ParamPattern::Array { annotated, .. } => *annotated,
            ParamPattern::Rest { annotated, arg, .. } => *annotated || arg.is_annotated(),
            ParamPattern::Assign { left, .. } => left.is_annotated(),
            ParamPattern::Other { .. } => false,
        }
    }

    /// Name of an identifier parameter
    pub fn identifier(&self) -> Option<&str> {
        match self.base() {
            ParamPattern::Ident { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Object or array destructuring
    pub fn is_destructured(&self) -> bool {
        matches!(
            self.base(),
            ParamPattern::Object { .. } | ParamPattern::Array { .. }
        )
    }

    /// Offset right after the base pattern, where `: T` goes
    pub fn annotation_offset(&self) -> usize {
        self.base().range().end
    }

    /// Property of an object pattern by key
    pub fn property(&self, key: &str) -> Option<&PropPattern> {
        match self.base() {
            ParamPattern::Object { props, .. } => props.iter().find(|p| p.key == key),
            _ => None,
        }
    }
}

/// Name each parameter is documented under
///
/// Identifier parameters use their own name. The top-level tags left over
/// once identifier names are taken go, in order, to the destructured
/// parameters.
pub fn declared_names(params: &[ParamPattern], tags: &[&Tag]) -> Vec<Option<String>> {
    let identifiers: HashSet<&str> = params.iter().filter_map(ParamPattern::identifier).collect();
    let mut unclaimed = tags
        .iter()
        .filter(|tag| tag.kind == TagKind::Param && tag.is_top_level())
        .map(|tag| tag.name.as_str())
        .filter(|name| !identifiers.contains(name));

    params
        .iter()
        .map(|param| match param.identifier() {
            Some(name) => Some(name.to_string()),
            None if param.is_destructured() => unclaimed.next().map(str::to_string),
            None => None,
        })
        .collect()
}

/// Edit annotating one parameter from the tree, if it is documented
pub fn annotate_param(pattern: &ParamPattern, name: &str, tree: &TypeTree) -> Option<AnnotationEdit> {
    if pattern.is_annotated() {
        tracing::debug!(name, "parameter already annotated");
        return None;
    }
    let node = tree.get(name)?;
    let rendered = render::render_param(node, pattern)?;
    Some(AnnotationEdit::annotation(pattern.annotation_offset(), &rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{mock_tag, object_pattern};

    #[test]
    fn test_base_unwraps_wrappers() {
        let ident = ParamPattern::ident("a", 10);
        let assign = ParamPattern::Assign {
            left: Box::new(ident.clone()),
            range: SourceRange::new(10, 15),
        };
        assert_eq!(assign.base(), &ident);
        assert!(assign.has_default());
        assert_eq!(assign.annotation_offset(), 11);

        let rest = ParamPattern::Rest {
            arg: Box::new(ParamPattern::ident("args", 13)),
            range: SourceRange::new(10, 17),
            annotated: false,
        };
        assert!(rest.is_rest());
        assert_eq!(rest.identifier(), Some("args"));
        assert_eq!(rest.annotation_offset(), 17);
    }

    #[test]
    fn test_declared_names_positional() {
        let params = vec![
            ParamPattern::ident("a", 0),
            object_pattern(3, &["b"]),
            object_pattern(10, &["c"]),
        ];
        let tags = [
            mock_tag("param", "number", "a"),
            mock_tag("param", "object", "first"),
            mock_tag("param", "number", "first.b"),
            mock_tag("param", "object", "second"),
        ];
        let refs: Vec<&Tag> = tags.iter().collect();
        assert_eq!(
            declared_names(&params, &refs),
            vec![
                Some("a".to_string()),
                Some("first".to_string()),
                Some("second".to_string())
            ]
        );
    }

    #[test]
    fn test_declared_names_skips_identifier_names() {
        let params = vec![object_pattern(0, &["b"]), ParamPattern::ident("a", 8)];
        let tags = [mock_tag("param", "number", "a")];
        let refs: Vec<&Tag> = tags.iter().collect();
        assert_eq!(declared_names(&params, &refs), vec![None, Some("a".to_string())]);
    }

    #[test]
    fn test_declared_names_after_identifier_tags() {
        let params = vec![ParamPattern::ident("b", 0), object_pattern(3, &["a"])];
        let tags = [
            mock_tag("param", "object", "obj"),
            mock_tag("param", "number", "obj.a"),
            mock_tag("param", "number", "b"),
        ];
        let refs: Vec<&Tag> = tags.iter().collect();
        assert_eq!(
            declared_names(&params, &refs),
            vec![Some("b".to_string()), Some("obj".to_string())]
        );
    }

    #[test]
    fn test_annotate_param() {
        let tags = [mock_tag("param", "number", "a")];
        let tree = TypeTree::build(&tags, &["a".to_string()]);
        let edit = annotate_param(&ParamPattern::ident("a", 14), "a", &tree).unwrap();
        assert_eq!(edit, AnnotationEdit::new(15, ": number"));
    }

    #[test]
    fn test_annotated_param_is_skipped() {
        let tags = [mock_tag("param", "number", "a")];
        let tree = TypeTree::build(&tags, &["a".to_string()]);
        let pattern = ParamPattern::Ident {
            name: "a".to_string(),
            range: SourceRange::new(0, 1),
            annotated: true,
        };
        assert!(annotate_param(&pattern, "a", &tree).is_none());
    }
}
