//! Nested parameter types from dotted tag names
//!
//! `@param {object} obj` and `@param {number} obj.a` become one root `obj`
//! with a child `a`. Children keep the order in which they were first
//! documented.

use indexmap::IndexMap;
use serde::Serialize;

use crate::doctype::DocType;
use crate::reconcile::{Tag, TagKind};

/// One property level of a documented parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTreeNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
    /// Documented with a trailing `=`
    pub optional: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, TypeTreeNode>,
}

impl TypeTreeNode {
    /// Create a typeless node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Renders as an object literal
    pub fn is_object_like(&self) -> bool {
        !self.children.is_empty()
            || self
                .doc_type
                .as_ref()
                .is_some_and(|ty| ty.without_optional().is_object_keyword())
    }

    /// Number of terminal nodes below (a childless node counts itself)
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.values().map(TypeTreeNode::leaf_count).sum()
        }
    }

    /// Levels including this node
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .values()
            .map(TypeTreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    fn assign(&mut self, tag: &Tag) {
        self.doc_type = tag.doc_type.clone();
        self.type_text = if tag.type_text.is_empty() {
            None
        } else {
            Some(tag.type_text.clone())
        };
        self.optional = tag.has_optional_marker();
    }
}

/// Documented parameters of one function, keyed by top-level name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeTree {
    pub roots: IndexMap<String, TypeTreeNode>,
}

impl TypeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the parameter tags of a comment
    ///
    /// Only tags whose first path segment is one of `declared` take part.
    pub fn build<'a, I>(tags: I, declared: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Tag>,
    {
        let mut tree = Self::new();
        for tag in tags {
            if tag.kind != TagKind::Param {
                continue;
            }
            if !declared.iter().any(|name| name == tag.root_name()) {
                tracing::debug!(name = %tag.name, "tag does not match a declared parameter");
                continue;
            }
            tree.insert(tag);
        }
        tree
    }

    /// Insert one tag along its dotted path
    ///
    /// Returns `false` for array-of-object paths (`obj[].a`), which are not
    /// represented.
    pub fn insert(&mut self, tag: &Tag) -> bool {
        let path = tag.path();
        if path.iter().any(|segment| segment.ends_with("[]")) {
            tracing::debug!(name = %tag.name, "skipping array element path");
            return false;
        }
        let Some((root, rest)) = path.split_first() else {
            return false;
        };

        let mut node = self
            .roots
            .entry(root.to_string())
            .or_insert_with(|| TypeTreeNode::new(*root));
        for segment in rest {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| TypeTreeNode::new(*segment));
        }
        node.assign(tag);
        true
    }

    /// Root node for a top-level parameter
    pub fn get(&self, name: &str) -> Option<&TypeTreeNode> {
        self.roots.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::mock_tag;

    fn declared(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_build_nested() {
        let tags = vec![
            mock_tag("param", "object", "obj"),
            mock_tag("param", "number", "obj.c"),
            mock_tag("param", "object", "obj.d"),
            mock_tag("param", "number=", "obj.d.e"),
        ];
        let tree = TypeTree::build(&tags, &declared(&["obj"]));
        let obj = tree.get("obj").unwrap();

        assert_eq!(obj.children.keys().collect::<Vec<_>>(), vec!["c", "d"]);
        assert_eq!(obj.leaf_count(), 2);
        assert_eq!(obj.depth(), 3);
        assert!(obj.children["d"].children["e"].optional);
        assert!(obj.is_object_like());
    }

    #[test]
    fn test_intermediate_nodes_are_typeless() {
        let tags = vec![mock_tag("param", "number", "obj.a.b")];
        let tree = TypeTree::build(&tags, &declared(&["obj"]));
        let obj = tree.get("obj").unwrap();
        assert!(obj.doc_type.is_none());
        assert!(obj.children["a"].doc_type.is_none());
        assert_eq!(obj.depth(), 3);
    }

    #[test]
    fn test_undeclared_root_is_ignored() {
        let tags = vec![
            mock_tag("param", "number", "a"),
            mock_tag("param", "number", "b"),
            mock_tag("returns", "number", ""),
        ];
        let tree = TypeTree::build(&tags, &declared(&["a"]));
        assert_eq!(tree.roots.len(), 1);
        assert!(tree.get("b").is_none());
    }

    #[test]
    fn test_last_tag_wins() {
        let tags = vec![
            mock_tag("param", "number", "a"),
            mock_tag("param", "string", "a"),
        ];
        let tree = TypeTree::build(&tags, &declared(&["a"]));
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.get("a").unwrap().doc_type, Some(DocType::name("string")));
    }

    #[test]
    fn test_array_element_paths_are_skipped() {
        let tags = vec![
            mock_tag("param", "object[]", "obj"),
            mock_tag("param", "number", "obj[].a"),
        ];
        let tree = TypeTree::build(&tags, &declared(&["obj"]));
        let obj = tree.get("obj").unwrap();
        assert!(obj.children.is_empty());
        assert!(!obj.is_object_like());
    }

    #[test]
    fn test_bracket_does_not_make_optional() {
        let mut tag = mock_tag("param", "number", "a");
        tag.optional = true;
        tag.default = Some("1".to_string());
        let tree = TypeTree::build([&tag], &declared(&["a"]));
        assert!(!tree.get("a").unwrap().optional);
    }
}
