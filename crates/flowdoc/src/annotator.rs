//! Per-file annotation run
//!
//! The [`Annotator`] walks the comments attached to each function-like node,
//! dispatches every tag to the fixer for its kind and collects the resulting
//! edits. A comment is consumed once it produced an edit, so a comment
//! attached to several nested nodes only annotates the first one.

use std::collections::HashSet;

use crate::comment::{parse_dual, Comment};
use crate::edits::AnnotationEdit;
use crate::function::FunctionLike;
use crate::params::{annotate_param, declared_names};
use crate::reconcile::{reconcile, Tag, TagKind};
use crate::render::render_returns;
use crate::type_tree::TypeTree;

/// Annotates the function-like nodes of one source file
#[derive(Debug, Clone)]
pub struct Annotator {
    visited: HashSet<Comment>,
    returns: bool,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

/// Edits collected for one function while its comments are processed
#[derive(Default)]
struct FunctionEdits {
    params_done: Vec<bool>,
    params: Vec<AnnotationEdit>,
    returns: Option<AnnotationEdit>,
}

impl Annotator {
    /// Create a new annotator with return annotations enabled
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            returns: true,
        }
    }

    /// Enable or disable `@returns` annotations
    pub fn with_returns(mut self, enabled: bool) -> Self {
        self.returns = enabled;
        self
    }

    /// Number of comments consumed so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Whether a comment was already consumed
    pub fn is_visited(&self, comment: &Comment) -> bool {
        self.visited.contains(comment)
    }

    /// Edits for one function-like node, in emission order
    pub fn annotate(&mut self, function: &FunctionLike) -> Vec<AnnotationEdit> {
        let mut collected = FunctionEdits {
            params_done: vec![false; function.params.len()],
            ..FunctionEdits::default()
        };

        for comment in &function.comments {
            if self.visited.contains(comment) {
                continue;
            }
            let tags = reconcile(parse_dual(comment));
            if self.apply_tags(function, &tags, &mut collected) {
                self.visited.insert(comment.clone());
            } else {
                tracing::debug!(
                    function = %function.display_name(),
                    start = comment.start,
                    "comment produced no edits"
                );
            }
        }

        finish(function, collected)
    }

    /// Run the fixer of every tag; true when any edit was produced
    fn apply_tags(&self, function: &FunctionLike, tags: &[Tag], collected: &mut FunctionEdits) -> bool {
        let param_tags: Vec<&Tag> = tags.iter().filter(|t| t.kind == TagKind::Param).collect();
        let declared = declared_names(&function.params, &param_tags);
        let names: Vec<String> = declared.iter().flatten().cloned().collect();
        let tree = TypeTree::build(param_tags.iter().copied(), &names);

        let mut roots_seen = HashSet::new();
        let mut produced = false;

        for tag in tags {
            match &tag.kind {
                TagKind::Param => {
                    let root = tag.root_name();
                    if !roots_seen.insert(root) {
                        continue;
                    }
                    for (index, param) in function.params.iter().enumerate() {
                        if collected.params_done[index] || declared[index].as_deref() != Some(root) {
                            continue;
                        }
                        if let Some(edit) = annotate_param(param, root, &tree) {
                            collected.params_done[index] = true;
                            collected.params.push(edit);
                            produced = true;
                        }
                    }
                }
                TagKind::Returns => {
                    if !self.returns || collected.returns.is_some() {
                        continue;
                    }
                    let Some(offset) = function.return_annotation_offset() else {
                        continue;
                    };
                    if let Some(rendered) = render_returns(tag) {
                        collected.returns = Some(AnnotationEdit::annotation(offset, &rendered));
                        produced = true;
                    }
                }
                TagKind::Other(_) => {}
            }
        }

        produced
    }
}

/// Order the edits, wrapping a bare arrow parameter in parentheses
fn finish(function: &FunctionLike, collected: FunctionEdits) -> Vec<AnnotationEdit> {
    let FunctionEdits {
        params, returns, ..
    } = collected;
    let mut edits = Vec::with_capacity(params.len() + 3);

    let wrap = function.bare_arrow_param && (!params.is_empty() || returns.is_some());
    match function.params.first() {
        Some(param) if wrap => {
            let range = param.range();
            edits.push(AnnotationEdit::new(range.start, "("));
            edits.extend(params);
            edits.push(AnnotationEdit::new(range.end, ")"));
        }
        _ => edits.extend(params),
    }
    edits.extend(returns);

    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edits::apply_edits;
    use crate::function::FunctionKind;
    use crate::params::{ParamPattern, SourceRange};
    use crate::test::{jsdoc, mock_comment, mock_function, object_pattern};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_annotate_identifier() {
        let comment = mock_comment(&jsdoc(&["@param {number} a", "@returns {string}"]));
        let function = mock_function(vec![ParamPattern::ident("a", 14)], vec![comment.clone()]);

        let mut annotator = Annotator::new();
        let edits = annotator.annotate(&function);
        assert_eq!(
            edits,
            vec![
                AnnotationEdit::new(15, ": number"),
                AnnotationEdit::new(16, ": string"),
            ]
        );
        assert!(annotator.is_visited(&comment));
    }

    #[test]
    fn test_returns_can_be_disabled() {
        let comment = mock_comment(&jsdoc(&["@returns {string}"]));
        let function = mock_function(vec![], vec![comment.clone()]);

        let mut annotator = Annotator::new().with_returns(false);
        assert!(annotator.annotate(&function).is_empty());
        assert!(!annotator.is_visited(&comment));
    }

    #[test]
    fn test_comment_consumed_once() {
        let comment = mock_comment(&jsdoc(&["@param {number} a"]));
        let outer = mock_function(vec![ParamPattern::ident("a", 14)], vec![comment.clone()]);
        let inner = mock_function(vec![ParamPattern::ident("a", 40)], vec![comment]);

        let mut annotator = Annotator::new();
        assert_eq!(annotator.annotate(&outer).len(), 1);
        assert!(annotator.annotate(&inner).is_empty());
        assert_eq!(annotator.visited_count(), 1);
    }

    #[test]
    fn test_unproductive_comment_stays_unvisited() {
        let comment = mock_comment(&jsdoc(&["@param {number} b"]));
        let first = mock_function(vec![ParamPattern::ident("a", 14)], vec![comment.clone()]);
        let second = mock_function(vec![ParamPattern::ident("b", 14)], vec![comment.clone()]);

        let mut annotator = Annotator::new();
        assert!(annotator.annotate(&first).is_empty());
        assert!(!annotator.is_visited(&comment));
        assert_eq!(annotator.annotate(&second).len(), 1);
    }

    #[test]
    fn test_one_edit_per_root() {
        let comment = mock_comment(&jsdoc(&[
            "@param {object} obj",
            "@param {number} obj.a",
            "@param {string} obj.b",
        ]));
        let function = mock_function(vec![ParamPattern::ident("obj", 14)], vec![comment]);
        let edits = Annotator::new().annotate(&function);
        assert_eq!(edits, vec![AnnotationEdit::new(17, ": { a: number, b: string }")]);
    }

    #[test]
    fn test_destructured_params_by_position() {
        let source = "function test({ a }, { b }) {}";
        let comment = mock_comment(&jsdoc(&[
            "@param {object} first",
            "@param {number} first.a",
            "@param {object} second",
            "@param {string=} second.b",
        ]));
        let function = mock_function(
            vec![object_pattern(14, &["a"]), object_pattern(21, &["b"])],
            vec![comment],
        );
        let edits = Annotator::new().with_returns(false).annotate(&function);
        assert_eq!(
            apply_edits(source, &edits),
            "function test({ a }: { a: number }, { b }: { b?: ?string }) {}"
        );
    }

    #[test]
    fn test_bare_arrow_is_wrapped() {
        let source = "const f = a => a;";
        let comment = mock_comment(&jsdoc(&["@param {number} a", "@returns {number}"]));
        let function = FunctionLike::new(FunctionKind::Arrow, SourceRange::new(10, 16))
            .with_params(vec![ParamPattern::ident("a", 10)])
            .with_comments(vec![comment])
            .with_return_offset(11)
            .as_bare_arrow();

        let edits = Annotator::new().annotate(&function);
        assert_eq!(
            apply_edits(source, &edits),
            "const f = (a: number): number => a;"
        );
    }

    #[test]
    fn test_first_comment_wins_per_param() {
        let first = mock_comment(&jsdoc(&["@param {number} a"]));
        let second = crate::test::mock_comment_at(40, &jsdoc(&["@param {string} a"]));
        let function = mock_function(vec![ParamPattern::ident("a", 14)], vec![first, second.clone()]);

        let mut annotator = Annotator::new();
        let edits = annotator.annotate(&function);
        assert_eq!(edits, vec![AnnotationEdit::new(15, ": number")]);
        assert!(!annotator.is_visited(&second));
    }
}
