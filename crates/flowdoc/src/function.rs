//! Function-like constructs found in a module
//!
//! Function declarations and expressions, arrows, methods, accessors and
//! constructors all carry a parameter list and attached comments, which is
//! everything the annotator needs from the syntax tree.

use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::params::{ParamPattern, SourceRange};

/// Which construct a [`FunctionLike`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionKind {
    Function,
    Arrow,
    Method,
    Getter,
    Setter,
    Constructor,
}

impl FunctionKind {
    /// Whether a return annotation can be written
    pub fn accepts_return_type(self) -> bool {
        !matches!(self, FunctionKind::Constructor | FunctionKind::Setter)
    }
}

/// A function-like node with its parameters and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionLike {
    pub kind: FunctionKind,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,

    /// Range of the whole construct
    pub range: SourceRange,

    /// Parameters in declaration order
    #[serde(default)]
    pub params: Vec<ParamPattern>,

    /// Comments from the node and its syntactic hosts, deduplicated
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Offset after the parameter list's closing `)`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_offset: Option<usize>,

    /// Already declares a return type
    #[serde(default)]
    pub has_return_type: bool,

    /// Arrow with a single parameter written without parentheses
    #[serde(default)]
    pub bare_arrow_param: bool,
}

impl FunctionLike {
    /// Create a new function-like node without parameters
    pub fn new(kind: FunctionKind, range: SourceRange) -> Self {
        Self {
            kind,
            name: None,
            range,
            params: Vec::new(),
            comments: Vec::new(),
            return_offset: None,
            has_return_type: false,
            bare_arrow_param: false,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parameters
    pub fn with_params(mut self, params: Vec<ParamPattern>) -> Self {
        self.params = params;
        self
    }

    /// Add a comment unless one with the same span is already attached
    pub fn push_comment(&mut self, comment: Comment) {
        let seen = self
            .comments
            .iter()
            .any(|c| c.start == comment.start && c.end == comment.end);
        if !seen {
            self.comments.push(comment);
        }
    }

    /// Set the comments, dropping duplicates
    pub fn with_comments(mut self, comments: impl IntoIterator<Item = Comment>) -> Self {
        for comment in comments {
            self.push_comment(comment);
        }
        self
    }

    /// Set where a return annotation goes
    pub fn with_return_offset(mut self, offset: usize) -> Self {
        self.return_offset = Some(offset);
        self
    }

    /// Mark as already declaring a return type
    pub fn with_return_type(mut self) -> Self {
        self.has_return_type = true;
        self
    }

    /// Mark as `a => ...`
    pub fn as_bare_arrow(mut self) -> Self {
        self.bare_arrow_param = true;
        self
    }

    /// Offset for a return annotation, if one may be written
    pub fn return_annotation_offset(&self) -> Option<usize> {
        if self.has_return_type || !self.kind.accepts_return_type() {
            return None;
        }
        self.return_offset
    }

    /// Short description for logs
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("<anonymous {:?}>", self.kind).to_lowercase(),
        }
    }
}
