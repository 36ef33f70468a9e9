//! Text insertions and their application to source text

use serde::{Deserialize, Serialize};

/// Insert `text` at byte `offset` of the original source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationEdit {
    pub offset: usize,
    pub text: String,
}

impl AnnotationEdit {
    /// Create a new edit
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }

    /// Edit inserting `: <annotation>`
    pub fn annotation(offset: usize, annotation: &str) -> Self {
        Self::new(offset, format!(": {annotation}"))
    }
}

/// Apply insertions to `source`
///
/// Edits are applied in offset order; edits sharing an offset keep the order
/// in which they appear in `edits`. Offsets past the end or inside a UTF-8
/// sequence are ignored.
pub fn apply_edits(source: &str, edits: &[AnnotationEdit]) -> String {
    let mut ordered: Vec<&AnnotationEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.offset);

    let extra: usize = ordered.iter().map(|edit| edit.text.len()).sum();
    let mut output = String::with_capacity(source.len() + extra);
    let mut cursor = 0;

    for edit in ordered {
        if !source.is_char_boundary(edit.offset) {
            tracing::debug!(offset = edit.offset, "ignoring edit outside a char boundary");
            continue;
        }
        output.push_str(&source[cursor..edit.offset]);
        output.push_str(&edit.text);
        cursor = edit.offset;
    }
    output.push_str(&source[cursor..]);

    output
}
