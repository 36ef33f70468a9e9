//! SWC/deno_ast JavaScript parsing utilities
//!
//! This module provides utilities for parsing JavaScript (and TypeScript)
//! files using deno_ast (which wraps SWC). It handles:
//! - Parsing source text into a module
//! - Collecting comments in a form independent of SWC
//! - Converting SWC positions to byte offsets and line/column pairs

use crate::comment::Comment;
use crate::diagnostics::{FlowdocError, FlowdocResult};
use crate::params::SourceRange;
use deno_ast::swc::ast as swc_ast;
use deno_ast::swc::common::comments::{Comment as SwcComment, CommentKind};
use deno_ast::swc::common::{BytePos, Span};
use deno_ast::{
    MediaType, ParseDiagnostic, ParseParams, ParsedSource, SourcePos, SourceTextInfo, StartSourcePos,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

lazy_static! {
    /// Flow nullable prefix right after an annotation colon
    static ref NULLABLE_PREFIX: Regex = Regex::new(r":(\s*)\?").unwrap();
}

/// Information about the source file
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// The file path
    pub path: PathBuf,
    /// The source text
    pub text: Arc<str>,
    /// Source text info for location lookups
    pub text_info: SourceTextInfo,
}

impl SourceInfo {
    /// Create source info from a file path and content
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        let text: Arc<str> = text.into();
        let text_info = SourceTextInfo::new(text.clone());
        Self {
            path: path.into(),
            text,
            text_info,
        }
    }

    /// Get the source text as a string slice
    pub fn source_text(&self) -> &str {
        &self.text
    }

    /// Convert an SWC position to a byte offset into the text
    pub fn byte_index(&self, pos: BytePos) -> usize {
        // SWC positions handed out by deno_ast are offset by the start pos
        SourcePos::unsafely_from_byte_pos(pos).as_byte_index(StartSourcePos::START_SOURCE_POS)
    }

    /// Convert a span to a byte range
    pub fn range(&self, span: Span) -> SourceRange {
        SourceRange::new(self.byte_index(span.lo), self.byte_index(span.hi))
    }

    /// Extract source text for a span
    pub fn text_for_span(&self, span: Span) -> &str {
        let range = self.range(span);
        let end = range.end.min(self.text.len());
        self.text.get(range.start.min(end)..end).unwrap_or_default()
    }
}

/// A parsed module with source information
#[derive(Debug)]
pub struct ParsedModule {
    /// The parsed source from deno_ast
    pub source: ParsedSource,
    /// Source information for location lookups
    pub source_info: SourceInfo,
}

impl ParsedModule {
    /// Get the program AST as a reference
    pub fn program_ref(&self) -> deno_ast::ProgramRef<'_> {
        self.source.program_ref()
    }

    /// Get the source text
    pub fn source_text(&self) -> &str {
        self.source_info.source_text()
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.source_info.path
    }

    /// Convert a span to a byte range
    pub fn range(&self, span: Span) -> SourceRange {
        self.source_info.range(span)
    }

    /// Convert an SWC position to a byte offset
    pub fn byte_index(&self, pos: BytePos) -> usize {
        self.source_info.byte_index(pos)
    }

    /// Extract source text for a span
    pub fn text_for_span(&self, span: Span) -> &str {
        self.source_info.text_for_span(span)
    }

    /// Get leading comments for a position
    pub fn leading_comments(&self, pos: BytePos) -> Vec<Comment> {
        let source_pos = SourcePos::unsafely_from_byte_pos(pos);
        self.source
            .comments()
            .get_leading(source_pos)
            .map(|comments| comments.iter().map(|c| self.to_comment(c)).collect())
            .unwrap_or_default()
    }

    fn to_comment(&self, comment: &SwcComment) -> Comment {
        let range = self.range(comment.span);
        // read from the original text, which may differ from what was parsed
        let value_end = match comment.kind {
            CommentKind::Block => range.end.saturating_sub(2),
            CommentKind::Line => range.end,
        };
        let text = self
            .source_text()
            .get(range.start + 2..value_end)
            .map(str::to_string)
            .unwrap_or_else(|| comment.text.to_string());
        match comment.kind {
            CommentKind::Block => Comment::block(range.start, range.end, text),
            CommentKind::Line => Comment::line(range.start, range.end, text),
        }
    }
}

/// Parse a source file from disk
pub fn parse_file(path: impl AsRef<Path>) -> FlowdocResult<ParsedModule> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FlowdocError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| {
        FlowdocError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;

    parse_source(path, text)
}

/// Parse JavaScript or TypeScript source code from a string
///
/// The dialect follows the file extension. Relative paths are resolved
/// against the working directory for the module specifier only.
pub fn parse_source(path: impl AsRef<Path>, source: impl Into<Arc<str>>) -> FlowdocResult<ParsedModule> {
    let path = path.as_ref();
    let source: Arc<str> = source.into();

    // Determine media type from extension
    let media_type = MediaType::from_path(path);

    // deno_ast requires absolute paths for file specifiers
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let specifier = deno_ast::ModuleSpecifier::from_file_path(&absolute)
        .map_err(|_| FlowdocError::InvalidPath(path.display().to_string()))?;

    let source_info = SourceInfo::new(path, source.clone());
    let parsed = match parse_with(&specifier, &source, media_type) {
        Ok(parsed) => parsed,
        // Sources annotated by an earlier run only parse with type syntax
        Err(error) if is_plain_javascript(media_type) => {
            let typed = if media_type == MediaType::Jsx {
                MediaType::Tsx
            } else {
                MediaType::TypeScript
            };
            tracing::debug!(path = %path.display(), "retrying parse with type syntax");
            let typed_source: Arc<str> = mask_nullable_prefixes(&source).into();
            parse_with(&specifier, &typed_source, typed)
                .map_err(|_| parse_error(&source_info, &error))?
        }
        Err(error) => return Err(parse_error(&source_info, &error)),
    };

    Ok(ParsedModule {
        source: parsed,
        source_info,
    })
}

fn parse_with(
    specifier: &deno_ast::ModuleSpecifier,
    source: &Arc<str>,
    media_type: MediaType,
) -> Result<ParsedSource, ParseDiagnostic> {
    deno_ast::parse_module(ParseParams {
        specifier: specifier.clone(),
        text: source.clone(),
        media_type,
        capture_tokens: false,
        scope_analysis: false,
        maybe_syntax: None,
    })
}

/// Blank out Flow `?T` prefixes so the text parses as TypeScript
///
/// Each `?` becomes a space, so every byte offset stays valid against the
/// original text.
fn mask_nullable_prefixes(source: &str) -> String {
    NULLABLE_PREFIX.replace_all(source, ":${1} ").into_owned()
}

fn is_plain_javascript(media_type: MediaType) -> bool {
    matches!(
        media_type,
        MediaType::JavaScript | MediaType::Jsx | MediaType::Mjs | MediaType::Cjs
    )
}

fn parse_error(info: &SourceInfo, error: &ParseDiagnostic) -> FlowdocError {
    let position = info.text_info.line_and_column_index(error.range().start);
    FlowdocError::parse_at(
        &info.path,
        error.to_string(),
        position.line_index + 1,
        position.column_index,
    )
}

/// Helper to convert Wtf8Atom to String
fn wtf8_to_string(s: &swc_ast::Str) -> String {
    // Wtf8Atom stores WTF-8 encoded data which is a superset of UTF-8
    String::from_utf8_lossy(s.value.as_bytes()).into_owned()
}

/// Get the name of a property key
pub fn prop_name_str(name: &swc_ast::PropName) -> Option<String> {
    match name {
        swc_ast::PropName::Ident(i) => Some(i.sym.to_string()),
        swc_ast::PropName::Str(s) => Some(wtf8_to_string(s)),
        swc_ast::PropName::Num(n) => Some(n.value.to_string()),
        swc_ast::PropName::BigInt(b) => Some(b.value.to_string()),
        swc_ast::PropName::Computed(_) => None, // Can't statically determine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let source = r#"
            /**
             * Reads a file as text
             * @param {string} path - The file path
             */
            export function readTextFile(path) {
                return "";
            }
        "#;

        // deno_ast requires absolute paths for file specifiers
        let parsed = parse_source("/tmp/test.js", source).unwrap();
        assert!(matches!(parsed.program_ref(), deno_ast::ProgramRef::Module(m) if !m.body.is_empty()));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_source("/tmp/test.js", "function (").unwrap_err();
        assert!(matches!(err, FlowdocError::Parse { line: Some(1), .. }));
    }

    #[test]
    fn test_leading_comment_offsets() {
        let source = "/** @param {number} a */\nfunction test(a) {}\n";
        let parsed = parse_source("/tmp/test.js", source).unwrap();

        let deno_ast::ProgramRef::Module(module) = parsed.program_ref() else {
            panic!("expected a module");
        };
        let item = module.body.first().unwrap();
        let span = deno_ast::swc::common::Spanned::span(item);

        assert_eq!(parsed.byte_index(span.lo), 25);
        assert_eq!(parsed.text_for_span(span), "function test(a) {}");

        let comments = parsed.leading_comments(span.lo);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].start, 0);
        assert_eq!(comments[0].end, 24);
        assert_eq!(comments[0].text, "* @param {number} a ");
    }

    #[test]
    fn test_annotated_javascript_reparses() {
        let parsed = parse_source("/tmp/test.js", "function test(a: number): string {}\n").unwrap();
        assert!(matches!(parsed.program_ref(), deno_ast::ProgramRef::Module(m) if m.body.len() == 1));
    }

    #[test]
    fn test_flow_nullable_annotations_reparse() {
        let source = "/** @param {number=} a */\nfunction test(a: ?number, o: { c?: ?(number | string) }) {}\n";
        let parsed = parse_source("/tmp/test.js", source).unwrap();
        assert_eq!(parsed.source_text(), source);

        let deno_ast::ProgramRef::Module(module) = parsed.program_ref() else {
            panic!("expected a module");
        };
        let span = deno_ast::swc::common::Spanned::span(module.body.first().unwrap());
        let comments = parsed.leading_comments(span.lo);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "* @param {number=} a ");
    }

    #[test]
    fn test_mask_nullable_prefixes() {
        let source = "function f(a: ?number, b?: ?(x | y)) {}";
        let masked = mask_nullable_prefixes(source);
        assert_eq!(masked, "function f(a:  number, b?:  (x | y)) {}");
        assert_eq!(masked.len(), source.len());
    }

    #[test]
    fn test_missing_file() {
        let err = parse_file("/tmp/flowdoc-does-not-exist.js").unwrap_err();
        assert!(matches!(err, FlowdocError::FileNotFound(_)));
    }
}
