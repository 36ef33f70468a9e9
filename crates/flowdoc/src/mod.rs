//! flowdoc: JSDoc to Flow annotation converter
//!
//! This crate rewrites JavaScript sources so that the types documented in
//! `@param` and `@returns` tags become inline Flow annotations:
//! - Parsing JavaScript source files using deno_ast/SWC
//! - Reading each attached comment twice (structured and raw punctuation)
//! - Rebuilding nested object types from dotted `@param` paths
//! - Rendering Flow type syntax and inserting it after each parameter
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐
//! │ source (SWC)    │    │ leading comments │
//! │ function nodes  │    │ (dual parse)     │
//! └────────┬────────┘    └────────┬─────────┘
//!          │                      │
//!          │               ┌──────▼───────┐
//!          │               │  Tag / Tree  │
//!          │               └──────┬───────┘
//!          └──────────┬───────────┘
//!                     ▼
//!              ┌──────────────┐
//!              │  Annotator   │
//!              └──────┬───────┘
//!                     ▼
//!              ┌──────────────┐
//!              │ patched text │
//!              └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use flowdoc::{convert_source, ConvertConfig};
//!
//! let source = "/** @param {number} a */\nfunction test(a) {}\n";
//! let conversion = convert_source("/tmp/test.js", source, &ConvertConfig::default()).unwrap();
//! assert_eq!(conversion.output, "/** @param {number} a */\nfunction test(a: number) {}\n");
//! ```

// Comment parsing
pub mod comment;
pub mod doctype;
pub mod js_doc;
pub mod raw_tags;
pub mod reconcile;

// Type reconstruction and rendering
pub mod render;
pub mod type_tree;

// Annotation
pub mod annotator;
pub mod edits;
pub mod function;
pub mod params;

// Parsing and utilities
pub mod config;
pub mod diagnostics;
pub mod parser;
pub mod printer;

// Submodules
pub mod builder;
pub mod utils;

// Re-exports for convenience
pub use annotator::Annotator;
pub use comment::{parse_dual, Comment, CommentKind, DualParse};
pub use config::{ConvertConfig, CONFIG_FILE_NAME};
pub use diagnostics::{Diagnostic, DiagnosticsCollector, FlowdocError, FlowdocResult};
pub use doctype::{DocType, FunctionParam, FunctionType, RecordField};
pub use edits::{apply_edits, AnnotationEdit};
pub use function::{FunctionKind, FunctionLike};
pub use js_doc::{JsDoc, JsDocTag};
pub use params::{ParamPattern, PropPattern, SourceRange};
pub use raw_tags::{RawBlock, RawTag};
pub use reconcile::{reconcile, Tag, TagKind};
pub use render::{render_param, render_returns, render_type};
pub use type_tree::{TypeTree, TypeTreeNode};

// Conversion
pub use parser::{collect_functions, convert_file, convert_source, Conversion};

// Terminal output
pub use printer::ReportPrinter;

// Builder API
pub use builder::{ConvertOutput, Converter, FileReport, FileStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
