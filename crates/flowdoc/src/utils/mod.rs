//! Utilities for flowdoc
//!
//! This module provides utilities for:
//! - SWC/deno_ast JavaScript parsing
//! - Offset and comment conversion

pub mod swc;

pub use swc::{parse_file, parse_source, ParsedModule, SourceInfo};
