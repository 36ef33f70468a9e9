//! Builder API for flowdoc
//!
//! This module provides the main builder API for converting JavaScript
//! files and directories. It is what the `flowdoc` binary drives.

mod converter;

pub use converter::{ConvertOutput, Converter, FileReport, FileStatus};
