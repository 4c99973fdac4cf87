//! Structural formatter for configuration blocks
//!
//! Normalizes indentation, aligns `=` of consecutive attributes, collapses
//! blank lines and separates top-level blocks. Comments are preserved.
//!
//! # Example
//!
//! ```
//! use blueprint_core::formatter::{format, FormatConfig};
//!
//! let source = "resource \"test_instance\" \"new\" {\nprovider=othertest\nvalue=null\n}";
//! let config = FormatConfig::default();
//! let formatted = format(source, &config).unwrap();
//!
//! assert!(formatted.contains("  value    = null"));
//! ```

mod config;
mod cst;
mod cst_builder;
mod format;
mod parser;

pub use config::{FormatConfig, Indent};
pub use format::format;
pub use parser::FormatParseError;

pub(crate) use cst::{Cst, CstChild, CstNode, NodeKind, unquote};
pub(crate) use format::parse_cst;
