//! Structural parsing for ripple.
//!
//! - [`resolver`]: the [`LanguageResolver`](resolver::LanguageResolver) seam and parse output types
//! - [`treesitter`]: thin wrapper over a tree-sitter parser
//! - [`python`]: the Python resolver
//! - [`walker`]: repository file discovery
//! - [`pool`]: parallel parsing with cancellation
//! - [`test_detection`]: test file and test function conventions

pub mod pool;
pub mod python;
pub mod resolver;
pub mod test_detection;
pub mod treesitter;
pub mod walker;
