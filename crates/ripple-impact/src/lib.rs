//! Graph building and regression-impact analysis for ripple.
//!
//! - [`builder`]: parse, insert, resolve and link one snapshot (full or incremental)
//! - [`resolve`]: best-effort resolution of imports, calls and base classes
//! - [`linker`]: TESTS edges from independent strategies merged by max confidence
//! - [`analyzer`]: ranked impacted tests for a set of changed files
//! - [`engine`]: cached `build_graph` / `get_impacted_tests` entry points

pub mod analyzer;
pub mod builder;
pub mod engine;
pub mod linker;
pub mod resolve;
pub mod snapshot;
pub mod types;
