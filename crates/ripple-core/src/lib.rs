//! Core types, graph storage, and configuration for ripple.
//!
//! This crate provides the foundational data structures used across all ripple crates:
//! - [`types`]: Graph nodes, edges, and error types
//! - [`store`]: The [`GraphStore`](store::GraphStore) trait
//! - [`graph`]: In-memory petgraph-backed implementation of `GraphStore`
//! - [`cache`]: LRU cache of immutable snapshots keyed by `(repo, commit)`
//! - [`sqlite`]: SQLite-backed persistence of serialized snapshots
//! - [`config`]: Configuration loading from `.ripple/ripple.json`
//! - [`hash`]: Deterministic content hashing (base62 of xxhash64)
//! - [`coverage`]: Per-test line coverage input
//! - [`cancel`]: Cooperative cancellation for builds and queries
//! - [`vcs`]: Thin git helpers (HEAD commit, changed files)

pub mod cache;
pub mod cancel;
pub mod config;
pub mod coverage;
pub mod graph;
pub mod hash;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod vcs;
