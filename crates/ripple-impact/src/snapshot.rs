use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ripple_core::graph::CodeGraph;
use ripple_core::store::GraphStore;
use ripple_core::types::{NodeKind, UnresolvedRef};
use ripple_parsers::resolver::{ParseFailure, ParsedFile};

use crate::types::LinkingAmbiguity;

/// Per-file state kept so the next build can reuse unchanged parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub content_hash: Option<String>,
    pub parsed: Option<ParsedFile>,
    pub failure: Option<ParseFailure>,
}

impl FileRecord {
    pub fn parsed(parsed: ParsedFile) -> Self {
        Self {
            content_hash: Some(parsed.content_hash.clone()),
            parsed: Some(parsed),
            failure: None,
        }
    }

    pub fn failed(failure: ParseFailure, content_hash: Option<String>) -> Self {
        Self {
            content_hash,
            parsed: None,
            failure: Some(failure),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }
}

/// Counters describing how a snapshot was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub files_parsed: usize,
    pub files_reused: usize,
    pub dropped_references: usize,
    pub build_time_ms: u64,
    pub incremental: bool,
}

/// The immutable graph of one repository at one commit.
///
/// Built once, then only read. Shared as `Arc<Snapshot>`; a rebuild for a
/// later commit patches a clone and never touches a published snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub repo_id: String,
    pub commit_id: String,
    pub generation: u64,
    pub graph: CodeGraph,
    pub files: BTreeMap<String, FileRecord>,
    pub unresolved: Vec<UnresolvedRef>,
    pub ambiguities: Vec<LinkingAmbiguity>,
    pub stats: BuildStats,
}

impl Snapshot {
    /// Files that failed to parse, in path order.
    pub fn partial_files(&self) -> Vec<&ParseFailure> {
        self.files
            .values()
            .filter_map(|r| r.failure.as_ref())
            .collect()
    }

    pub fn parsed_file(&self, file_path: &str) -> Option<&ParsedFile> {
        self.files.get(file_path)?.parsed.as_ref()
    }

    pub fn contains_file(&self, file_path: &str) -> bool {
        self.files.contains_key(file_path)
    }

    pub fn test_count(&self) -> usize {
        self.graph.nodes_of_kind(NodeKind::Test).count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
