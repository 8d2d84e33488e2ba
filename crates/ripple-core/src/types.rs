use serde::{Deserialize, Serialize};

/// Stable node identifier: xxhash64 of `kind|file_path|qualified_name`.
pub type NodeId = u64;

/// Node types in the structural graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Function,
    Class,
    Test,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
            NodeKind::Test => "test",
        }
    }

    /// Functions and classes are the only valid TESTS edge targets.
    pub fn is_code(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Class)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge types between graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Calls,
    Imports,
    Inherits,
    Tests,
    DependsOn,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Calls => "calls",
            EdgeKind::Imports => "imports",
            EdgeKind::Inherits => "inherits",
            EdgeKind::Tests => "tests",
            EdgeKind::DependsOn => "depends_on",
        }
    }

    /// Edges produced by resolving a file's own source text.
    pub const STRUCTURAL: [EdgeKind; 3] = [EdgeKind::Calls, EdgeKind::Imports, EdgeKind::Inherits];

    /// Edges produced by the test linker.
    pub const LINKS: [EdgeKind; 2] = [EdgeKind::Tests, EdgeKind::DependsOn];
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy that produced a TESTS edge.
///
/// Declaration order is merge priority: when two strategies assign the same
/// confidence to a `(test, target)` pair, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStrategy {
    Naming,
    Coverage,
    CallGraph,
    Import,
}

impl LinkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStrategy::Naming => "naming",
            LinkStrategy::Coverage => "coverage",
            LinkStrategy::CallGraph => "call_graph",
            LinkStrategy::Import => "import",
        }
    }

    /// Lower is stronger.
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for LinkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single formal parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<String>,
}

/// A node in the structural graph (file, function, class, or test).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Dotted path inside the file (`Class.method`); the module name for File nodes.
    pub qualified_name: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    #[serde(default)]
    pub params: Vec<Param>,
    pub doc_summary: Option<String>,
    /// Content hash of the file (File nodes only).
    pub content_hash: Option<String>,
    /// Revision the file was last indexed at (File nodes only).
    pub revision: Option<String>,
    /// File was only partially indexed because parsing failed.
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub is_test_file: bool,
    pub generation: u64,
}

impl GraphNode {
    /// Pytest node id for a test (`path/to/test_x.py::TestCls::test_y`).
    pub fn test_id(&self) -> String {
        test_id(&self.file_path, &self.qualified_name)
    }

    /// Identity tuple used to detect id collisions.
    pub fn identity(&self) -> (NodeKind, &str, &str) {
        (self.kind, &self.file_path, &self.qualified_name)
    }
}

/// Build the pytest node id for a test qualified name.
pub fn test_id(file_path: &str, qualified_name: &str) -> String {
    format!("{}::{}", file_path, qualified_name.replace('.', "::"))
}

/// An edge in the structural graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    /// 1.0 for structural facts (CONTAINS, IMPORTS, INHERITS).
    pub confidence: f64,
    pub strategy: Option<LinkStrategy>,
    /// The file whose source produced this edge.
    pub file_path: String,
    pub line: u32,
    pub generation: u64,
}

impl GraphEdge {
    /// A structural edge with full confidence.
    pub fn structural(
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        file_path: &str,
        line: u32,
        generation: u64,
    ) -> Self {
        GraphEdge {
            source,
            target,
            kind,
            confidence: 1.0,
            strategy: None,
            file_path: file_path.to_string(),
            line,
            generation,
        }
    }

    pub fn key(&self) -> (NodeId, NodeId, EdgeKind) {
        (self.source, self.target, self.kind)
    }
}

/// Direction for edge traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    Incoming,
    Outgoing,
}

/// A reference that could not be resolved within the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedRef {
    pub file_path: String,
    pub line: u32,
    /// Qualified name of the definition that made the reference.
    pub from: String,
    pub name: String,
}

/// Errors that can occur during graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Dangling {kind} edge: {source_id} -> {target_id} references a missing node")]
    DanglingEdge {
        source_id: NodeId,
        target_id: NodeId,
        kind: EdgeKind,
    },

    #[error("Node id collision on {id} between '{existing}' and '{new_node}'")]
    IdCollision {
        id: NodeId,
        existing: String,
        new_node: String,
    },

    #[error("Confidence {0} outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for GraphError {
    fn from(e: rusqlite::Error) -> Self {
        GraphError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}
