use serde::{Deserialize, Serialize};

use ripple_core::cancel::Cancelled;
use ripple_core::config::ImpactConfig;
use ripple_core::coverage::CoverageError;
use ripple_core::types::{GraphError, LinkStrategy, NodeId};
use ripple_parsers::resolver::ParseFailure;

/// How an impacted test was discovered.
///
/// Declaration order is the tie-break when two paths give the same score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStrategy {
    /// The changed file is the test's own file.
    ChangedTestFile,
    Naming,
    Coverage,
    CallGraph,
    Import,
}

impl ImpactStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactStrategy::ChangedTestFile => "changed_test_file",
            ImpactStrategy::Naming => "naming",
            ImpactStrategy::Coverage => "coverage",
            ImpactStrategy::CallGraph => "call_graph",
            ImpactStrategy::Import => "import",
        }
    }
}

impl From<LinkStrategy> for ImpactStrategy {
    fn from(s: LinkStrategy) -> Self {
        match s {
            LinkStrategy::Naming => ImpactStrategy::Naming,
            LinkStrategy::Coverage => ImpactStrategy::Coverage,
            LinkStrategy::CallGraph => ImpactStrategy::CallGraph,
            LinkStrategy::Import => ImpactStrategy::Import,
        }
    }
}

impl std::fmt::Display for ImpactStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an impact query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactedTest {
    /// Pytest node id.
    pub test_id: String,
    pub name: String,
    pub file_path: String,
    pub score: f64,
    pub strategy: ImpactStrategy,
    /// Reverse CALLS hops between the changed definition and the linked target.
    pub hops: u32,
}

/// Parameters of an impact query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactQuery {
    pub threshold: f64,
    pub max_results: usize,
    pub call_depth: u32,
    pub decay: f64,
}

impl Default for ImpactQuery {
    fn default() -> Self {
        Self::from_config(&ImpactConfig::default())
    }
}

impl ImpactQuery {
    pub fn from_config(config: &ImpactConfig) -> Self {
        Self {
            threshold: config.threshold,
            max_results: config.max_results,
            call_depth: config.call_depth,
            decay: config.decay,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Two or more strategies proposed the same `(test, target)` pair with
/// different confidences. Resolved by the max-confidence merge; kept for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkingAmbiguity {
    pub test: NodeId,
    pub target: NodeId,
    pub chosen: LinkStrategy,
    pub confidence: f64,
    pub alternatives: Vec<(LinkStrategy, f64)>,
}

/// Summary returned by `build_graph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub repo_id: String,
    pub commit_id: String,
    pub generation: u64,
    pub nodes_created: usize,
    pub edges_created: usize,
    pub build_time_ms: u64,
    pub cache_hit: bool,
    pub files_parsed: usize,
    pub files_reused: usize,
    pub partial_files: Vec<ParseFailure>,
    pub unresolved_references: usize,
    pub tests: usize,
}

/// Errors that abort a build. Per-file parse failures never do.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build cancelled")]
    Cancelled,
    #[error("invalid repository {path}: {reason}")]
    InvalidRepo { path: String, reason: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Coverage(#[from] CoverageError),
}

impl From<Cancelled> for BuildError {
    fn from(_: Cancelled) -> Self {
        BuildError::Cancelled
    }
}

/// Malformed impact query input, rejected before touching the snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("changed_files must not be empty")]
    EmptyChangedFiles,
    #[error("threshold {0} must be within [0, 1]")]
    InvalidThreshold(f64),
    #[error("max_results must be at least 1")]
    InvalidMaxResults,
    #[error("query cancelled")]
    Cancelled,
}

impl From<Cancelled> for QueryError {
    fn from(_: Cancelled) -> Self {
        QueryError::Cancelled
    }
}

/// Error from an engine entry point that may both build and query.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Query(#[from] QueryError),
}
