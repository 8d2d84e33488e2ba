//! Test linking: TESTS edges from independent strategies.
//!
//! Every strategy is a pure function of the graph (plus optional coverage)
//! returning candidate edges. Candidates are merged per `(test, target)`
//! pair by maximum confidence, strategy priority breaking ties, so the
//! outcome never depends on the order strategies run in.

mod call_graph;
mod coverage;
mod import_fallback;
mod naming;

use std::collections::{BTreeMap, HashSet};

use ripple_core::config::LinkerConfig;
use ripple_core::coverage::CoverageData;
use ripple_core::graph::CodeGraph;
use ripple_core::store::GraphStore;
use ripple_core::types::{
    EdgeDirection, EdgeKind, GraphEdge, GraphNode, LinkStrategy, NodeId, NodeKind,
};

use crate::types::LinkingAmbiguity;

pub use call_graph::CallGraphStrategy;
pub use coverage::CoverageStrategy;
pub use import_fallback::ImportFallback;
pub use naming::NamingStrategy;

pub const NAMING_CONFIDENCE: f64 = 1.0;
pub const CALL_GRAPH_CONFIDENCE: f64 = 0.7;
pub const IMPORT_CONFIDENCE: f64 = 0.5;
/// Confidence of a coverage-derived DEPENDS_ON edge (test -> executed file).
pub const DEPENDS_ON_CONFIDENCE: f64 = 0.5;

/// A proposed TESTS edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEdge {
    pub test: NodeId,
    pub target: NodeId,
    pub confidence: f64,
    pub strategy: LinkStrategy,
}

/// Read-only view handed to every strategy.
pub struct LinkContext<'a> {
    pub graph: &'a CodeGraph,
    pub coverage: Option<&'a CoverageData>,
    pub call_depth: u32,
    tests: Vec<&'a GraphNode>,
}

impl<'a> LinkContext<'a> {
    pub fn new(graph: &'a CodeGraph, coverage: Option<&'a CoverageData>, call_depth: u32) -> Self {
        let mut tests: Vec<&GraphNode> = graph.nodes_of_kind(NodeKind::Test).collect();
        tests.sort_by(|a, b| (&a.file_path, a.line_start).cmp(&(&b.file_path, b.line_start)));
        Self {
            graph,
            coverage,
            call_depth,
            tests,
        }
    }

    /// Test nodes in (file, line) order.
    pub fn tests(&self) -> &[&'a GraphNode] {
        &self.tests
    }

    /// Files imported by `file_path`, through resolved IMPORTS edges.
    pub fn imported_files(&self, file_path: &str) -> Vec<&'a str> {
        let graph = self.graph;
        let Some(file) = graph.file_node(file_path) else {
            return Vec::new();
        };
        graph
            .neighbors(file.id, EdgeKind::Imports, EdgeDirection::Outgoing)
            .into_iter()
            .filter_map(|(id, _)| graph.node(id))
            .map(|node| node.file_path.as_str())
            .collect()
    }

    /// The code file a test file is named after. `test_<m>.py` and
    /// `<m>_test.py` map to `<m>.py` (or package `<m>/__init__.py`) in the
    /// same directory, else to the only non-test `<m>.py` in the graph.
    pub fn subject_file(&self, test_file: &str) -> Option<&'a str> {
        let graph = self.graph;
        let (dir, name) = match test_file.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, test_file),
        };
        let stem = name.strip_suffix(".py")?;
        let subject = stem
            .strip_prefix("test_")
            .or_else(|| stem.strip_suffix("_test"))
            .filter(|s| !s.is_empty())?;

        let beside = |file: String| match dir {
            Some(dir) => format!("{dir}/{file}"),
            None => file,
        };
        for path in [
            beside(format!("{subject}.py")),
            beside(format!("{subject}/__init__.py")),
        ] {
            if let Some(node) = graph.file_node(&path).filter(|n| !n.is_test_file) {
                return Some(node.file_path.as_str());
            }
        }

        let module_file = format!("{subject}.py");
        let nested = format!("/{module_file}");
        let mut found = graph
            .nodes_of_kind(NodeKind::File)
            .filter(|n| !n.is_test_file)
            .filter(|n| n.file_path == module_file || n.file_path.ends_with(&nested));
        match (found.next(), found.next()) {
            (Some(only), None) => Some(only.file_path.as_str()),
            _ => None,
        }
    }

    /// Function and class nodes of a file.
    pub fn code_nodes(&self, file_path: &str) -> Vec<&'a GraphNode> {
        let graph = self.graph;
        graph
            .nodes_in_file(file_path)
            .into_iter()
            .filter(|n| n.kind.is_code())
            .collect()
    }
}

pub trait LinkingStrategy {
    fn strategy(&self) -> LinkStrategy;

    fn candidates(&self, ctx: &LinkContext<'_>) -> Vec<CandidateEdge>;
}

/// Edges produced by one linking pass.
#[derive(Debug, Default)]
pub struct LinkOutcome {
    pub edges: Vec<GraphEdge>,
    pub ambiguities: Vec<LinkingAmbiguity>,
}

/// Run every strategy over the graph and merge the results.
pub fn link(
    graph: &CodeGraph,
    coverage: Option<&CoverageData>,
    config: &LinkerConfig,
    generation: u64,
) -> LinkOutcome {
    let ctx = LinkContext::new(graph, coverage, config.call_depth);
    let strategies: [&dyn LinkingStrategy; 3] =
        [&NamingStrategy, &CoverageStrategy, &CallGraphStrategy];

    let mut candidates = Vec::new();
    for strategy in strategies {
        let found = strategy.candidates(&ctx);
        tracing::debug!(
            strategy = %strategy.strategy(),
            candidates = found.len(),
            "linking strategy finished"
        );
        candidates.extend(found);
    }

    let linked: HashSet<NodeId> = candidates.iter().map(|c| c.test).collect();
    let fallback = ImportFallback::new(linked).candidates(&ctx);
    tracing::debug!(candidates = fallback.len(), "import fallback finished");
    candidates.extend(fallback);

    let (merged, ambiguities) = merge(candidates);

    let mut edges: Vec<GraphEdge> = merged
        .into_iter()
        .filter_map(|c| {
            let test = graph.node(c.test)?;
            Some(GraphEdge {
                source: c.test,
                target: c.target,
                kind: EdgeKind::Tests,
                confidence: c.confidence,
                strategy: Some(c.strategy),
                file_path: test.file_path.clone(),
                line: test.line_start,
                generation,
            })
        })
        .collect();

    for (test, file) in coverage::file_dependencies(&ctx) {
        edges.push(GraphEdge {
            source: test.id,
            target: file,
            kind: EdgeKind::DependsOn,
            confidence: DEPENDS_ON_CONFIDENCE,
            strategy: Some(LinkStrategy::Coverage),
            file_path: test.file_path.clone(),
            line: test.line_start,
            generation,
        });
    }

    LinkOutcome { edges, ambiguities }
}

/// Max-confidence reducer over candidate edges.
///
/// Returns one edge per `(test, target)` pair, in pair order, and an
/// ambiguity record for every pair where strategies disagreed.
pub fn merge(candidates: Vec<CandidateEdge>) -> (Vec<CandidateEdge>, Vec<LinkingAmbiguity>) {
    let mut grouped: BTreeMap<(NodeId, NodeId), Vec<CandidateEdge>> = BTreeMap::new();
    for candidate in candidates {
        grouped
            .entry((candidate.test, candidate.target))
            .or_default()
            .push(candidate);
    }

    let mut merged = Vec::with_capacity(grouped.len());
    let mut ambiguities = Vec::new();
    for ((test, target), group) in grouped {
        let mut best_by_strategy: BTreeMap<LinkStrategy, f64> = BTreeMap::new();
        for c in &group {
            let slot = best_by_strategy.entry(c.strategy).or_insert(c.confidence);
            *slot = slot.max(c.confidence);
        }
        let Some((strategy, confidence)) = best_by_strategy
            .iter()
            .map(|(s, c)| (*s, *c))
            .min_by(|a, b| b.1.total_cmp(&a.1).then(a.0.priority().cmp(&b.0.priority())))
        else {
            continue;
        };

        if best_by_strategy.values().any(|c| *c != confidence) {
            let alternatives: Vec<(LinkStrategy, f64)> = best_by_strategy
                .iter()
                .filter(|(s, _)| **s != strategy)
                .map(|(s, c)| (*s, *c))
                .collect();
            tracing::debug!(
                test,
                target,
                chosen = %strategy,
                confidence,
                ?alternatives,
                "linking strategies disagree"
            );
            ambiguities.push(LinkingAmbiguity {
                test,
                target,
                chosen: strategy,
                confidence,
                alternatives,
            });
        }

        merged.push(CandidateEdge {
            test,
            target,
            confidence,
            strategy,
        });
    }
    (merged, ambiguities)
}
