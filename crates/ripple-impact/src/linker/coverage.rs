use ripple_core::store::GraphStore;
use ripple_core::types::{GraphNode, LinkStrategy, NodeId};

use super::{CandidateEdge, LinkContext, LinkingStrategy};

/// Links every definition a test executed, at the fraction of its span
/// that ran. Inactive without coverage data.
pub struct CoverageStrategy;

impl LinkingStrategy for CoverageStrategy {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::Coverage
    }

    fn candidates(&self, ctx: &LinkContext<'_>) -> Vec<CandidateEdge> {
        let Some(coverage) = ctx.coverage else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for test in ctx.tests() {
            for (file, executed) in coverage.executed_lines(&test.test_id()) {
                for node in ctx.code_nodes(&file) {
                    if node.line_end < node.line_start {
                        continue;
                    }
                    let span = node.line_end.saturating_sub(node.line_start) + 1;
                    let hit = executed.range(node.line_start..=node.line_end).count() as u32;
                    if hit == 0 {
                        continue;
                    }
                    out.push(CandidateEdge {
                        test: test.id,
                        target: node.id,
                        confidence: (f64::from(hit) / f64::from(span)).min(1.0),
                        strategy: LinkStrategy::Coverage,
                    });
                }
            }
        }
        out
    }
}

/// `(test, file node)` for every indexed file a test executed outside its own file.
pub(super) fn file_dependencies<'a>(ctx: &LinkContext<'a>) -> Vec<(&'a GraphNode, NodeId)> {
    let Some(coverage) = ctx.coverage else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for &test in ctx.tests() {
        for file in coverage.executed_lines(&test.test_id()).keys() {
            if *file == test.file_path {
                continue;
            }
            if let Some(node) = ctx.graph.file_node(file) {
                out.push((test, node.id));
            }
        }
    }
    out
}
