use ripple_core::store::GraphStore;
use ripple_core::types::{EdgeDirection, EdgeKind, LinkStrategy};

use super::{CandidateEdge, LinkContext, LinkingStrategy, CALL_GRAPH_CONFIDENCE};

/// Everything a test reaches through resolved CALLS within `call_depth` hops.
pub struct CallGraphStrategy;

impl LinkingStrategy for CallGraphStrategy {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::CallGraph
    }

    fn candidates(&self, ctx: &LinkContext<'_>) -> Vec<CandidateEdge> {
        let mut out = Vec::new();
        for test in ctx.tests() {
            let reached = ctx.graph.reachable(
                test.id,
                EdgeKind::Calls,
                EdgeDirection::Outgoing,
                ctx.call_depth,
            );
            for (id, _depth) in reached {
                let is_code = ctx.graph.node(id).is_some_and(|n| n.kind.is_code());
                if is_code {
                    out.push(CandidateEdge {
                        test: test.id,
                        target: id,
                        confidence: CALL_GRAPH_CONFIDENCE,
                        strategy: LinkStrategy::CallGraph,
                    });
                }
            }
        }
        out
    }
}
