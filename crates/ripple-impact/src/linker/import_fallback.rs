use std::collections::HashSet;

use ripple_core::types::{LinkStrategy, NodeId};

use super::{CandidateEdge, LinkContext, LinkingStrategy, IMPORT_CONFIDENCE};

/// Last resort for tests no other strategy linked: every definition in
/// the modules the test file imports.
pub struct ImportFallback {
    linked: HashSet<NodeId>,
}

impl ImportFallback {
    /// `linked` holds the tests that already have a candidate.
    pub fn new(linked: HashSet<NodeId>) -> Self {
        Self { linked }
    }
}

impl LinkingStrategy for ImportFallback {
    fn strategy(&self) -> LinkStrategy {
        LinkStrategy::Import
    }

    fn candidates(&self, ctx: &LinkContext<'_>) -> Vec<CandidateEdge> {
        let mut out = Vec::new();
        for test in ctx.tests() {
            if self.linked.contains(&test.id) {
                continue;
            }
            for file in ctx.imported_files(&test.file_path) {
                for node in ctx.code_nodes(file) {
                    out.push(CandidateEdge {
                        test: test.id,
                        target: node.id,
                        confidence: IMPORT_CONFIDENCE,
                        strategy: LinkStrategy::Import,
                    });
                }
            }
        }
        out
    }
}
