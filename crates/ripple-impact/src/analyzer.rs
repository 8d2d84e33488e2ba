//! Impacted-test queries over a built snapshot.
//!
//! Pure read: the snapshot is only borrowed, so any number of queries may
//! run against the same `Arc<Snapshot>` at once.

use std::collections::{BTreeSet, HashMap, VecDeque};

use ripple_core::cancel::CancellationToken;
use ripple_core::store::GraphStore;
use ripple_core::types::{EdgeDirection, EdgeKind, NodeId, NodeKind};
use ripple_parsers::walker::normalize_rel_path;

use crate::snapshot::Snapshot;
use crate::types::{ImpactQuery, ImpactStrategy, ImpactedTest, QueryError};

#[derive(Debug, Clone, Copy)]
struct Hit {
    score: f64,
    hops: u32,
    strategy: ImpactStrategy,
}

impl Hit {
    fn beats(&self, other: &Hit) -> bool {
        self.score
            .total_cmp(&other.score)
            .then(other.hops.cmp(&self.hops))
            .then(other.strategy.cmp(&self.strategy))
            .is_gt()
    }
}

/// Keep the best discovery path per test.
fn offer(best: &mut HashMap<NodeId, Hit>, test: NodeId, hit: Hit) {
    match best.get(&test) {
        Some(current) if !hit.beats(current) => {}
        _ => {
            best.insert(test, hit);
        }
    }
}

/// Reject malformed input before touching the graph.
pub fn validate(changed_files: &[String], query: &ImpactQuery) -> Result<(), QueryError> {
    if changed_files.is_empty() {
        return Err(QueryError::EmptyChangedFiles);
    }
    if !(0.0..=1.0).contains(&query.threshold) {
        return Err(QueryError::InvalidThreshold(query.threshold));
    }
    if query.max_results == 0 {
        return Err(QueryError::InvalidMaxResults);
    }
    Ok(())
}

/// Tests impacted by `changed_files`, best first.
pub fn impacted_tests(
    snapshot: &Snapshot,
    changed_files: &[String],
    query: &ImpactQuery,
    cancel: &CancellationToken,
) -> Result<Vec<ImpactedTest>, QueryError> {
    validate(changed_files, query)?;
    let _span = tracing::debug_span!(
        "impacted_tests",
        commit = %snapshot.commit_id,
        changed = changed_files.len()
    )
    .entered();

    let graph = &snapshot.graph;
    let paths: BTreeSet<String> = changed_files.iter().map(|p| normalize_rel_path(p)).collect();
    let mut best: HashMap<NodeId, Hit> = HashMap::new();
    let mut changed_nodes: Vec<NodeId> = Vec::new();

    for path in &paths {
        cancel.check()?;
        let Some(file) = graph.file_node(path) else {
            tracing::debug!(file = %path, "changed file not in snapshot");
            continue;
        };
        let owned = graph.nodes_in_file(path);

        if file.is_test_file {
            for test in owned.iter().filter(|n| n.kind == NodeKind::Test) {
                offer(
                    &mut best,
                    test.id,
                    Hit {
                        score: 1.0,
                        hops: 0,
                        strategy: ImpactStrategy::ChangedTestFile,
                    },
                );
            }
        }

        for (test, edge) in graph.neighbors(file.id, EdgeKind::DependsOn, EdgeDirection::Incoming) {
            offer(
                &mut best,
                test,
                Hit {
                    score: edge.confidence,
                    hops: 0,
                    strategy: ImpactStrategy::Coverage,
                },
            );
        }

        changed_nodes.extend(owned.iter().filter(|n| n.kind.is_code()).map(|n| n.id));
    }

    // Multi-source reverse CALLS walk; the first visit is the shortest path,
    // which is also the highest-scoring one.
    let mut depth_of: HashMap<NodeId, u32> = changed_nodes.iter().map(|id| (*id, 0)).collect();
    let mut queue: VecDeque<(NodeId, u32)> = changed_nodes.iter().map(|id| (*id, 0)).collect();
    while let Some((id, depth)) = queue.pop_front() {
        cancel.check()?;
        let decay = query.decay.powi(depth as i32);
        for (test, edge) in graph.neighbors(id, EdgeKind::Tests, EdgeDirection::Incoming) {
            let strategy = edge
                .strategy
                .map(ImpactStrategy::from)
                .unwrap_or(ImpactStrategy::CallGraph);
            offer(
                &mut best,
                test,
                Hit {
                    score: edge.confidence * decay,
                    hops: depth,
                    strategy,
                },
            );
        }
        if depth >= query.call_depth {
            continue;
        }
        for (caller, _) in graph.neighbors(id, EdgeKind::Calls, EdgeDirection::Incoming) {
            let is_code = graph.node(caller).is_some_and(|n| n.kind.is_code());
            if is_code && !depth_of.contains_key(&caller) {
                depth_of.insert(caller, depth + 1);
                queue.push_back((caller, depth + 1));
            }
        }
    }

    let mut results: Vec<ImpactedTest> = best
        .into_iter()
        .filter(|(_, hit)| hit.score >= query.threshold)
        .filter_map(|(id, hit)| {
            let node = graph.node(id)?;
            Some(ImpactedTest {
                test_id: node.test_id(),
                name: node.name.clone(),
                file_path: node.file_path.clone(),
                score: hit.score,
                strategy: hit.strategy,
                hops: hit.hops,
            })
        })
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.test_id.cmp(&b.test_id)));
    results.truncate(query.max_results);

    tracing::debug!(
        changed_nodes = changed_nodes.len(),
        visited = depth_of.len(),
        impacted = results.len(),
        "impact query finished"
    );
    Ok(results)
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
