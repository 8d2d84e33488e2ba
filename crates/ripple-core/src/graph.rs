//! In-memory graph backing every snapshot.
//!
//! Built on a `StableDiGraph` so removing a file's subgraph during an
//! incremental rebuild leaves every other index valid. Cloning the graph is
//! the copy-on-write step: a rebuild patches a clone while readers keep the
//! previous snapshot.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::store::GraphStore;
use crate::types::{EdgeDirection, EdgeKind, GraphEdge, GraphError, GraphNode, NodeId, NodeKind};

type EdgeKey = (NodeId, NodeId, EdgeKind);

/// Petgraph-backed implementation of [`GraphStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphData", try_from = "GraphData")]
pub struct CodeGraph {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    ids: HashMap<NodeId, NodeIndex>,
    files: HashMap<String, BTreeSet<NodeId>>,
    edge_keys: HashMap<EdgeKey, EdgeIndex>,
}

/// Flat, order-stable form of a graph used for persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Every edge, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights().filter(move |n| n.kind == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights().filter(move |e| e.kind == kind)
    }

    /// Paths of every file that owns at least one node.
    pub fn file_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.ids.contains_key(&id)
    }

    /// Look up an edge by its endpoints and kind.
    pub fn edge(&self, source: NodeId, target: NodeId, kind: EdgeKind) -> Option<&GraphEdge> {
        self.edge_keys
            .get(&(source, target, kind))
            .and_then(|&ix| self.graph.edge_weight(ix))
    }

    pub fn to_data(&self) -> GraphData {
        let mut nodes: Vec<GraphNode> = self.graph.node_weights().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        let mut edges: Vec<GraphEdge> = self.graph.edge_weights().cloned().collect();
        edges.sort_by_key(|e| e.key());
        GraphData { nodes, edges }
    }

    /// Remove an edge by index, keeping the key map in sync.
    fn drop_edge(&mut self, ix: EdgeIndex) {
        if let Some(edge) = self.graph.remove_edge(ix) {
            self.edge_keys.remove(&edge.key());
        }
    }

    fn remove_edges_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&GraphEdge) -> bool,
    {
        let doomed: Vec<EdgeIndex> = self
            .graph
            .edge_indices()
            .filter(|&ix| self.graph.edge_weight(ix).is_some_and(&pred))
            .collect();
        let count = doomed.len();
        for ix in doomed {
            self.drop_edge(ix);
        }
        count
    }

    fn describe(node: &GraphNode) -> String {
        format!("{} {}::{}", node.kind, node.file_path, node.qualified_name)
    }
}

impl GraphStore for CodeGraph {
    fn insert_nodes(&mut self, nodes: Vec<GraphNode>) -> Result<usize, GraphError> {
        let mut batch: HashMap<NodeId, &GraphNode> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            let existing = self
                .ids
                .get(&node.id)
                .map(|&ix| &self.graph[ix])
                .or_else(|| batch.get(&node.id).copied());
            if let Some(existing) = existing {
                if existing.identity() != node.identity() {
                    return Err(GraphError::IdCollision {
                        id: node.id,
                        existing: Self::describe(existing),
                        new_node: Self::describe(node),
                    });
                }
            }
            batch.insert(node.id, node);
        }

        let count = nodes.len();
        for node in nodes {
            let id = node.id;
            match self.ids.get(&id) {
                Some(&ix) => self.graph[ix] = node,
                None => {
                    self.files
                        .entry(node.file_path.clone())
                        .or_default()
                        .insert(id);
                    let ix = self.graph.add_node(node);
                    self.ids.insert(id, ix);
                }
            }
        }
        Ok(count)
    }

    fn insert_edges(&mut self, edges: Vec<GraphEdge>) -> Result<usize, GraphError> {
        for edge in &edges {
            if !(0.0..=1.0).contains(&edge.confidence) {
                return Err(GraphError::InvalidConfidence(edge.confidence));
            }
            if !self.ids.contains_key(&edge.source) || !self.ids.contains_key(&edge.target) {
                return Err(GraphError::DanglingEdge {
                    source_id: edge.source,
                    target_id: edge.target,
                    kind: edge.kind,
                });
            }
        }

        let mut added = 0;
        for edge in edges {
            let key = edge.key();
            if let Some(&ix) = self.edge_keys.get(&key) {
                if let Some(existing) = self.graph.edge_weight_mut(ix) {
                    if edge.confidence > existing.confidence {
                        *existing = edge;
                    }
                }
                continue;
            }
            let (src, dst) = (self.ids[&edge.source], self.ids[&edge.target]);
            let ix = self.graph.add_edge(src, dst, edge);
            self.edge_keys.insert(key, ix);
            added += 1;
        }
        Ok(added)
    }

    fn remove_subgraph(&mut self, file_path: &str) -> usize {
        let Some(owned) = self.files.remove(file_path) else {
            return 0;
        };
        let mut removed = 0;
        for id in owned {
            let Some(ix) = self.ids.remove(&id) else {
                continue;
            };
            let incident: Vec<EdgeIndex> = self
                .graph
                .edges_directed(ix, Direction::Outgoing)
                .chain(self.graph.edges_directed(ix, Direction::Incoming))
                .map(|e| e.id())
                .collect();
            for edge_ix in incident {
                self.drop_edge(edge_ix);
            }
            self.graph.remove_node(ix);
            removed += 1;
        }
        removed
    }

    fn remove_edges_from_file(&mut self, file_path: &str, kinds: &[EdgeKind]) -> usize {
        self.remove_edges_where(|e| e.file_path == file_path && kinds.contains(&e.kind))
    }

    fn remove_edges_of_kind(&mut self, kinds: &[EdgeKind]) -> usize {
        self.remove_edges_where(|e| kinds.contains(&e.kind))
    }

    fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.ids.get(&id).map(|&ix| &self.graph[ix])
    }

    fn file_node(&self, file_path: &str) -> Option<&GraphNode> {
        self.files
            .get(file_path)?
            .iter()
            .filter_map(|id| self.node(*id))
            .find(|n| n.kind == NodeKind::File)
    }

    fn nodes_in_file(&self, file_path: &str) -> Vec<&GraphNode> {
        let Some(owned) = self.files.get(file_path) else {
            return vec![];
        };
        let mut nodes: Vec<&GraphNode> = owned.iter().filter_map(|id| self.node(*id)).collect();
        nodes.sort_by(|a, b| {
            (a.line_start, &a.qualified_name).cmp(&(b.line_start, &b.qualified_name))
        });
        nodes
    }

    fn neighbors(
        &self,
        id: NodeId,
        kind: EdgeKind,
        direction: EdgeDirection,
    ) -> Vec<(NodeId, &GraphEdge)> {
        let Some(&ix) = self.ids.get(&id) else {
            return vec![];
        };
        let dir = match direction {
            EdgeDirection::Outgoing => Direction::Outgoing,
            EdgeDirection::Incoming => Direction::Incoming,
        };
        let mut out: Vec<(NodeId, &GraphEdge)> = self
            .graph
            .edges_directed(ix, dir)
            .map(|e| e.weight())
            .filter(|w| w.kind == kind)
            .map(|w| match direction {
                EdgeDirection::Outgoing => (w.target, w),
                EdgeDirection::Incoming => (w.source, w),
            })
            .collect();
        out.sort_by_key(|(other, _)| *other);
        out
    }

    fn reachable(
        &self,
        id: NodeId,
        kind: EdgeKind,
        direction: EdgeDirection,
        max_depth: u32,
    ) -> Vec<(NodeId, u32)> {
        let mut seen: HashSet<NodeId> = HashSet::from([id]);
        let mut queue: VecDeque<(NodeId, u32)> = VecDeque::from([(id, 0)]);
        let mut out = Vec::new();
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for (next, _) in self.neighbors(current, kind, direction) {
                if seen.insert(next) {
                    out.push((next, depth + 1));
                    queue.push_back((next, depth + 1));
                }
            }
        }
        out
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl From<CodeGraph> for GraphData {
    fn from(graph: CodeGraph) -> Self {
        graph.to_data()
    }
}

impl TryFrom<GraphData> for CodeGraph {
    type Error = GraphError;

    fn try_from(data: GraphData) -> Result<Self, Self::Error> {
        let mut graph = CodeGraph::new();
        graph.insert_nodes(data.nodes)?;
        graph.insert_edges(data.edges)?;
        Ok(graph)
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
