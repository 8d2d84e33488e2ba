use crate::types::{EdgeDirection, EdgeKind, GraphEdge, GraphError, GraphNode, NodeId};

/// Storage and traversal contract for the code/test graph.
///
/// Writes happen only while a snapshot is being built; once the owning
/// snapshot is published the store is read through `&self` from any number
/// of threads.
pub trait GraphStore {
    /// Insert a batch of nodes. Re-inserting an identical identity replaces
    /// the stored node; a different identity under the same id is rejected
    /// and nothing from the batch is inserted.
    fn insert_nodes(&mut self, nodes: Vec<GraphNode>) -> Result<usize, GraphError>;

    /// Insert a batch of edges. Every endpoint must already exist; a single
    /// dangling endpoint rejects the whole batch. A repeated
    /// `(source, target, kind)` keeps the higher confidence.
    fn insert_edges(&mut self, edges: Vec<GraphEdge>) -> Result<usize, GraphError>;

    /// Remove every node owned by `file_path` together with incident edges.
    /// Returns the number of nodes removed.
    fn remove_subgraph(&mut self, file_path: &str) -> usize;

    /// Remove edges of the given kinds that were produced by `file_path`.
    fn remove_edges_from_file(&mut self, file_path: &str, kinds: &[EdgeKind]) -> usize;

    /// Remove every edge of the given kinds.
    fn remove_edges_of_kind(&mut self, kinds: &[EdgeKind]) -> usize;

    /// Look up a node by id.
    fn node(&self, id: NodeId) -> Option<&GraphNode>;

    /// The File node for a repo-relative path.
    fn file_node(&self, file_path: &str) -> Option<&GraphNode>;

    /// All nodes owned by a file, File node included.
    fn nodes_in_file(&self, file_path: &str) -> Vec<&GraphNode>;

    /// Adjacent nodes over edges of one kind, with the connecting edge.
    fn neighbors(
        &self,
        id: NodeId,
        kind: EdgeKind,
        direction: EdgeDirection,
    ) -> Vec<(NodeId, &GraphEdge)>;

    /// Breadth-first closure over edges of one kind, up to `max_depth` hops.
    /// Returns `(node, hops)` pairs with the minimum hop count, excluding the
    /// start node.
    fn reachable(
        &self,
        id: NodeId,
        kind: EdgeKind,
        direction: EdgeDirection,
        max_depth: u32,
    ) -> Vec<(NodeId, u32)>;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
