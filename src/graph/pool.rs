//! The node/edge pool and the directed graph connecting them.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::{StructureError, StructureResult};
use crate::graph::{NodeGrowth, ThoughtEdge, ThoughtNode};

/// Owns the canonical records for every node and edge created during one
/// reasoning attempt.
///
/// Nodes and edges are appended only; nothing is removed individually. The
/// pool preserves insertion order so traversal is deterministic given a
/// fixed graph state. Identities are monotone integers rendered as strings,
/// shared between nodes and edges, starting at 0 for the root; the counter
/// resets only when the whole structure is discarded.
#[derive(Debug, Default, Clone)]
pub struct ThoughtGraph {
    nodes: HashMap<String, ThoughtNode>,
    node_order: Vec<String>,
    edges: HashMap<String, ThoughtEdge>,
    edge_order: Vec<String>,
    children: HashMap<String, Vec<String>>,
    next_identity: u64,
    root_id: Option<String>,
}

impl ThoughtGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every node and edge and reset the identity counter to 0.
    pub fn reset(&mut self) {
        debug!(
            node_count = self.nodes.len(),
            edge_count = self.edges.len(),
            "Resetting thought graph"
        );
        *self = Self::default();
    }

    fn next_id(&mut self) -> String {
        let id = self.next_identity;
        self.next_identity += 1;
        id.to_string()
    }

    /// Mint a node with the next identity. The node is not part of the graph
    /// until passed to [`ThoughtGraph::insert`] (or
    /// [`ThoughtGraph::insert_root`]).
    pub fn create_node(&mut self, step_index: usize, thought: impl Into<String>) -> ThoughtNode {
        let id = self.next_id();
        ThoughtNode::new(id, step_index, thought)
    }

    /// Mint an edge with the next identity. The edge is not part of the
    /// graph until inserted.
    pub fn create_edge(
        &mut self,
        source_id: impl Into<String>,
        destination_id: impl Into<String>,
        weight: f64,
        rationale: impl Into<String>,
    ) -> ThoughtEdge {
        let id = self.next_id();
        ThoughtEdge::new(id, source_id, destination_id, weight, rationale)
    }

    /// Record the root node. Fails if the graph already has one.
    pub fn insert_root(&mut self, node: ThoughtNode) -> StructureResult<()> {
        if self.root_id.is_some() {
            return Err(StructureError::Integrity {
                message: "structure already has a root".to_string(),
            });
        }
        if !node.is_root() {
            return Err(StructureError::Integrity {
                message: format!("node {} inserted as root without root position", node.id),
            });
        }
        self.root_id = Some(node.id.clone());
        self.node_order.push(node.id.clone());
        self.children.insert(node.id.clone(), Vec::new());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Atomically record a node together with its connecting edge: both
    /// succeed or neither is recorded. A node is never left without an
    /// incoming edge.
    pub fn insert(&mut self, node: ThoughtNode, edge: ThoughtEdge) -> StructureResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(StructureError::Integrity {
                message: format!("node {} already in pool", node.id),
            });
        }
        if edge.destination_id != node.id {
            return Err(StructureError::Integrity {
                message: format!(
                    "edge {} targets node {}, expected {}",
                    edge.id, edge.destination_id, node.id
                ),
            });
        }
        if !self.nodes.contains_key(&edge.source_id) {
            return Err(StructureError::NodeNotFound {
                node_id: edge.source_id.clone(),
            });
        }
        self.node_order.push(node.id.clone());
        self.children.insert(node.id.clone(), Vec::new());
        self.nodes.insert(node.id.clone(), node);
        self.record_edge(edge);
        Ok(())
    }

    /// Record an extra edge between two existing nodes. Used by the graph
    /// topology when a merge target sits one step below the expansion node.
    pub fn insert_edge(&mut self, edge: ThoughtEdge) -> StructureResult<()> {
        for endpoint in [&edge.source_id, &edge.destination_id] {
            if !self.nodes.contains_key(endpoint) {
                return Err(StructureError::NodeNotFound {
                    node_id: endpoint.clone(),
                });
            }
        }
        self.record_edge(edge);
        Ok(())
    }

    fn record_edge(&mut self, edge: ThoughtEdge) {
        self.children
            .entry(edge.source_id.clone())
            .or_default()
            .push(edge.destination_id.clone());
        self.edge_order.push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Whether an edge from `source_id` to `destination_id` exists.
    pub fn has_edge(&self, source_id: &str, destination_id: &str) -> bool {
        self.children
            .get(source_id)
            .is_some_and(|ids| ids.iter().any(|id| id == destination_id))
    }

    /// Look up a node by identity.
    pub fn node(&self, id: &str) -> Option<&ThoughtNode> {
        self.nodes.get(id)
    }

    /// Look up a node by identity, failing if it is not in the pool.
    pub fn require_node(&self, id: &str) -> StructureResult<&ThoughtNode> {
        self.nodes.get(id).ok_or_else(|| StructureError::NodeNotFound {
            node_id: id.to_string(),
        })
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> StructureResult<&mut ThoughtNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| StructureError::NodeNotFound {
                node_id: id.to_string(),
            })
    }

    /// The root node, if the structure has been constructed.
    pub fn root(&self) -> Option<&ThoughtNode> {
        self.root_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    /// Iterate nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &ThoughtNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Iterate edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &ThoughtEdge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    /// Sink nodes in creation order.
    pub fn sinks(&self) -> Vec<&ThoughtNode> {
        self.nodes().filter(|n| n.is_sink()).collect()
    }

    /// Child identities of a node, in creation order.
    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of outgoing edges on a node.
    pub fn out_degree(&self, id: &str) -> usize {
        self.children_of(id).len()
    }

    /// Number of nodes in the pool.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the pool.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the pool holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The deepest step index present in the graph (0 for a root-only
    /// structure).
    pub fn max_step_index(&self) -> usize {
        self.nodes().map(|n| n.step_index).max().unwrap_or(0)
    }

    /// The unique shortest directed path from `src_id` to `dst_id`, as owned
    /// node snapshots ordered from source to destination.
    ///
    /// An unreachable destination is a structural invariant violation and
    /// fails with [`StructureError::UnreachableNode`].
    pub fn get_path(&self, src_id: &str, dst_id: &str) -> StructureResult<Vec<ThoughtNode>> {
        self.require_node(src_id)?;
        self.require_node(dst_id)?;

        if src_id == dst_id {
            return Ok(vec![self.nodes[src_id].clone()]);
        }

        // BFS with predecessor tracking; first arrival is a shortest path.
        let mut predecessor: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(src_id);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if child != src_id && !predecessor.contains_key(child.as_str()) {
                    predecessor.insert(child, current);
                    if child == dst_id {
                        queue.clear();
                        break;
                    }
                    queue.push_back(child);
                }
            }
        }

        if !predecessor.contains_key(dst_id) {
            return Err(StructureError::UnreachableNode {
                from: src_id.to_string(),
                to: dst_id.to_string(),
            });
        }

        let mut ids = vec![dst_id];
        while let Some(prev) = predecessor.get(ids[ids.len() - 1]) {
            ids.push(prev);
        }
        ids.reverse();
        Ok(ids.iter().map(|id| self.nodes[*id].clone()).collect())
    }

    /// The path from the root to `dst_id`.
    pub fn root_path(&self, dst_id: &str) -> StructureResult<Vec<ThoughtNode>> {
        let root_id = self.root_id.clone().ok_or_else(|| StructureError::Integrity {
            message: "structure has no root".to_string(),
        })?;
        self.get_path(&root_id, dst_id)
    }

    pub(crate) fn set_ungrowable(&mut self, id: &str) -> StructureResult<()> {
        let node = self.node_mut(id)?;
        node.growth = NodeGrowth::Ungrowable;
        Ok(())
    }
}
