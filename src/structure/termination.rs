//! The termination rule: when a node becomes a sink or stops growing.

use crate::config::StructureConfig;
use crate::error::StructureResult;
use crate::graph::{NodeGrowth, NodePosition, ThoughtGraph};

/// Marks nodes as solution termini (sinks) or as fully expanded.
///
/// Both checks are idempotent and safe to re-run on every node after each
/// insertion; they only ever tighten growth, never loosen it.
#[derive(Debug, Clone)]
pub(crate) struct TerminationRule {
    max_length: usize,
    branch_factor: usize,
    solution_marker: Option<String>,
}

impl TerminationRule {
    pub(crate) fn new(config: &StructureConfig) -> Self {
        Self {
            max_length: config.max_length,
            branch_factor: config.branch_factor,
            solution_marker: config.solution_marker.clone(),
        }
    }

    /// Re-run the stop and growth checks on a single node.
    pub(crate) fn apply(&self, graph: &mut ThoughtGraph, node_id: &str) -> StructureResult<()> {
        let out_degree = graph.out_degree(node_id);
        let node = graph.node_mut(node_id)?;

        // Stop check. The root carries the task context, which may echo the
        // marker; it is never a sink and never depth-capped.
        if !node.is_root() {
            let depth_capped = node.step_index >= self.max_length;
            let marked = self
                .solution_marker
                .as_deref()
                .is_some_and(|marker| node.thought.contains(marker));
            if depth_capped || marked {
                node.position = NodePosition::Sink;
                node.growth = NodeGrowth::Ungrowable;
                return Ok(());
            }
        }

        // Growth check: the configured fan-out has been attempted.
        if out_degree >= self.branch_factor {
            node.growth = NodeGrowth::Ungrowable;
        }
        Ok(())
    }

    /// Re-run the checks on every node in the pool.
    pub(crate) fn apply_all(&self, graph: &mut ThoughtGraph) -> StructureResult<()> {
        let ids: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
        for id in ids {
            self.apply(graph, &id)?;
        }
        Ok(())
    }
}
