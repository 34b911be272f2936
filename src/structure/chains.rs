//! Extraction of completed reasoning chains from a built structure.

use serde::{Deserialize, Serialize};

use crate::error::StructureResult;
use crate::graph::{ThoughtGraph, ThoughtNode};

/// A completed root-to-sink reasoning chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkChain {
    /// Node snapshots from the root to the sink, in path order.
    pub path: Vec<ThoughtNode>,
    /// Sum of the scores along the path. The root carries no score and
    /// contributes nothing.
    pub aggregate_score: f64,
}

/// Extract one chain per sink, in sink creation order.
///
/// Each chain follows the shortest path from the root, so in the graph
/// topology a converging cross-branch edge can shorten a chain below the
/// sink's own depth.
pub(crate) fn sink_chains(graph: &ThoughtGraph) -> StructureResult<Vec<SinkChain>> {
    let sink_ids: Vec<String> = graph.sinks().iter().map(|n| n.id.clone()).collect();
    let mut chains = Vec::with_capacity(sink_ids.len());
    for sink_id in sink_ids {
        let path = graph.root_path(&sink_id)?;
        let aggregate_score = path.iter().filter_map(|n| n.score).sum();
        chains.push(SinkChain {
            path,
            aggregate_score,
        });
    }
    Ok(chains)
}

/// The chain with the highest aggregate score, or `None` when the structure
/// has no sinks. Ties keep the earliest-created sink.
pub(crate) fn best_chain(graph: &ThoughtGraph) -> StructureResult<Option<SinkChain>> {
    let chains = sink_chains(graph)?;
    let mut best: Option<SinkChain> = None;
    for chain in chains {
        let better = match &best {
            Some(current) => chain.aggregate_score > current.aggregate_score,
            None => true,
        };
        if better {
            best = Some(chain);
        }
    }
    Ok(best)
}
