//! Deduplication of near-duplicate candidate thoughts.
//!
//! A freshly generated candidate either becomes a new node or is folded
//! into an existing node as a backup. Solutions are never deduplicated;
//! they must surface as distinct terminal nodes.

use tracing::debug;

use crate::config::StructureConfig;
use crate::error::{OracleError, StructureError, StructureResult};
use crate::graph::ThoughtGraph;
use crate::oracle::GenerationOracle;
use crate::policy::GrowthTopology;

/// What the deduplicator decided for a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupOutcome {
    /// The candidate is materially new and should become a node.
    Fresh,
    /// The candidate was folded into an existing node.
    Merged {
        /// Identity of the node that absorbed the candidate.
        node_id: String,
        /// Oracle similarity between candidate and absorbing node.
        similarity: f64,
    },
}

/// Decides whether a candidate thought is materially new or a near-duplicate
/// of an existing node on an eligible path.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    topology: GrowthTopology,
    min_similarity: f64,
    max_score_delta: f64,
}

impl Deduplicator {
    /// Build a deduplicator from the structure configuration.
    pub fn new(config: &StructureConfig) -> Self {
        Self {
            topology: config.growth_topology,
            min_similarity: config.min_similarity,
            max_score_delta: config.max_score_delta,
        }
    }

    /// Resolve a candidate generated from `from_id`.
    ///
    /// On a merge, the absorbing node's backup list grows by one and no new
    /// node is created; in the graph topology a single cross-branch edge may
    /// additionally be recorded when the merge target sits exactly one step
    /// below `from_id`.
    pub async fn resolve<O: GenerationOracle + ?Sized>(
        &self,
        graph: &mut ThoughtGraph,
        oracle: &O,
        from_id: &str,
        candidate: &str,
        score: f64,
        rationale: &str,
        solution_marker: Option<&str>,
    ) -> StructureResult<DedupOutcome> {
        // Solutions always surface as distinct terminal nodes.
        if let Some(marker) = solution_marker {
            if candidate.contains(marker) {
                return Ok(DedupOutcome::Fresh);
            }
        }

        // With only the root present there is nothing to merge into.
        if graph.node_count() <= 1 {
            return Ok(DedupOutcome::Fresh);
        }

        let from_path = graph.root_path(from_id)?;
        let from_path_ids: Vec<String> = from_path.iter().map(|n| n.id.clone()).collect();

        // Snapshot the pool before mutating; insertion order decides which
        // eligible duplicate wins.
        let existing: Vec<String> = graph
            .nodes()
            .filter(|n| !n.is_root())
            .map(|n| n.id.clone())
            .collect();

        for node_id in existing {
            if !self.path_eligible(graph, &node_id, &from_path_ids)? {
                continue;
            }

            let (node_thought, node_score) = {
                let node = graph.require_node(&node_id)?;
                (node.thought.clone(), node.score)
            };
            let Some(node_score) = node_score else {
                continue;
            };
            if (score - node_score).abs() > self.max_score_delta {
                continue;
            }

            let judgement = oracle
                .measure_similarity(candidate, &node_thought, &from_path)
                .await
                .map_err(|source| StructureError::Oracle {
                    node_id: from_id.to_string(),
                    source,
                })?;
            if !(0.0..=1.0).contains(&judgement.score) {
                return Err(StructureError::Oracle {
                    node_id: from_id.to_string(),
                    source: OracleError::InvalidResponse {
                        message: format!(
                            "similarity {} outside [0, 1] for node {}",
                            judgement.score, node_id
                        ),
                    },
                });
            }
            if judgement.score < self.min_similarity {
                continue;
            }

            // First eligible duplicate wins.
            let similarity = judgement.score;
            graph
                .node_mut(&node_id)?
                .backup(candidate, score, similarity, rationale);
            debug!(
                node_id = %node_id,
                from_id = %from_id,
                similarity,
                "Folded near-duplicate candidate into existing node"
            );

            if self.topology.merges_across_branches() {
                self.link_converging_branch(graph, from_id, &node_id, rationale)?;
            }

            return Ok(DedupOutcome::Merged { node_id, similarity });
        }

        Ok(DedupOutcome::Fresh)
    }

    /// Whether `node_id` is a merge candidate for a thought generated from
    /// the node at the end of `from_path_ids`.
    ///
    /// Tree topologies only merge into nodes whose ancestor chain is
    /// identical to the expansion path, i.e. effective siblings of the
    /// candidate; collapsing structurally distinct branches that happen to
    /// produce similar text is not allowed. The graph topology merges
    /// anywhere.
    fn path_eligible(
        &self,
        graph: &ThoughtGraph,
        node_id: &str,
        from_path_ids: &[String],
    ) -> StructureResult<bool> {
        if self.topology.merges_across_branches() {
            return Ok(true);
        }
        let node_path = graph.root_path(node_id)?;
        if node_path.len() != from_path_ids.len() + 1 {
            return Ok(false);
        }
        Ok(node_path
            .iter()
            .take(from_path_ids.len())
            .zip(from_path_ids)
            .all(|(ancestor, expected)| ancestor.id == *expected))
    }

    /// Add the converging edge `from_id -> node_id` when the merge target
    /// sits exactly one step below the expansion node and the edge does not
    /// exist yet.
    fn link_converging_branch(
        &self,
        graph: &mut ThoughtGraph,
        from_id: &str,
        node_id: &str,
        rationale: &str,
    ) -> StructureResult<()> {
        let from_depth = graph.require_node(from_id)?.step_index;
        let target = graph.require_node(node_id)?;
        if target.step_index != from_depth + 1 || graph.has_edge(from_id, node_id) {
            return Ok(());
        }
        let weight = target.score.unwrap_or(0.0);
        let edge = graph.create_edge(from_id, node_id, weight, rationale);
        debug!(
            edge_id = %edge.id,
            from_id = %from_id,
            node_id = %node_id,
            "Linked converging branch"
        );
        graph.insert_edge(edge)
    }
}
