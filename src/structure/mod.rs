//! The orchestrator that grows a thought structure.
//!
//! [`ThoughtStructure`] owns the graph, the configuration, the growth
//! policy, the deduplicator, and the termination rule, and drives the build
//! loop against a caller-supplied [`GenerationOracle`]. All mutation happens
//! through `&mut self`; the engine holds no locks and spawns no tasks, so a
//! structure can be dropped between loop iterations at any time.

mod chains;
mod termination;

#[cfg(test)]
#[path = "structure_tests.rs"]
mod structure_tests;

pub use chains::SinkChain;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::StructureConfig;
use crate::dedup::{DedupOutcome, Deduplicator};
use crate::error::{OracleError, StructureError, StructureResult};
use crate::graph::ThoughtGraph;
use crate::oracle::GenerationOracle;
use crate::policy::GrowthPolicy;
use termination::TerminationRule;

/// A reasoning structure under construction, together with everything needed
/// to grow it.
pub struct ThoughtStructure<O: GenerationOracle> {
    graph: ThoughtGraph,
    config: StructureConfig,
    policy: Box<dyn GrowthPolicy>,
    dedup: Deduplicator,
    termination: TerminationRule,
    oracle: O,
}

impl<O: GenerationOracle> ThoughtStructure<O> {
    /// Create an empty structure. Fails if the configuration is invalid.
    pub fn new(oracle: O, config: StructureConfig) -> StructureResult<Self> {
        config.validate()?;
        Ok(Self {
            graph: ThoughtGraph::new(),
            policy: config.growth_topology.policy(config.max_length),
            dedup: Deduplicator::new(&config),
            termination: TerminationRule::new(&config),
            config,
            oracle,
        })
    }

    /// Seed the structure with its root node holding the task context.
    ///
    /// The root gets identity `"0"`, depth 0, no score, and stays growable.
    /// Fails if a root already exists; call [`ThoughtStructure::reset_structure`]
    /// to start a new attempt.
    pub fn construct_root(&mut self, thought: impl Into<String>) -> StructureResult<String> {
        self.construct_root_with_score(thought, None)
    }

    /// Seed the structure with a root node carrying an explicit score.
    pub fn construct_root_with_score(
        &mut self,
        thought: impl Into<String>,
        score: Option<f64>,
    ) -> StructureResult<String> {
        if self.graph.root().is_some() {
            return Err(StructureError::Integrity {
                message: "structure already has a root; reset before reseeding".to_string(),
            });
        }
        let mut root = self.graph.create_node(0, thought).as_root();
        if let Some(score) = score {
            root = root.with_score(score);
        }
        let id = root.id.clone();
        self.graph.insert_root(root)?;
        info!(root_id = %id, "Constructed structure root");
        Ok(id)
    }

    /// Run the build loop until no growable node remains.
    ///
    /// Each iteration expands one node: the policy selects it, the oracle
    /// generates and scores up to `branch_factor` candidates, each candidate
    /// becomes a new node or is folded into an existing one, and the
    /// termination rule re-sweeps the pool. An oracle failure aborts the
    /// build and leaves the graph in its last consistent state.
    pub async fn build_structure(&mut self) -> StructureResult<()> {
        if self.graph.root().is_none() {
            return Err(StructureError::Integrity {
                message: "structure has no root; call construct_root first".to_string(),
            });
        }
        let started = Instant::now();
        let mut expansions: usize = 0;
        while self.grow_once().await? {
            expansions += 1;
        }
        info!(
            expansions,
            node_count = self.graph.node_count(),
            sink_count = self.graph.sinks().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            topology = %self.config.growth_topology,
            "Structure build completed"
        );
        Ok(())
    }

    /// Perform one expansion step.
    ///
    /// Returns `Ok(false)` when the policy finds nothing left to grow. This
    /// is the build loop's cancellation boundary: callers driving the loop
    /// themselves can stop between steps with the graph fully consistent.
    pub async fn grow_once(&mut self) -> StructureResult<bool> {
        let Some(node_id) = self.policy.select_grow_node(&self.graph) else {
            return Ok(false);
        };

        let path = self.graph.root_path(&node_id)?;
        let depth = path.len().saturating_sub(1);
        debug!(node_id = %node_id, depth, "Expanding node");

        let generation = self
            .oracle
            .generate_candidates(&path, self.config.branch_factor)
            .await
            .map_err(|source| StructureError::Oracle {
                node_id: node_id.clone(),
                source,
            })?;

        if generation.candidates.is_empty() {
            // Naturally terminal path: recoverable, the loop moves on.
            warn!(node_id = %node_id, "Oracle produced no candidates, halting growth at node");
            self.graph.set_ungrowable(&node_id)?;
            return Ok(true);
        }

        let evaluation = self
            .oracle
            .evaluate_candidates(&generation.candidates, &path)
            .await
            .map_err(|source| StructureError::Oracle {
                node_id: node_id.clone(),
                source,
            })?;
        if evaluation.scores.len() != generation.candidates.len() {
            return Err(StructureError::Oracle {
                node_id: node_id.clone(),
                source: OracleError::InvalidResponse {
                    message: format!(
                        "{} scores for {} candidates",
                        evaluation.scores.len(),
                        generation.candidates.len()
                    ),
                },
            });
        }
        for score in &evaluation.scores {
            if !(0.0..=1.0).contains(score) {
                return Err(StructureError::Oracle {
                    node_id: node_id.clone(),
                    source: OracleError::InvalidResponse {
                        message: format!("candidate score {} outside [0, 1]", score),
                    },
                });
            }
        }

        let rationale = join_rationales(&generation.rationale, &evaluation.rationale);
        let parent_depth = self.graph.require_node(&node_id)?.step_index;

        let mut created: usize = 0;
        let mut merged: usize = 0;
        for (candidate, score) in generation.candidates.iter().zip(&evaluation.scores) {
            let outcome = self
                .dedup
                .resolve(
                    &mut self.graph,
                    &self.oracle,
                    &node_id,
                    candidate,
                    *score,
                    &rationale,
                    self.config.solution_marker.as_deref(),
                )
                .await?;
            match outcome {
                DedupOutcome::Merged { .. } => merged += 1,
                DedupOutcome::Fresh => {
                    let node = self
                        .graph
                        .create_node(parent_depth + 1, candidate)
                        .with_score(*score);
                    let child_id = node.id.clone();
                    let edge = self.graph.create_edge(&node_id, &child_id, *score, &rationale);
                    self.graph.insert(node, edge)?;
                    created += 1;
                }
            }
        }

        // A folded candidate consumes an expansion attempt without adding an
        // edge, so the fan-out cap alone cannot stop a node whose output
        // keeps duplicating existing nodes.
        if created == 0 {
            warn!(node_id = %node_id, merged, "Every candidate folded into existing nodes, halting growth at node");
            self.graph.set_ungrowable(&node_id)?;
        } else if merged > 0
            && self.graph.out_degree(&node_id) + merged >= self.config.branch_factor
        {
            self.graph.set_ungrowable(&node_id)?;
        }

        self.termination.apply_all(&mut self.graph)?;
        debug!(node_id = %node_id, created, merged, "Expansion recorded");
        Ok(true)
    }

    /// Discard the whole structure and restart identities at 0. The next
    /// attempt begins with [`ThoughtStructure::construct_root`].
    pub fn reset_structure(&mut self) {
        self.graph.reset();
        info!("Structure reset");
    }

    /// One completed chain per sink, in sink creation order.
    pub fn get_sink_chains(&self) -> StructureResult<Vec<SinkChain>> {
        chains::sink_chains(&self.graph)
    }

    /// The completed chain with the highest aggregate score, or `None` when
    /// no sink exists yet.
    pub fn get_best_chain(&self) -> StructureResult<Option<SinkChain>> {
        chains::best_chain(&self.graph)
    }

    /// Read access to the underlying graph.
    pub fn graph(&self) -> &ThoughtGraph {
        &self.graph
    }

    /// The configuration the structure was built with.
    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    /// The oracle driving generation.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

fn join_rationales(generation: &str, evaluation: &str) -> String {
    match (generation.is_empty(), evaluation.is_empty()) {
        (true, true) => String::new(),
        (false, true) => generation.to_string(),
        (true, false) => evaluation.to_string(),
        (false, false) => format!("{}; {}", generation, evaluation),
    }
}
