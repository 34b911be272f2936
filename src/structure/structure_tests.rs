//! Unit tests for the orchestrator build loop.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use crate::config::StructureConfig;
use crate::error::{OracleError, OracleResult, StructureError};
use crate::graph::ThoughtNode;
use crate::oracle::{Evaluation, Generation, GenerationOracle, SimilarityJudgement};
use crate::policy::GrowthTopology;

use super::ThoughtStructure;

/// Replays scripted candidate batches in order. Once the script runs out,
/// every further expansion yields zero candidates, so any build terminates.
struct ScriptedOracle {
    script: Mutex<VecDeque<(Vec<&'static str>, Vec<f64>)>>,
    pending_scores: Mutex<Option<Vec<f64>>>,
    similarity: f64,
}

impl ScriptedOracle {
    fn new(script: Vec<(Vec<&'static str>, Vec<f64>)>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            pending_scores: Mutex::new(None),
            similarity: 0.0,
        }
    }

    fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = similarity;
        self
    }
}

#[async_trait]
impl GenerationOracle for ScriptedOracle {
    async fn generate_candidates(
        &self,
        _path: &[ThoughtNode],
        _count: usize,
    ) -> OracleResult<Generation> {
        let Some((candidates, scores)) = self.script.lock().unwrap().pop_front() else {
            return Ok(Generation {
                candidates: Vec::new(),
                rationale: "script exhausted".to_string(),
            });
        };
        *self.pending_scores.lock().unwrap() = Some(scores);
        Ok(Generation {
            candidates: candidates.into_iter().map(String::from).collect(),
            rationale: String::new(),
        })
    }

    async fn evaluate_candidates(
        &self,
        _candidates: &[String],
        _path: &[ThoughtNode],
    ) -> OracleResult<Evaluation> {
        let scores = self
            .pending_scores
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| OracleError::InvalidResponse {
                message: "evaluation requested without a generation".to_string(),
            })?;
        Ok(Evaluation {
            scores,
            rationale: String::new(),
        })
    }

    async fn measure_similarity(
        &self,
        _text_a: &str,
        _text_b: &str,
        _path: &[ThoughtNode],
    ) -> OracleResult<SimilarityJudgement> {
        Ok(SimilarityJudgement {
            score: self.similarity,
            rationale: String::new(),
        })
    }
}

/// Fails every generation call.
struct FailingOracle;

#[async_trait]
impl GenerationOracle for FailingOracle {
    async fn generate_candidates(
        &self,
        _path: &[ThoughtNode],
        _count: usize,
    ) -> OracleResult<Generation> {
        Err(OracleError::Unavailable {
            message: "backend down".to_string(),
            retries: 3,
        })
    }

    async fn evaluate_candidates(
        &self,
        _candidates: &[String],
        _path: &[ThoughtNode],
    ) -> OracleResult<Evaluation> {
        Err(OracleError::Unavailable {
            message: "backend down".to_string(),
            retries: 3,
        })
    }

    async fn measure_similarity(
        &self,
        _text_a: &str,
        _text_b: &str,
        _path: &[ThoughtNode],
    ) -> OracleResult<SimilarityJudgement> {
        Err(OracleError::Unavailable {
            message: "backend down".to_string(),
            retries: 3,
        })
    }
}

#[tokio::test]
async fn test_depth_first_build_to_depth_cap() {
    let oracle = ScriptedOracle::new(vec![
        (vec!["take first step"], vec![0.6]),
        (vec!["conclude"], vec![0.9]),
    ]);
    let config = StructureConfig::default()
        .with_branch_factor(1)
        .with_max_length(2);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("what is 17 * 12?").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.sinks().len(), 1);
    assert!(graph.root().unwrap().is_root());

    let best = structure.get_best_chain().unwrap().unwrap();
    let ids: Vec<&str> = best.path.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "3"]);
    assert!((best.aggregate_score - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_build_without_root_fails() {
    let oracle = ScriptedOracle::new(vec![]);
    let mut structure = ThoughtStructure::new(oracle, StructureConfig::default()).unwrap();

    let err = structure.build_structure().await.unwrap_err();
    assert!(matches!(err, StructureError::Integrity { .. }));
}

#[tokio::test]
async fn test_construct_root_twice_fails() {
    let oracle = ScriptedOracle::new(vec![]);
    let mut structure = ThoughtStructure::new(oracle, StructureConfig::default()).unwrap();

    let id = structure.construct_root("task").unwrap();
    assert_eq!(id, "0");
    let err = structure.construct_root("again").unwrap_err();
    assert!(matches!(err, StructureError::Integrity { .. }));
}

#[tokio::test]
async fn test_invalid_config_rejected_at_construction() {
    let oracle = ScriptedOracle::new(vec![]);
    let config = StructureConfig::default().with_branch_factor(0);
    assert!(ThoughtStructure::new(oracle, config).is_err());
}

#[tokio::test]
async fn test_near_duplicate_sibling_is_folded() {
    let oracle = ScriptedOracle::new(vec![(
        vec!["compute 17 * 12 directly", "multiply 17 by 12 outright"],
        vec![0.8, 0.75],
    )])
    .with_similarity(0.95);
    let config = StructureConfig::default()
        .with_branch_factor(2)
        .with_max_length(1);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("what is 17 * 12?").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    // The second candidate merged instead of becoming a node.
    assert_eq!(graph.node_count(), 2);
    let absorbed = graph.node("1").unwrap();
    assert_eq!(absorbed.backups.len(), 1);
    assert_eq!(absorbed.backups[0].thought, "multiply 17 by 12 outright");
    assert!((absorbed.backups[0].similarity - 0.95).abs() < 1e-9);
    // Depth 1 is the cap, so the surviving node is a sink.
    assert!(absorbed.is_sink());
    // The merge used up the root's second attempt.
    assert!(!graph.root().unwrap().is_growable());
}

#[tokio::test]
async fn test_merged_candidate_counts_toward_fan_out_cap() {
    let oracle = ScriptedOracle::new(vec![(
        vec!["compute it", "compute it again"],
        vec![0.5, 0.5],
    )])
    .with_similarity(0.95);
    let config = StructureConfig::default()
        .with_branch_factor(2)
        .with_max_length(5);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("task").unwrap();

    assert!(structure.grow_once().await.unwrap());

    let graph = structure.graph();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.out_degree("0"), 1);
    // One created child plus one folded duplicate exhaust both attempts, so
    // the root must not be selected again.
    assert!(!graph.root().unwrap().is_growable());
}

#[tokio::test]
async fn test_solution_marker_bypasses_dedup_and_sinks() {
    // Similarity 1.0 would merge the second candidate if the marker did not
    // exempt it.
    let oracle = ScriptedOracle::new(vec![(
        vec!["an intermediate idea", "ANSWER: 204"],
        vec![0.8, 0.78],
    )])
    .with_similarity(1.0);
    let config = StructureConfig::default()
        .with_branch_factor(2)
        .with_max_length(3)
        .with_solution_marker("ANSWER:");
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("what is 17 * 12?").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    assert_eq!(graph.node_count(), 3);
    let sinks = graph.sinks();
    assert_eq!(sinks.len(), 1);
    assert!(sinks[0].thought.contains("ANSWER:"));
    assert!(!sinks[0].is_growable());
    // Nothing was folded anywhere.
    assert!(graph.nodes().all(|n| n.backups.is_empty()));

    let best = structure.get_best_chain().unwrap().unwrap();
    assert_eq!(best.path.len(), 2);
    assert!((best.aggregate_score - 0.78).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_candidates_halt_growth_without_error() {
    let oracle = ScriptedOracle::new(vec![]);
    let mut structure = ThoughtStructure::new(oracle, StructureConfig::default()).unwrap();
    structure.construct_root("task").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    assert_eq!(graph.node_count(), 1);
    let root = graph.root().unwrap();
    assert!(root.is_root());
    assert!(!root.is_growable());
    assert!(structure.get_sink_chains().unwrap().is_empty());
    assert!(structure.get_best_chain().unwrap().is_none());
}

#[tokio::test]
async fn test_oracle_failure_names_the_expanding_node() {
    let mut structure =
        ThoughtStructure::new(FailingOracle, StructureConfig::default()).unwrap();
    structure.construct_root("task").unwrap();

    let err = structure.build_structure().await.unwrap_err();
    match err {
        StructureError::Oracle { node_id, .. } => assert_eq!(node_id, "0"),
        other => panic!("unexpected error: {other}"),
    }
    // The graph is untouched by the failed expansion.
    assert_eq!(structure.graph().node_count(), 1);
}

#[tokio::test]
async fn test_score_count_mismatch_is_invalid_response() {
    let oracle = ScriptedOracle::new(vec![(vec!["a", "b"], vec![0.5])]);
    let config = StructureConfig::default().with_branch_factor(2);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("task").unwrap();

    let err = structure.build_structure().await.unwrap_err();
    assert!(matches!(
        err,
        StructureError::Oracle {
            source: OracleError::InvalidResponse { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_out_of_range_score_rejected() {
    let oracle = ScriptedOracle::new(vec![(vec!["a"], vec![1.5])]);
    let mut structure = ThoughtStructure::new(oracle, StructureConfig::default()).unwrap();
    structure.construct_root("task").unwrap();

    let err = structure.build_structure().await.unwrap_err();
    assert!(matches!(
        err,
        StructureError::Oracle {
            source: OracleError::InvalidResponse { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_every_leaf_ends_sink_or_ungrowable() {
    let oracle = ScriptedOracle::new(vec![
        (vec!["branch a", "branch b"], vec![0.5, 0.6]),
        (vec!["a then one", "a then two"], vec![0.4, 0.5]),
        (vec!["b then one"], vec![0.7]),
    ]);
    let config = StructureConfig::default()
        .with_branch_factor(2)
        .with_max_length(2);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("task").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    for node in graph.nodes() {
        if graph.out_degree(&node.id) == 0 {
            assert!(
                node.is_sink() || !node.is_growable(),
                "leaf {} still growable",
                node.id
            );
        }
    }
    assert_eq!(graph.sinks().len(), 3);

    let best = structure.get_best_chain().unwrap().unwrap();
    assert_eq!(best.path.last().unwrap().thought, "b then one");
    assert!((best.aggregate_score - 1.3).abs() < 1e-9);
}

#[tokio::test]
async fn test_best_leaf_topology_stops_at_depth_cap() {
    let oracle = ScriptedOracle::new(vec![
        (vec!["step one"], vec![0.6]),
        (vec!["step two"], vec![0.9]),
    ]);
    let config = StructureConfig::default()
        .with_branch_factor(1)
        .with_max_length(2)
        .with_growth_topology(GrowthTopology::BestLeafFirst);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("task").unwrap();

    structure.build_structure().await.unwrap();

    let graph = structure.graph();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.max_step_index(), 2);
    assert_eq!(graph.sinks().len(), 1);
}

#[tokio::test]
async fn test_reset_restarts_identities() {
    let oracle = ScriptedOracle::new(vec![(vec!["step"], vec![0.5])]);
    let config = StructureConfig::default()
        .with_branch_factor(1)
        .with_max_length(1);
    let mut structure = ThoughtStructure::new(oracle, config).unwrap();
    structure.construct_root("first attempt").unwrap();
    structure.build_structure().await.unwrap();
    assert!(structure.graph().node_count() > 1);

    structure.reset_structure();
    assert!(structure.graph().is_empty());

    let id = structure.construct_root("second attempt").unwrap();
    assert_eq!(id, "0");
    assert_eq!(structure.graph().node_count(), 1);
}

#[tokio::test]
async fn test_root_score_is_optional() {
    let oracle = ScriptedOracle::new(vec![]);
    let mut structure = ThoughtStructure::new(oracle, StructureConfig::default()).unwrap();
    structure
        .construct_root_with_score("task", Some(0.5))
        .unwrap();
    assert_eq!(structure.graph().root().unwrap().score, Some(0.5));
}
