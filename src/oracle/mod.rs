//! The generation oracle boundary.
//!
//! The engine consumes exactly one external service: something that can
//! generate candidate thoughts for a reasoning path, score candidates, and
//! judge similarity between two thoughts. Implementations typically wrap an
//! LLM API; the engine only sees this trait.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::OracleResult;
use crate::graph::ThoughtNode;

/// Candidate thoughts generated for a reasoning path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The generated candidate texts, in oracle order.
    pub candidates: Vec<String>,
    /// Opaque generation rationale, kept for audit, never for control flow.
    pub rationale: String,
}

/// Quality scores for a batch of candidate thoughts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// One score in [0, 1] per candidate, in candidate order.
    pub scores: Vec<f64>,
    /// Opaque evaluation rationale.
    pub rationale: String,
}

/// Similarity judgement between two thought texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityJudgement {
    /// Similarity in [0, 1]; 1 means the texts say the same thing.
    pub score: f64,
    /// Opaque similarity rationale.
    pub rationale: String,
}

/// The external text-generation, evaluation, and similarity service the
/// engine depends on.
///
/// All three operations receive the root-to-node path as context. The path
/// is an owned snapshot; implementations may inspect it freely without
/// affecting the structure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Generate up to `count` candidate continuations for the given path.
    /// Returning fewer candidates than requested is allowed; returning zero
    /// marks the path's tip as naturally terminal.
    async fn generate_candidates(
        &self,
        path: &[ThoughtNode],
        count: usize,
    ) -> OracleResult<Generation>;

    /// Score each candidate in [0, 1] in the context of the given path.
    /// The returned score list must match the candidate list in length.
    async fn evaluate_candidates(
        &self,
        candidates: &[String],
        path: &[ThoughtNode],
    ) -> OracleResult<Evaluation>;

    /// Judge how similar two thought texts are in the context of the path.
    async fn measure_similarity(
        &self,
        text_a: &str,
        text_b: &str,
        path: &[ThoughtNode],
    ) -> OracleResult<SimilarityJudgement>;
}
