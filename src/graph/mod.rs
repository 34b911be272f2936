//! Thought graph data model.
//!
//! This module defines the canonical records for reasoning steps
//! ([`ThoughtNode`]), their connections ([`ThoughtEdge`]), and the folded
//! near-duplicates kept on a node ([`ThoughtBackup`]). The pool that owns
//! them lives in [`pool`].

mod pool;


pub use pool::ThoughtGraph;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a node sits in the structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePosition {
    /// The structure's entry point. Exactly one node is the root.
    Root,
    /// A regular reasoning step.
    #[default]
    Intermediate,
    /// A node whose root path is a candidate final answer.
    Sink,
}

impl std::fmt::Display for NodePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodePosition::Root => write!(f, "root"),
            NodePosition::Intermediate => write!(f, "intermediate"),
            NodePosition::Sink => write!(f, "sink"),
        }
    }
}

/// Whether a node is still eligible for expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeGrowth {
    /// The node may still receive children.
    #[default]
    Growable,
    /// The node is fully expanded or terminal; the growth checks only ever
    /// tighten toward this state, never loosen.
    Ungrowable,
}

impl std::fmt::Display for NodeGrowth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeGrowth::Growable => write!(f, "growable"),
            NodeGrowth::Ungrowable => write!(f, "ungrowable"),
        }
    }
}

/// A near-duplicate candidate folded into an existing node instead of
/// becoming a node of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtBackup {
    /// The folded candidate's text.
    pub thought: String,
    /// The folded candidate's quality score.
    pub score: f64,
    /// Similarity to the node the candidate was merged into.
    pub similarity: f64,
    /// Generation/evaluation rationale, kept for audit.
    pub rationale: String,
    /// When the merge happened.
    pub created_at: DateTime<Utc>,
}

/// One reasoning step in the structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtNode {
    /// Unique identity, assigned at creation, immutable.
    pub id: String,
    /// Depth from the root (root = 0).
    pub step_index: usize,
    /// The step's text payload. For the root this is the task context; for
    /// every other node it is oracle-generated text.
    pub thought: String,
    /// Quality score in [0, 1]; `None` only for the root.
    pub score: Option<f64>,
    /// Where the node sits in the structure.
    pub position: NodePosition,
    /// Whether the node may still be expanded.
    pub growth: NodeGrowth,
    /// Near-duplicate candidates folded into this node, in merge order.
    pub backups: Vec<ThoughtBackup>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// Optional metadata for consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ThoughtNode {
    /// Create a new growable intermediate node.
    pub fn new(id: impl Into<String>, step_index: usize, thought: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_index,
            thought: thought.into(),
            score: None,
            position: NodePosition::Intermediate,
            growth: NodeGrowth::Growable,
            backups: Vec::new(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// Set the quality score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set consumer metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Mark this node as the structure's root.
    pub fn as_root(mut self) -> Self {
        self.position = NodePosition::Root;
        self
    }

    /// Whether this node is the root.
    pub fn is_root(&self) -> bool {
        self.position == NodePosition::Root
    }

    /// Whether this node terminates a candidate solution path.
    pub fn is_sink(&self) -> bool {
        self.position == NodePosition::Sink
    }

    /// Whether this node may still receive children.
    pub fn is_growable(&self) -> bool {
        self.growth == NodeGrowth::Growable
    }

    /// Fold a near-duplicate candidate into this node.
    pub fn backup(
        &mut self,
        thought: impl Into<String>,
        score: f64,
        similarity: f64,
        rationale: impl Into<String>,
    ) {
        self.backups.push(ThoughtBackup {
            thought: thought.into(),
            score,
            similarity,
            rationale: rationale.into(),
            created_at: Utc::now(),
        });
    }
}

/// A directed connection between a parent and a child node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtEdge {
    /// Unique identity, assigned at creation.
    pub id: String,
    /// Identity of the parent node.
    pub source_id: String,
    /// Identity of the child node.
    pub destination_id: String,
    /// Edge weight; defaults to the child's score.
    pub weight: f64,
    /// Generation/evaluation rationale that produced the child, kept for
    /// audit and replay, never read for control flow.
    pub rationale: String,
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
    /// Optional metadata for consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ThoughtEdge {
    /// Create a new edge between two node identities.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        destination_id: impl Into<String>,
        weight: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            destination_id: destination_id.into(),
            weight,
            rationale: rationale.into(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// Set consumer metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
