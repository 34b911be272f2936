//! # Thought Structure Engine
//!
//! An incrementally grown graph of reasoning steps ("thoughts") produced by an
//! external generative oracle, with pluggable growth policies and best-path
//! extraction.
//!
//! ## Features
//!
//! - **Node/Edge Pool**: canonical records for every reasoning step and
//!   connection, with monotone identities and atomic insertion
//! - **Deduplication**: near-duplicate candidates are folded into existing
//!   nodes as backups instead of becoming new nodes
//! - **Growth Policies**: depth-first, level-wise, and best-leaf-first node
//!   selection behind one strategy trait
//! - **Termination Rule**: depth caps, fan-out caps, and solution markers
//!   decide when a node is a sink or un-growable
//! - **Chain Extraction**: highest-scoring root-to-sink paths from the
//!   finished structure
//!
//! ## Architecture
//!
//! ```text
//! Caller → ThoughtStructure (build loop) → GenerationOracle (async boundary)
//!                 ↓
//!           ThoughtGraph (node/edge pools)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use thought_structure::{StructureConfig, ThoughtStructure};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StructureConfig::default().with_branch_factor(2);
//!     let oracle = MyOracle::new()?; // implements GenerationOracle
//!     let mut structure = ThoughtStructure::new(oracle, config)?;
//!     structure.construct_root("What is 12 * 17?")?;
//!     structure.build_structure().await?;
//!     if let Some(chain) = structure.get_best_chain()? {
//!         println!("answer path score: {}", chain.aggregate_score);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration for the thought structure engine.
pub mod config;
/// Deduplication of near-duplicate candidate thoughts.
pub mod dedup;
/// Error types and result aliases.
pub mod error;
/// Thought graph data model and node/edge pools.
pub mod graph;
/// Generation oracle trait and its data types.
pub mod oracle;
/// Growth topologies and node selection policies.
pub mod policy;
/// The thought structure orchestrator and chain extraction.
pub mod structure;

pub use config::StructureConfig;
pub use error::{OracleError, OracleResult, StructureError, StructureResult};
pub use graph::{NodeGrowth, NodePosition, ThoughtBackup, ThoughtEdge, ThoughtGraph, ThoughtNode};
pub use oracle::{Evaluation, Generation, GenerationOracle, SimilarityJudgement};
pub use policy::GrowthTopology;
pub use structure::{SinkChain, ThoughtStructure};
