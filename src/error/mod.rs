//! Error types for the thought structure engine.
//!
//! Integrity errors inside the engine (pool/graph invariant violations) are
//! never silently swallowed; oracle-side errors carry the identity of the
//! node that was being expanded so callers can retry or abandon without
//! losing the already-built portion of the structure.

use thiserror::Error;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum StructureError {
    /// A path query between two nodes that are not connected. This is a
    /// structural invariant violation and should never occur while the
    /// orchestrator's invariants hold.
    #[error("No path from node {from} to node {to}")]
    UnreachableNode {
        /// Identity of the path origin.
        from: String,
        /// Identity of the unreachable destination.
        to: String,
    },

    /// An operation referenced a node identity that is not in the pool.
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// The unknown node identity.
        node_id: String,
    },

    /// A pool or graph invariant was violated (duplicate root, dangling
    /// edge endpoint, mismatched insert).
    #[error("Structure integrity violation: {message}")]
    Integrity {
        /// Description of the violated invariant.
        message: String,
    },

    /// The generation oracle failed while a node was being expanded. The
    /// structure is left in its last consistent state and may be resumed
    /// or reset.
    #[error("Oracle failure while expanding node {node_id}: {source}")]
    Oracle {
        /// Identity of the node that was being expanded.
        node_id: String,
        /// The underlying oracle error.
        #[source]
        source: OracleError,
    },

    /// Invalid configuration was passed to the orchestrator.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the rejected setting.
        message: String,
    },
}

/// Errors produced at the generation oracle boundary.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle backend could not be reached.
    #[error("Oracle unavailable: {message} (retries: {retries})")]
    Unavailable {
        /// Backend failure description.
        message: String,
        /// Number of retries already attempted by the implementation.
        retries: u32,
    },

    /// The oracle backend returned an API-level error.
    #[error("Oracle API error: {status} - {message}")]
    Api {
        /// Backend status code.
        status: u16,
        /// Backend error message.
        message: String,
    },

    /// The oracle returned a response the engine cannot use, such as a
    /// score list shorter than the candidate list or a score outside [0,1].
    #[error("Invalid oracle response: {message}")]
    InvalidResponse {
        /// Description of the malformed response.
        message: String,
    },

    /// The oracle request timed out.
    #[error("Oracle request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },
}

/// Result type alias for engine operations.
pub type StructureResult<T> = Result<T, StructureError>;

/// Result type alias for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;
