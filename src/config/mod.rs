//! Configuration for the thought structure engine.
//!
//! All thresholds and caps live in an explicit [`StructureConfig`] passed to
//! the orchestrator's constructor; there is no process-wide state.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::StructureError;
use crate::policy::GrowthTopology;

/// Configuration recognized by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureConfig {
    /// Number of candidate thoughts requested per expansion step.
    #[serde(default = "default_branch_factor")]
    pub branch_factor: usize,
    /// Maximum chain depth; nodes at this depth become sinks.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Similarity threshold above which a candidate is a merge suspect.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Maximum score difference for a candidate to merge into an existing node.
    #[serde(default = "default_max_score_delta")]
    pub max_score_delta: f64,
    /// How the structure grows and which nodes are merge-eligible.
    #[serde(default)]
    pub growth_topology: GrowthTopology,
    /// Marker string whose presence in a thought flags it as a solution.
    /// Solutions bypass deduplication and become sinks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_marker: Option<String>,
}

fn default_branch_factor() -> usize {
    1
}

fn default_max_length() -> usize {
    3
}

fn default_min_similarity() -> f64 {
    0.8
}

fn default_max_score_delta() -> f64 {
    0.1
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            branch_factor: default_branch_factor(),
            max_length: default_max_length(),
            min_similarity: default_min_similarity(),
            max_score_delta: default_max_score_delta(),
            growth_topology: GrowthTopology::default(),
            solution_marker: None,
        }
    }
}

impl StructureConfig {
    /// Load configuration from `STRUCTURE_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, StructureError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let growth_topology = match env::var("STRUCTURE_GROWTH_TOPOLOGY") {
            Ok(raw) => raw
                .parse::<GrowthTopology>()
                .map_err(|e| StructureError::Config { message: e })?,
            Err(_) => GrowthTopology::default(),
        };

        let config = Self {
            branch_factor: env::var("STRUCTURE_BRANCH_FACTOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_branch_factor),
            max_length: env::var("STRUCTURE_MAX_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_length),
            min_similarity: env::var("STRUCTURE_MIN_SIMILARITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_similarity),
            max_score_delta: env::var("STRUCTURE_MAX_SCORE_DELTA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_score_delta),
            growth_topology,
            solution_marker: env::var("STRUCTURE_SOLUTION_MARKER")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the build loop cannot run with.
    pub fn validate(&self) -> Result<(), StructureError> {
        if self.branch_factor == 0 {
            return Err(StructureError::Config {
                message: "branch_factor must be at least 1".to_string(),
            });
        }
        if self.max_length == 0 {
            return Err(StructureError::Config {
                message: "max_length must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(StructureError::Config {
                message: format!(
                    "min_similarity must be within [0, 1], got {}",
                    self.min_similarity
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.max_score_delta) {
            return Err(StructureError::Config {
                message: format!(
                    "max_score_delta must be within [0, 1], got {}",
                    self.max_score_delta
                ),
            });
        }
        if let Some(marker) = &self.solution_marker {
            if marker.is_empty() {
                return Err(StructureError::Config {
                    message: "solution_marker must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set the number of candidates requested per expansion.
    pub fn with_branch_factor(mut self, branch_factor: usize) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    /// Set the maximum chain depth.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the deduplication similarity threshold.
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set the deduplication score-closeness threshold.
    pub fn with_max_score_delta(mut self, max_score_delta: f64) -> Self {
        self.max_score_delta = max_score_delta;
        self
    }

    /// Set the growth topology.
    pub fn with_growth_topology(mut self, topology: GrowthTopology) -> Self {
        self.growth_topology = topology;
        self
    }

    /// Set the solution marker string.
    pub fn with_solution_marker(mut self, marker: impl Into<String>) -> Self {
        self.solution_marker = Some(marker.into());
        self
    }
}
