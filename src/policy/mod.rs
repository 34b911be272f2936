//! Growth topologies and node selection policies.
//!
//! The orchestrator is agnostic to how the next node to expand is chosen:
//! each variant implements [`GrowthPolicy`] and the four topologies become
//! interchangeable strategy objects rather than a type hierarchy.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph::ThoughtGraph;

/// How the structure grows and which nodes the deduplicator may merge into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTopology {
    /// Preorder traversal; the first growable node wins.
    #[default]
    DepthFirst,
    /// Breadth-first traversal; the structure fills out level by level.
    LevelWise,
    /// One depth level at a time, expanding the highest-scoring growable
    /// node on the current frontier.
    BestLeafFirst,
    /// Level-wise growth where any existing node is a merge candidate, so
    /// similar branches converge into a true graph.
    Graph,
}

impl GrowthTopology {
    /// Get the topology name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthTopology::DepthFirst => "depth_first",
            GrowthTopology::LevelWise => "level_wise",
            GrowthTopology::BestLeafFirst => "best_leaf_first",
            GrowthTopology::Graph => "graph",
        }
    }

    /// Whether deduplication may merge across structurally distinct branches.
    pub fn merges_across_branches(&self) -> bool {
        matches!(self, GrowthTopology::Graph)
    }

    /// Build the selection policy for this topology.
    ///
    /// `max_length` is only consulted by the best-leaf-first policy, which
    /// stops selecting once the frontier reaches the depth cap.
    pub fn policy(&self, max_length: usize) -> Box<dyn GrowthPolicy> {
        match self {
            GrowthTopology::DepthFirst => Box::new(DepthFirstPolicy),
            // The converging-graph variant grows level by level as well.
            GrowthTopology::LevelWise | GrowthTopology::Graph => Box::new(LevelWisePolicy),
            GrowthTopology::BestLeafFirst => Box::new(BestLeafPolicy { max_length }),
        }
    }
}

impl std::fmt::Display for GrowthTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GrowthTopology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "depth_first" | "depth-first" => Ok(GrowthTopology::DepthFirst),
            "level_wise" | "level-wise" => Ok(GrowthTopology::LevelWise),
            "best_leaf_first" | "best-leaf-first" => Ok(GrowthTopology::BestLeafFirst),
            "graph" => Ok(GrowthTopology::Graph),
            _ => Err(format!("Unknown growth topology: {}", s)),
        }
    }
}

/// Strategy for choosing which growable node to expand next.
///
/// Returning `None` is the build loop's termination signal: no growable
/// node remains (or the topology's depth cap is reached).
pub trait GrowthPolicy: Send + Sync {
    /// Select the next node to expand, or `None` when the build is done.
    fn select_grow_node(&self, graph: &ThoughtGraph) -> Option<String>;
}

/// Preorder traversal from the root; first growable node encountered.
#[derive(Debug, Clone, Copy)]
pub struct DepthFirstPolicy;

impl GrowthPolicy for DepthFirstPolicy {
    fn select_grow_node(&self, graph: &ThoughtGraph) -> Option<String> {
        let root = graph.root()?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![root.id.clone()];

        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if graph.node(&id).is_some_and(|n| n.is_growable()) {
                return Some(id);
            }
            // Reverse so the first-created child is visited first.
            for child in graph.children_of(&id).iter().rev() {
                stack.push(child.clone());
            }
        }
        None
    }
}

/// Breadth-first traversal from the root; first growable node, level by
/// level.
#[derive(Debug, Clone, Copy)]
pub struct LevelWisePolicy;

impl GrowthPolicy for LevelWisePolicy {
    fn select_grow_node(&self, graph: &ThoughtGraph) -> Option<String> {
        let root = graph.root()?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        visited.insert(root.id.clone());
        queue.push_back(root.id.clone());

        while let Some(id) = queue.pop_front() {
            if graph.node(&id).is_some_and(|n| n.is_growable()) {
                return Some(id);
            }
            for child in graph.children_of(&id) {
                if visited.insert(child.clone()) {
                    queue.push_back(child.clone());
                }
            }
        }
        None
    }
}

/// Expands one depth level at a time, always picking the highest-scoring
/// growable node on the current frontier.
#[derive(Debug, Clone, Copy)]
pub struct BestLeafPolicy {
    /// Depth cap; once the frontier reaches it, selection stops.
    pub max_length: usize,
}

impl GrowthPolicy for BestLeafPolicy {
    fn select_grow_node(&self, graph: &ThoughtGraph) -> Option<String> {
        graph.root()?;
        let frontier = graph.max_step_index();
        if frontier >= self.max_length {
            return None;
        }

        // Explicit scan over the frontier level; insertion order breaks ties.
        let mut best: Option<(String, f64)> = None;
        for node in graph.nodes() {
            if node.step_index != frontier || !node.is_growable() {
                continue;
            }
            if node.is_root() {
                // The root has no score and is automatically eligible.
                return Some(node.id.clone());
            }
            let score = node.score.unwrap_or(0.0);
            match &best {
                Some((_, best_score)) if score <= *best_score => {}
                _ => best = Some((node.id.clone(), score)),
            }
        }
        best.map(|(id, _)| id)
    }
}
