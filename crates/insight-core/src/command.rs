//! The command set and per-command execution parameters.

use serde::{Deserialize, Serialize};

/// A command the engine can execute, as submitted by a front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `/ask` — iterative deep-dive question answering.
    Ask,
    /// `/events` — event linkage with timeline and causality.
    Events,
    /// `/graph` — knowledge-graph exploration.
    Graph,
    /// `/memory` — long-term memory suggest/store/recall.
    Memory,
    /// `/synthesize` — cross-agent synthesis of prior outputs.
    Synthesize,
    /// `/trends` — short-horizon trend forecast.
    Trends,
    /// `/analyze` — parallel keyword/sentiment/topic analysis.
    Analyze,
    /// `/predict` — trend forecasting over the request window.
    Predict,
    /// `/competitors` — competitor coverage analysis.
    Competitors,
    /// `/dashboard` — aggregated dashboard view (feature-gated).
    Dashboard,
    /// `/reports` — synthesis-family report generation.
    Reports,
}

impl Command {
    /// Parse a slash-command string such as `"/ask"` or `"/events link"`.
    ///
    /// Matching is prefix-based on the command word, mirroring how chat
    /// front-ends pass through trailing arguments.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let word = input.trim().trim_start_matches('/');
        let word = word.split_whitespace().next().unwrap_or(word);
        match word {
            "ask" => Some(Self::Ask),
            "events" => Some(Self::Events),
            "graph" => Some(Self::Graph),
            "memory" => Some(Self::Memory),
            "synthesize" => Some(Self::Synthesize),
            "trends" => Some(Self::Trends),
            "analyze" => Some(Self::Analyze),
            "predict" => Some(Self::Predict),
            "competitors" => Some(Self::Competitors),
            "dashboard" => Some(Self::Dashboard),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }

    /// The canonical slash form, e.g. `"/ask"`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "/ask",
            Self::Events => "/events",
            Self::Graph => "/graph",
            Self::Memory => "/memory",
            Self::Synthesize => "/synthesize",
            Self::Trends => "/trends",
            Self::Analyze => "/analyze",
            Self::Predict => "/predict",
            Self::Competitors => "/competitors",
            Self::Dashboard => "/dashboard",
            Self::Reports => "/reports",
        }
    }

    /// Whether the command needs retrieved documents to proceed.
    ///
    /// Memory recall and synthesis over caller-supplied agent outputs can run
    /// without retrieval; everything else returns NO_DATA on an empty corpus.
    #[must_use]
    pub fn requires_documents(&self, memory_op: Option<MemoryOp>) -> bool {
        match self {
            Self::Memory => !matches!(memory_op, Some(MemoryOp::Recall)),
            Self::Synthesize => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory agent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    /// Propose what is worth storing from the retrieved documents.
    Suggest,
    /// Persist memories derived from the retrieved documents.
    Store,
    /// Semantic recall of previously stored memories.
    #[default]
    Recall,
}

/// Tunable execution parameters for a single request.
///
/// One struct covers all command families because the budget degradation
/// table mutates parameters across families (e.g. the global `k_final`
/// clamp). Fields irrelevant to a command are simply ignored by its agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    /// Iteration count for the iterative agent (clamped to 1..=3).
    pub depth: u32,
    /// Run the sufficiency self-check between iterations.
    pub self_check: bool,
    /// Ask retrieval to rerank results.
    pub use_rerank: bool,
    /// Final document count requested from retrieval.
    pub k_final: usize,
    /// Graph traversal hop limit.
    pub hop_limit: u32,
    /// Graph node cap.
    pub max_nodes: usize,
    /// Graph edge cap.
    pub max_edges: usize,
    /// Include alternative event interpretations.
    pub include_alternatives: bool,
    /// Memory operation for `/memory`.
    pub memory_op: MemoryOp,
}

impl Default for CommandParams {
    fn default() -> Self {
        Self {
            depth: 3,
            self_check: true,
            use_rerank: true,
            k_final: 10,
            hop_limit: 3,
            max_nodes: 200,
            max_edges: 600,
            include_alternatives: true,
            memory_op: MemoryOp::Recall,
        }
    }
}
