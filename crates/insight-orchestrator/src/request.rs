//! The incoming command request.

use insight_config::BudgetConfig;
use insight_core::{Command, MemoryOp};
use serde::{Deserialize, Serialize};

/// A command request as submitted by a front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// The command to execute.
    pub command: Command,
    /// The user question (iterative Q&A, memory recall).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// The topic (events, graph, forecast, competitors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Retrieval window; defaults are per-command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    /// Response language tag (`en`, `ru`, `auto`).
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Source filter passed to retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// User identity for deterministic experiment assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Pin the request to a specific experiment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    /// Caller-supplied correlation id; allocated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Iteration depth override for `/ask`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Final document count override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_final: Option<usize>,
    /// Memory operation for `/memory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_op: Option<MemoryOp>,
    /// Focus domains for `/competitors`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    /// Prior agent outputs for `/synthesize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_outputs: Option<serde_json::Value>,
    /// Per-request budget cap override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetConfig>,
}

fn default_lang() -> String {
    "auto".to_string()
}

impl CommandRequest {
    /// Create a request for a command with defaults everywhere else.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            query: None,
            topic: None,
            window: None,
            lang: default_lang(),
            sources: None,
            user_id: None,
            experiment_id: None,
            correlation_id: None,
            depth: None,
            k_final: None,
            memory_op: None,
            domains: None,
            agent_outputs: None,
            budget: None,
        }
    }

    /// Builder: set the query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builder: set the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Builder: set the window.
    #[must_use]
    pub fn with_window(mut self, window: impl Into<String>) -> Self {
        self.window = Some(window.into());
        self
    }

    /// Builder: set the language tag.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Builder: set the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Builder: set the depth override.
    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Builder: set the budget caps.
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Builder: set the memory operation.
    #[must_use]
    pub fn with_memory_op(mut self, op: MemoryOp) -> Self {
        self.memory_op = Some(op);
        self
    }

    /// Builder: set the agent outputs for synthesis.
    #[must_use]
    pub fn with_agent_outputs(mut self, outputs: serde_json::Value) -> Self {
        self.agent_outputs = Some(outputs);
        self
    }

    /// The retrieval query: explicit query, then topic, then a placeholder.
    #[must_use]
    pub fn effective_query(&self) -> String {
        self.query
            .clone()
            .or_else(|| self.topic.clone())
            .unwrap_or_else(|| "primary question".to_string())
    }

    /// The retrieval window: explicit, or the per-command default.
    #[must_use]
    pub fn effective_window(&self) -> String {
        if let Some(window) = &self.window {
            return window.clone();
        }
        match self.command {
            Command::Ask => "7d",
            Command::Events => "12h",
            Command::Predict | Command::Competitors => "1w",
            _ => "24h",
        }
        .to_string()
    }
}
