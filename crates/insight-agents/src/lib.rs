//! # Insight Agents
//!
//! The reasoning agents behind each command family. Every agent receives its
//! collaborators (model router, retrieval client, memory store) through its
//! constructor, consults the budget ledger before expensive subroutines, and
//! populates its required result fields even on partial failure, appending
//! fallback notes to the warning list.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analysis;
pub mod causality;
pub mod competitors;
pub mod entities;
pub mod events;
pub mod forecast;
pub mod graph;
pub mod iterative;
pub mod memory;
pub mod synthesis;

pub use analysis::{run_analysis, AnalysisFinding, AnalysisToggles};
pub use causality::CausalityReasoner;
pub use competitors::CompetitorAgent;
pub use events::EventExtractor;
pub use forecast::ForecastAgent;
pub use graph::GraphAgent;
pub use iterative::{IterativeAgent, IterativeRequest};
pub use memory::MemoryAgent;
pub use synthesis::SynthesisAgent;

/// The model chain a request resolved to after experiment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    /// First model tried.
    pub primary: String,
    /// Ordered fallbacks.
    pub fallback: Vec<String>,
}

impl ModelChain {
    /// Create a chain.
    #[must_use]
    pub fn new(primary: impl Into<String>, fallback: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback,
        }
    }
}
