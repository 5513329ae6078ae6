//! # Insight Core
//!
//! Core types, envelopes, and error handling for the news insight engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - The command set and per-command parameter struct
//! - The retrieval document contract
//! - Response and error envelopes with their validation limits
//! - Command-specific result variants
//! - The engine error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod document;
pub mod error;
pub mod lang;
pub mod response;
pub mod result;
pub mod text;

// Re-export commonly used types
pub use command::{Command, CommandParams, MemoryOp};
pub use document::{merge_documents, Document};
pub use error::{EngineError, EngineResult, ErrorCode};
pub use lang::Lang;
pub use response::{
    AnalysisResponse, EngineResponse, ErrorResponse, Evidence, EvidenceRef, Insight, InsightKind,
    Meta,
};
pub use result::{
    Action, CausalLink, CommandResult, CompetitorsResult, ConfidenceInterval, Conflict,
    EventRecord, EventsResult, ForecastDirection, ForecastDriver, ForecastItem, ForecastResult,
    GraphEdge, GraphNode, GraphPath, GraphResult, IterativeResult, IterativeStep, MemoryRecord,
    MemoryResult, MemoryStoreItem, MemorySuggestion, OverlapEntry, Positioning, SentimentDelta,
    Stance, Subgraph, SynthesisResult, TimelinePosition, TimelineRelation,
};
pub use text::trim_chars;
