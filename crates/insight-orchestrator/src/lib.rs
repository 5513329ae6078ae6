//! # Insight Orchestrator
//!
//! The per-command entry point: builds the request context (experiment arm
//! overrides, budget caps, language), drives retrieval, dispatches to the
//! agents, assembles the response envelope, sanitizes and validates it, and
//! emits metrics. The orchestrator never throws across its boundary; every
//! fault becomes an error envelope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builders;
pub mod engine;
pub mod orchestrator;
pub mod request;

pub use engine::EngineBuilder;
pub use orchestrator::Orchestrator;
pub use request::CommandRequest;
