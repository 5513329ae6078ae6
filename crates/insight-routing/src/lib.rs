//! # Insight Routing
//!
//! The model router: tries a primary model and its fallback chain in order,
//! bounds every attempt with a timeout, accounts cost per call, and reports
//! latency/cost metrics. A single router instance is safe for concurrent use.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod cost;
pub mod router;

pub use context::build_context;
pub use cost::PricingTable;
pub use router::{CallOptions, CallUsage, ModelReply, ModelRouter};
