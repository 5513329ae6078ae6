//! # Insight Telemetry
//!
//! Prometheus metric definitions and tracing subscriber setup. The metric
//! registry is process-wide; the hosting harness binds the scrape endpoint
//! and calls [`metrics::render`] to serve it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{
    record_model_router_call, record_orchestrator_error, record_orchestrator_start,
    record_orchestrator_success, render,
};
pub use tracing_setup::{init_tracing, TracingConfig, TracingInitError};
