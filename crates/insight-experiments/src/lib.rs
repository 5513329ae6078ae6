//! # Insight Experiments
//!
//! A/B experiment configuration, deterministic arm assignment, typed config
//! overrides, and append-only metric capture. The experiment registry is
//! process-wide: registration and metric writes are serialized behind a
//! `RwLock`; assignment is a read.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;
pub mod router;

pub use config::{
    predefined_experiments, AppliedExperiment, ArmConfig, ArmOverrides, Experiment,
    ExperimentStatus,
};
pub use metrics::{ArmSummary, ExperimentSummary, MetricRecord, MetricStats, MetricValue};
pub use router::ExperimentRouter;
