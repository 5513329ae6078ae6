//! Per-arm metric records and summaries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A metric value: numeric or categorical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric observation.
    Number(f64),
    /// Categorical observation.
    Text(String),
}

impl MetricValue {
    /// The numeric value, when this observation is numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One recorded observation for an experiment arm. Records are append-only
/// and kept in call-completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Metric name, e.g. `latency_s` or `cost_cents`.
    pub metric_name: String,
    /// Observed value.
    pub metric_value: MetricValue,
    /// Capture timestamp, UTC.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Optional free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Aggregate statistics for one numeric metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Minimum observation.
    pub min: f64,
    /// Maximum observation.
    pub max: f64,
    /// Number of numeric observations.
    pub count: usize,
}

impl MetricStats {
    /// Compute stats over numeric values; `None` when the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean: sum / values.len() as f64,
            min,
            max,
            count: values.len(),
        })
    }
}

/// Summary for one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    /// The arm.
    pub arm_id: String,
    /// The arm's display name.
    pub arm_name: String,
    /// Total records (numeric and categorical).
    pub sample_size: usize,
    /// Per-metric statistics over numeric observations.
    pub statistics: HashMap<String, MetricStats>,
}

/// Summary for a whole experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// The experiment.
    pub experiment_id: String,
    /// Display name.
    pub name: String,
    /// Current status, serialized.
    pub status: String,
    /// Advisory minimum samples per arm.
    pub min_sample_size: u32,
    /// Per-arm summaries, in arm declaration order.
    pub arms: Vec<ArmSummary>,
}
