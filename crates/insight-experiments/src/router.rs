//! Arm assignment and the process-wide experiment registry.

use crate::config::{AppliedExperiment, ArmConfig, Experiment, ExperimentStatus};
use crate::metrics::{ArmSummary, ExperimentSummary, MetricRecord, MetricStats, MetricValue};
use insight_core::EngineResult;
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use tracing::{info, warn};

/// Routes requests to experiment arms and captures per-arm metrics.
///
/// Assignment is deterministic for a fixed `(user_id, experiment_id)` pair:
/// the md5 digest of `"{user_id}:{experiment_id}"`, taken as a big-endian
/// 128-bit integer modulo 10000 and normalized to `[0, 1)`, selects the arm
/// whose cumulative-weight window contains the value. Requests without a
/// user id sample an arm at random by weight.
#[derive(Default)]
pub struct ExperimentRouter {
    experiments: RwLock<HashMap<String, Experiment>>,
    metrics: RwLock<HashMap<String, HashMap<String, Vec<MetricRecord>>>>,
}

impl ExperimentRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router preloaded with experiments. Invalid experiments are
    /// skipped with a warning.
    #[must_use]
    pub fn with_experiments(experiments: Vec<Experiment>) -> Self {
        let router = Self::new();
        for experiment in experiments {
            if let Err(e) = router.register(experiment) {
                warn!(error = %e, "skipping invalid preloaded experiment");
            }
        }
        router
    }

    /// Register an experiment, validating its arm set first.
    pub fn register(&self, experiment: Experiment) -> EngineResult<()> {
        experiment.validate()?;

        let mut metrics = self.metrics.write();
        metrics.insert(
            experiment.experiment_id.clone(),
            experiment
                .arms
                .iter()
                .map(|arm| (arm.arm_id.clone(), Vec::new()))
                .collect(),
        );
        drop(metrics);

        info!(
            experiment_id = %experiment.experiment_id,
            arms = experiment.arms.len(),
            status = ?experiment.status,
            "registered experiment"
        );
        self.experiments
            .write()
            .insert(experiment.experiment_id.clone(), experiment);
        Ok(())
    }

    /// Select the arm for a request, if any experiment applies.
    ///
    /// With an explicit `experiment_id`, the experiment must exist and be
    /// active. Otherwise the first active experiment targeting `command`
    /// is used. Returns `None` when nothing applies.
    #[must_use]
    pub fn arm_for_request(
        &self,
        command: &str,
        user_id: Option<&str>,
        experiment_id: Option<&str>,
    ) -> Option<(String, ArmConfig)> {
        let experiments = self.experiments.read();

        let experiment = if let Some(id) = experiment_id {
            let experiment = experiments.get(id);
            match experiment {
                Some(exp) if exp.is_active() => exp,
                _ => {
                    warn!(experiment_id = id, "experiment not found or inactive");
                    return None;
                }
            }
        } else {
            experiments
                .values()
                .find(|exp| exp.is_active() && exp.applies_to(command))?
        };

        let active_arms = experiment.active_arms();
        if active_arms.is_empty() {
            warn!(experiment_id = %experiment.experiment_id, "no active arms");
            return None;
        }

        let arm = match user_id {
            Some(user_id) => deterministic_route(user_id, &experiment.experiment_id, &active_arms),
            None => random_route(&active_arms),
        };

        info!(
            experiment_id = %experiment.experiment_id,
            arm_id = %arm.arm_id,
            command,
            user = user_id.unwrap_or("anonymous"),
            "routed to experiment arm"
        );

        Some((experiment.experiment_id.clone(), arm.clone()))
    }

    /// Select an arm and produce the applied-experiment annotation the
    /// orchestrator merges into the request configuration. Returns `None`
    /// (leaving the base config unchanged) when no experiment applies.
    #[must_use]
    pub fn arm_config_override(
        &self,
        command: &str,
        user_id: Option<&str>,
        experiment_id: Option<&str>,
    ) -> Option<(AppliedExperiment, ArmConfig)> {
        let (selected_experiment, arm) = self.arm_for_request(command, user_id, experiment_id)?;
        Some((
            AppliedExperiment {
                experiment_id: selected_experiment,
                arm_id: arm.arm_id.clone(),
                arm_name: arm.name.clone(),
            },
            arm,
        ))
    }

    /// Append a metric record for an experiment arm. Unknown experiment or
    /// arm ids are ignored with a warning.
    pub fn record(
        &self,
        experiment_id: &str,
        arm_id: &str,
        metric_name: impl Into<String>,
        metric_value: impl Into<MetricValue>,
        metadata: Option<serde_json::Value>,
    ) {
        let mut metrics = self.metrics.write();
        let Some(arms) = metrics.get_mut(experiment_id) else {
            warn!(experiment_id, "unknown experiment");
            return;
        };
        let Some(records) = arms.get_mut(arm_id) else {
            warn!(experiment_id, arm_id, "unknown arm");
            return;
        };
        records.push(MetricRecord {
            metric_name: metric_name.into(),
            metric_value: metric_value.into(),
            timestamp: chrono::Utc::now(),
            metadata,
        });
    }

    /// Per-arm sample sizes and numeric statistics for an experiment.
    #[must_use]
    pub fn summary(&self, experiment_id: &str) -> Option<ExperimentSummary> {
        let experiments = self.experiments.read();
        let experiment = experiments.get(experiment_id)?;
        let metrics = self.metrics.read();
        let arm_metrics = metrics.get(experiment_id);

        let arms = experiment
            .arms
            .iter()
            .map(|arm| {
                let records = arm_metrics
                    .and_then(|arms| arms.get(&arm.arm_id))
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let mut by_name: HashMap<String, Vec<f64>> = HashMap::new();
                for record in records {
                    if let Some(value) = record.metric_value.as_number() {
                        by_name
                            .entry(record.metric_name.clone())
                            .or_default()
                            .push(value);
                    }
                }

                let statistics = by_name
                    .into_iter()
                    .filter_map(|(name, values)| {
                        MetricStats::compute(&values).map(|stats| (name, stats))
                    })
                    .collect();

                ArmSummary {
                    arm_id: arm.arm_id.clone(),
                    arm_name: arm.name.clone(),
                    sample_size: records.len(),
                    statistics,
                }
            })
            .collect();

        Some(ExperimentSummary {
            experiment_id: experiment.experiment_id.clone(),
            name: experiment.name.clone(),
            status: format!("{:?}", experiment.status).to_lowercase(),
            min_sample_size: experiment.min_sample_size,
            arms,
        })
    }

    /// Experiment ids currently receiving traffic.
    #[must_use]
    pub fn active_experiments(&self) -> Vec<String> {
        self.experiments
            .read()
            .iter()
            .filter(|(_, exp)| exp.is_active())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Set an experiment to active.
    pub fn activate(&self, experiment_id: &str) {
        if let Some(experiment) = self.experiments.write().get_mut(experiment_id) {
            experiment.status = ExperimentStatus::Active;
            info!(experiment_id, "activated experiment");
        }
    }

    /// Pause an experiment.
    pub fn deactivate(&self, experiment_id: &str) {
        if let Some(experiment) = self.experiments.write().get_mut(experiment_id) {
            experiment.status = ExperimentStatus::Paused;
            info!(experiment_id, "deactivated experiment");
        }
    }
}

/// Deterministic assignment for a `(user_id, experiment_id)` pair.
fn deterministic_route<'a>(
    user_id: &str,
    experiment_id: &str,
    arms: &[&'a ArmConfig],
) -> &'a ArmConfig {
    let digest = md5::compute(format!("{user_id}:{experiment_id}").as_bytes());
    let hash = u128::from_be_bytes(digest.0);
    let normalized = (hash % 10_000) as f64 / 10_000.0;

    let mut cumulative = 0.0;
    for arm in arms {
        cumulative += arm.weight;
        if normalized < cumulative {
            return arm;
        }
    }
    // Weight rounding can leave a sliver at the top of the window.
    arms[arms.len() - 1]
}

/// Weighted random assignment for anonymous requests.
fn random_route<'a>(arms: &[&'a ArmConfig]) -> &'a ArmConfig {
    let total: f64 = arms.iter().map(|arm| arm.weight).sum();
    let mut point = rand::thread_rng().gen_range(0.0..total.max(f64::MIN_POSITIVE));
    for arm in arms {
        if point < arm.weight {
            return arm;
        }
        point -= arm.weight;
    }
    arms[arms.len() - 1]
}
