//! Experiment and arm configuration.

use insight_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Experiment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Defined but not yet receiving traffic.
    #[default]
    Draft,
    /// Receiving traffic.
    Active,
    /// Temporarily not receiving traffic.
    Paused,
    /// Finished; kept for its metrics.
    Completed,
}

/// Partial configuration overrides an arm applies on top of the base config.
///
/// Absent fields leave the base value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmOverrides {
    /// Override the primary model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_model: Option<String>,
    /// Override the fallback chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_models: Option<Vec<String>>,
    /// Override the iteration depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Override rerank usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_rerank: Option<bool>,
    /// Override the final document count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_final: Option<usize>,
    /// Override the self-check toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_check: Option<bool>,
}

/// One traffic variant within an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmConfig {
    /// Arm identifier, unique within the experiment.
    pub arm_id: String,
    /// Display name.
    pub name: String,
    /// Traffic allocation in `[0.0, 1.0]`.
    pub weight: f64,
    /// Configuration overrides applied when this arm is selected.
    #[serde(default)]
    pub config: ArmOverrides,
    /// Whether the arm receives traffic.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ArmConfig {
    /// Create an enabled arm.
    #[must_use]
    pub fn new(arm_id: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            arm_id: arm_id.into(),
            name: name.into(),
            weight,
            config: ArmOverrides::default(),
            enabled: true,
        }
    }

    /// Builder: set the overrides.
    #[must_use]
    pub fn with_config(mut self, config: ArmOverrides) -> Self {
        self.config = config;
        self
    }

    /// Builder: disable the arm.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// The annotation attached to a merged configuration when an arm applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedExperiment {
    /// The experiment that routed this request.
    pub experiment_id: String,
    /// The selected arm.
    pub arm_id: String,
    /// The selected arm's display name.
    pub arm_name: String,
}

/// An A/B experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// Unique experiment identifier.
    pub experiment_id: String,
    /// Display name.
    pub name: String,
    /// What the experiment tests.
    #[serde(default)]
    pub description: String,
    /// Ordered arms.
    pub arms: Vec<ArmConfig>,
    /// Command prefixes the experiment targets; empty targets everything.
    #[serde(default)]
    pub target_commands: Vec<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ExperimentStatus,
    /// Advisory minimum samples per arm before analysis.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u32,
    /// Advisory maximum run length in days.
    #[serde(default = "default_max_duration_days")]
    pub max_duration_days: u32,
}

fn default_min_sample_size() -> u32 {
    100
}

fn default_max_duration_days() -> u32 {
    30
}

impl Experiment {
    /// Create a draft experiment.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>, arms: Vec<ArmConfig>) -> Self {
        let name = name.into();
        Self {
            experiment_id: experiment_id.into(),
            description: name.clone(),
            name,
            arms,
            target_commands: Vec::new(),
            status: ExperimentStatus::Draft,
            min_sample_size: default_min_sample_size(),
            max_duration_days: default_max_duration_days(),
        }
    }

    /// Builder: set the target command prefixes.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.target_commands = targets;
        self
    }

    /// Builder: set the status.
    #[must_use]
    pub fn with_status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Validate the arm set: each weight in `[0, 1]`, enabled weights sum
    /// within `[0.99, 1.01]`, arm ids unique.
    pub fn validate(&self) -> EngineResult<()> {
        if self.arms.is_empty() {
            return Err(EngineError::configuration(format!(
                "Experiment {} has no arms",
                self.experiment_id
            )));
        }
        for arm in &self.arms {
            if !(0.0..=1.0).contains(&arm.weight) {
                return Err(EngineError::configuration(format!(
                    "Arm weight must be in [0.0, 1.0], got {}",
                    arm.weight
                )));
            }
        }
        let total_weight: f64 = self
            .arms
            .iter()
            .filter(|arm| arm.enabled)
            .map(|arm| arm.weight)
            .sum();
        if !(0.99..=1.01).contains(&total_weight) {
            return Err(EngineError::configuration(format!(
                "Total arm weights must sum to 1.0, got {total_weight:.3}"
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for arm in &self.arms {
            if !seen.insert(arm.arm_id.as_str()) {
                return Err(EngineError::configuration("Arm IDs must be unique"));
            }
        }
        Ok(())
    }

    /// Enabled arms, in declaration order.
    #[must_use]
    pub fn active_arms(&self) -> Vec<&ArmConfig> {
        self.arms.iter().filter(|arm| arm.enabled).collect()
    }

    /// Whether the experiment is receiving traffic.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ExperimentStatus::Active
    }

    /// Whether the experiment targets the given command.
    #[must_use]
    pub fn applies_to(&self, command: &str) -> bool {
        if self.target_commands.is_empty() {
            return true;
        }
        self.target_commands
            .iter()
            .any(|target| command.starts_with(target.as_str()))
    }
}

/// The predefined draft experiments shipped with the engine.
#[must_use]
pub fn predefined_experiments() -> Vec<Experiment> {
    vec![
        Experiment::new(
            "model_routing_ask_001",
            "GPT-5 vs Claude 4.5 for /ask",
            vec![
                ArmConfig::new("control", "GPT-5 Primary", 0.5).with_config(ArmOverrides {
                    primary_model: Some("gpt-5".into()),
                    fallback_models: Some(vec!["claude-4.5".into(), "gemini-2.5-pro".into()]),
                    ..Default::default()
                }),
                ArmConfig::new("treatment", "Claude 4.5 Primary", 0.5).with_config(ArmOverrides {
                    primary_model: Some("claude-4.5".into()),
                    fallback_models: Some(vec!["gpt-5".into(), "gemini-2.5-pro".into()]),
                    ..Default::default()
                }),
            ],
        )
        .with_targets(vec!["/ask".into()]),
        Experiment::new(
            "depth_threshold_001",
            "Iterative depth=2 vs depth=3",
            vec![
                ArmConfig::new("control", "Depth 2", 0.5).with_config(ArmOverrides {
                    depth: Some(2),
                    ..Default::default()
                }),
                ArmConfig::new("treatment", "Depth 3", 0.5).with_config(ArmOverrides {
                    depth: Some(3),
                    ..Default::default()
                }),
            ],
        )
        .with_targets(vec!["/ask".into()]),
        Experiment::new(
            "rerank_strategy_001",
            "Rerank enabled vs disabled",
            vec![
                ArmConfig::new("control", "No Rerank", 0.5).with_config(ArmOverrides {
                    use_rerank: Some(false),
                    ..Default::default()
                }),
                ArmConfig::new("treatment", "With Rerank", 0.5).with_config(ArmOverrides {
                    use_rerank: Some(true),
                    ..Default::default()
                }),
            ],
        )
        .with_targets(vec!["/ask".into(), "/events".into(), "/graph".into()]),
    ]
}
