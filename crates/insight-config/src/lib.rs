//! # Insight Config
//!
//! Typed configuration structs and the environment loader. String-keyed
//! dictionaries never cross a crate boundary: every consumer receives a
//! struct with the fields it needs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-request budget caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum total tokens per request.
    pub max_tokens: u64,
    /// Maximum cost per request, in cents.
    pub budget_cents: f64,
    /// Maximum wall-clock seconds per request.
    pub timeout_s: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            budget_cents: 50.0,
            timeout_s: 30.0,
        }
    }
}

/// Retrieval knobs passed through to the retrieval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Ask retrieval to rerank fused results.
    pub enable_rerank: bool,
    /// Retrieval service base URL; absent in offline/test deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enable_rerank: true,
            base_url: None,
        }
    }
}

/// Per-mode feature gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Keyword sub-analysis within `/analyze`.
    pub enable_analyze_keywords: bool,
    /// Sentiment sub-analysis within `/analyze`.
    pub enable_analyze_sentiment: bool,
    /// Topic sub-analysis within `/analyze`.
    pub enable_analyze_topics: bool,
    /// The `/dashboard` command.
    pub enable_dashboard: bool,
    /// The `/reports` command.
    pub enable_reports: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_analyze_keywords: true,
            enable_analyze_sentiment: true,
            enable_analyze_topics: true,
            enable_dashboard: false,
            enable_reports: true,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default first model in the chain.
    pub primary_model: String,
    /// Ordered fallback models.
    pub fallback_models: Vec<String>,
    /// Per-request budget caps.
    pub budget: BudgetConfig,
    /// Retrieval knobs.
    pub retrieval: RetrievalConfig,
    /// Feature gates.
    pub features: FeatureFlags,
    /// Blacklisted domain suffixes.
    pub blacklist_domains: Vec<String>,
    /// Whitelisted domain suffixes.
    pub whitelist_domains: Vec<String>,
    /// Port the hosting harness binds for metrics scraping.
    pub metrics_port: u16,
    /// Fallback log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Engine version string stamped into response metadata.
    pub version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_model: "gpt-5".to_string(),
            fallback_models: vec!["claude-4.5".to_string(), "gemini-2.5-pro".to_string()],
            budget: BudgetConfig::default(),
            retrieval: RetrievalConfig::default(),
            features: FeatureFlags::default(),
            blacklist_domains: Vec::new(),
            whitelist_domains: Vec::new(),
            metrics_port: 9464,
            log_level: "info".to_string(),
            version: format!("insight-v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset. Malformed numeric values keep the default with a
    /// warning rather than failing startup.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("PRIMARY_MODEL") {
            if !model.is_empty() {
                config.primary_model = model;
            }
        }
        if let Ok(models) = std::env::var("FALLBACK_MODELS") {
            if !models.is_empty() {
                config.fallback_models = models
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
            }
        }

        config.budget.max_tokens =
            parse_env("BUDGET_MAX_TOKENS", config.budget.max_tokens);
        config.budget.budget_cents =
            parse_env("BUDGET_CENTS", config.budget.budget_cents);
        config.budget.timeout_s = parse_env("BUDGET_TIMEOUT_S", config.budget.timeout_s);

        config.retrieval.enable_rerank =
            parse_env("RETRIEVAL_ENABLE_RERANK", config.retrieval.enable_rerank);
        if let Ok(url) = std::env::var("RETRIEVAL_BASE_URL") {
            if !url.is_empty() {
                config.retrieval.base_url = Some(url);
            }
        }

        config.features.enable_analyze_keywords = parse_env(
            "FEATURES_ENABLE_ANALYZE_KEYWORDS",
            config.features.enable_analyze_keywords,
        );
        config.features.enable_analyze_sentiment = parse_env(
            "FEATURES_ENABLE_ANALYZE_SENTIMENT",
            config.features.enable_analyze_sentiment,
        );
        config.features.enable_analyze_topics = parse_env(
            "FEATURES_ENABLE_ANALYZE_TOPICS",
            config.features.enable_analyze_topics,
        );
        config.features.enable_dashboard =
            parse_env("FEATURES_ENABLE_DASHBOARD", config.features.enable_dashboard);
        config.features.enable_reports =
            parse_env("FEATURES_ENABLE_REPORTS", config.features.enable_reports);

        if let Ok(domains) = std::env::var("BLACKLIST_DOMAINS") {
            config.blacklist_domains = split_domains(&domains);
        }
        if let Ok(domains) = std::env::var("WHITELIST_DOMAINS") {
            config.whitelist_domains = split_domains(&domains);
        }

        config.metrics_port = parse_env("METRICS_PORT", config.metrics_port);
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            if !level.is_empty() {
                config.log_level = level;
            }
        }

        config
    }
}

fn split_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw.parse().unwrap_or_else(|_| {
            warn!(key, raw, "malformed value in environment, keeping default");
            default
        }),
        _ => default,
    }
}
