//! The engine error taxonomy.
//!
//! Every fault inside agents and the router is converted into an
//! [`EngineError`] and, at the orchestrator boundary, into the closed
//! [`ErrorCode`] set surfaced to clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Closed set of error codes surfaced in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A response violated a policy or shape invariant.
    ValidationFailed,
    /// Retrieval returned zero documents for a command that requires them.
    NoData,
    /// A token/cost/time cap was strictly exceeded.
    BudgetExceeded,
    /// Every model in the fallback chain failed.
    ModelUnavailable,
    /// Any uncategorized fault.
    Internal,
}

impl ErrorCode {
    /// Whether a request with this error is worth retrying unchanged.
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::ValidationFailed | Self::BudgetExceeded => false,
            Self::NoData | Self::ModelUnavailable | Self::Internal => true,
        }
    }
}

/// Errors that can occur inside the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Every model in the fallback chain failed.
    #[error("All models failed. Last error: {last_error}. Tried: {attempted:?}")]
    ModelUnavailable {
        /// Message from the final failed attempt.
        last_error: String,
        /// Model labels tried, in order.
        attempted: Vec<String>,
    },

    /// A budget cap was strictly exceeded.
    #[error("Budget exceeded: {message}")]
    BudgetExceeded {
        /// Which counter crossed its cap, with the observed values.
        message: String,
    },

    /// A response failed policy or shape validation.
    #[error("Validation failed: {message}")]
    Validation {
        /// First violated invariant.
        message: String,
    },

    /// Retrieval returned no documents for a command that requires them.
    #[error("No documents matched the request")]
    NoData,

    /// The retrieval backend failed.
    #[error("Retrieval failed: {message}")]
    Retrieval {
        /// Backend error description.
        message: String,
    },

    /// A single provider call failed.
    #[error("Provider {provider} failed: {message}")]
    Provider {
        /// Provider family name.
        provider: String,
        /// Provider error description.
        message: String,
    },

    /// A provider call exceeded its timeout.
    #[error("Timeout: {model} after {seconds}s")]
    Timeout {
        /// The model label being called.
        model: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// A provider reply could not be parsed.
    #[error("Failed to parse provider response: {message}")]
    Parse {
        /// Parse error description.
        message: String,
    },

    /// Invalid engine or experiment configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is invalid.
        message: String,
    },

    /// The requested feature is disabled by configuration.
    #[error("Feature disabled: {feature}")]
    FeatureDisabled {
        /// The gated feature or command.
        feature: String,
    },

    /// Any uncategorized internal fault.
    #[error("Internal error: {message}")]
    Internal {
        /// Fault description.
        message: String,
    },
}

impl EngineError {
    /// Create a provider error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map the fault onto the closed client-facing code set.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ModelUnavailable { .. } => ErrorCode::ModelUnavailable,
            Self::BudgetExceeded { .. } => ErrorCode::BudgetExceeded,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::NoData => ErrorCode::NoData,
            Self::Retrieval { .. }
            | Self::Provider { .. }
            | Self::Timeout { .. }
            | Self::Parse { .. }
            | Self::Configuration { .. }
            | Self::FeatureDisabled { .. }
            | Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Whether the request is worth retrying unchanged.
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            // Feature gates are configuration decisions, not transient faults.
            Self::FeatureDisabled { .. } => false,
            other => other.code().retryable(),
        }
    }

    /// Short non-technical sentence for end users.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelUnavailable { .. } => "Analysis models are temporarily unavailable".into(),
            Self::BudgetExceeded { .. } => "The request exceeded its resource budget".into(),
            Self::Validation { .. } => "The response did not meet quality requirements".into(),
            Self::NoData => "No matching articles were found".into(),
            Self::Retrieval { .. } => "Article search is temporarily unavailable".into(),
            Self::FeatureDisabled { feature } => format!("{feature} is currently disabled"),
            _ => "Command execution failed".into(),
        }
    }
}
