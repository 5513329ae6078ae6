//! Per-model pricing and cost estimation.

use std::collections::HashMap;

/// Cost per 1K tokens in cents, split by direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelCost {
    /// Cents per 1K input tokens.
    pub input_per_1k: f64,
    /// Cents per 1K output tokens.
    pub output_per_1k: f64,
}

/// Pricing table keyed by model label. Unknown models cost zero (the mock
/// provider intentionally has no entry).
#[derive(Debug, Clone)]
pub struct PricingTable {
    costs: HashMap<String, ModelCost>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let mut costs = HashMap::new();
        costs.insert(
            "gpt-5".to_string(),
            ModelCost {
                input_per_1k: 0.8,
                output_per_1k: 2.4,
            },
        );
        costs.insert(
            "gpt-5-mini".to_string(),
            ModelCost {
                input_per_1k: 0.25,
                output_per_1k: 0.75,
            },
        );
        costs.insert(
            "gpt-5-nano".to_string(),
            ModelCost {
                input_per_1k: 0.12,
                output_per_1k: 0.36,
            },
        );
        costs.insert(
            "claude-4.5".to_string(),
            ModelCost {
                input_per_1k: 0.3,
                output_per_1k: 1.5,
            },
        );
        costs.insert(
            "gemini-2.5-pro".to_string(),
            ModelCost {
                input_per_1k: 0.125,
                output_per_1k: 0.375,
            },
        );
        Self { costs }
    }
}

impl PricingTable {
    /// Create an empty table (every call costs zero).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            costs: HashMap::new(),
        }
    }

    /// Register or replace pricing for a model.
    pub fn set(&mut self, model: impl Into<String>, input_per_1k: f64, output_per_1k: f64) {
        self.costs.insert(
            model.into(),
            ModelCost {
                input_per_1k,
                output_per_1k,
            },
        );
    }

    /// Cost in cents for a call with separate input/output token counts.
    #[must_use]
    pub fn cost_cents(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        let Some(cost) = self.costs.get(model) else {
            return 0.0;
        };
        let total = (input_tokens as f64 / 1000.0) * cost.input_per_1k
            + (output_tokens as f64 / 1000.0) * cost.output_per_1k;
        (total * 10_000.0).round() / 10_000.0
    }

    /// Cost in cents when only a total token count is known.
    /// The total is split 70% input / 30% output for estimation.
    #[must_use]
    pub fn cost_cents_estimated(&self, model: &str, total_tokens: u64) -> f64 {
        let input_tokens = (total_tokens as f64 * 0.7) as u64;
        let output_tokens = (total_tokens as f64 * 0.3) as u64;
        self.cost_cents(model, input_tokens, output_tokens)
    }
}
