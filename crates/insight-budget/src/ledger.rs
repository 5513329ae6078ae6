//! The per-request budget ledger.

use insight_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Caps for a single request: tokens, cents, seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetCaps {
    /// Maximum total tokens.
    pub max_tokens: u64,
    /// Maximum cost in cents.
    pub budget_cents: f64,
    /// Maximum wall-clock seconds.
    pub timeout_s: f64,
}

impl Default for BudgetCaps {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            budget_cents: 50.0,
            timeout_s: 30.0,
        }
    }
}

/// Remaining budget as percentages of each cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemainingBudget {
    /// Remaining token budget, percent.
    pub tokens_pct: f64,
    /// Remaining cost budget, percent.
    pub cost_pct: f64,
    /// Remaining time budget, percent.
    pub time_pct: f64,
}

impl RemainingBudget {
    /// The tightest remaining dimension.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.tokens_pct.min(self.cost_pct).min(self.time_pct)
    }
}

/// Snapshot of the ledger for logging and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Tokens spent so far.
    pub spent_tokens: u64,
    /// Cents spent so far.
    pub spent_cents: f64,
    /// Seconds spent so far.
    pub spent_seconds: f64,
    /// The request caps.
    pub caps: BudgetCaps,
    /// Remaining budget percentages.
    pub remaining: RemainingBudget,
    /// Warnings accumulated by degradation decisions.
    pub warnings: Vec<String>,
}

/// Tracks token/cost/time spend for one request and decides when to degrade.
///
/// The ledger is single-owner: the orchestrator creates it, agents receive a
/// mutable borrow, and it is dropped with the request.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    caps: BudgetCaps,
    spent_tokens: u64,
    spent_cents: f64,
    spent_seconds: f64,
    warnings: Vec<String>,
}

impl BudgetLedger {
    /// Create a fresh ledger with the given caps.
    #[must_use]
    pub fn new(caps: BudgetCaps) -> Self {
        Self {
            caps,
            spent_tokens: 0,
            spent_cents: 0.0,
            spent_seconds: 0.0,
            warnings: Vec::new(),
        }
    }

    /// Create a ledger with the default caps.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BudgetCaps::default())
    }

    /// The request caps.
    #[must_use]
    pub fn caps(&self) -> BudgetCaps {
        self.caps
    }

    /// Tokens spent so far.
    #[must_use]
    pub fn spent_tokens(&self) -> u64 {
        self.spent_tokens
    }

    /// Cents spent so far.
    #[must_use]
    pub fn spent_cents(&self) -> f64 {
        self.spent_cents
    }

    /// Seconds spent so far.
    #[must_use]
    pub fn spent_seconds(&self) -> f64 {
        self.spent_seconds
    }

    /// True iff the estimated spend fits within every cap.
    #[must_use]
    pub fn can_afford(&self, est_tokens: u64, est_cents: f64, est_seconds: f64) -> bool {
        let tokens_ok = self.spent_tokens + est_tokens <= self.caps.max_tokens;
        let cost_ok = self.spent_cents + est_cents <= self.caps.budget_cents;
        let time_ok = self.spent_seconds + est_seconds <= self.caps.timeout_s;
        tokens_ok && cost_ok && time_ok
    }

    /// Record actual usage. Increments are monotonic.
    pub fn record_usage(&mut self, tokens: u64, cost_cents: f64, latency_s: f64) {
        self.spent_tokens = self.spent_tokens.saturating_add(tokens);
        self.spent_cents += cost_cents.max(0.0);
        self.spent_seconds += latency_s.max(0.0);

        info!(
            spent_tokens = self.spent_tokens,
            max_tokens = self.caps.max_tokens,
            spent_cents = format!("{:.2}", self.spent_cents),
            budget_cents = self.caps.budget_cents,
            spent_seconds = format!("{:.1}", self.spent_seconds),
            timeout_s = self.caps.timeout_s,
            "budget usage recorded"
        );
    }

    /// Remaining budget as percentages of each cap.
    #[must_use]
    pub fn remaining_pct(&self) -> RemainingBudget {
        let tokens_pct = if self.caps.max_tokens == 0 {
            0.0
        } else {
            (self.caps.max_tokens.saturating_sub(self.spent_tokens) as f64
                / self.caps.max_tokens as f64)
                * 100.0
        };
        let cost_pct = if self.caps.budget_cents <= 0.0 {
            0.0
        } else {
            ((self.caps.budget_cents - self.spent_cents) / self.caps.budget_cents) * 100.0
        };
        let time_pct = if self.caps.timeout_s <= 0.0 {
            0.0
        } else {
            ((self.caps.timeout_s - self.spent_seconds) / self.caps.timeout_s) * 100.0
        };
        RemainingBudget {
            tokens_pct,
            cost_pct,
            time_pct,
        }
    }

    /// True iff any budget dimension has less than 30% remaining.
    #[must_use]
    pub fn should_degrade(&self) -> bool {
        self.remaining_pct().min() < 30.0
    }

    /// Fail with BUDGET_EXCEEDED if any counter strictly exceeds its cap.
    pub fn check_exceeded(&self) -> EngineResult<()> {
        if self.spent_tokens > self.caps.max_tokens {
            return Err(EngineError::BudgetExceeded {
                message: format!(
                    "Token limit exceeded: {}/{}",
                    self.spent_tokens, self.caps.max_tokens
                ),
            });
        }
        if self.spent_cents > self.caps.budget_cents {
            return Err(EngineError::BudgetExceeded {
                message: format!(
                    "Cost limit exceeded: {:.2}/{}¢",
                    self.spent_cents, self.caps.budget_cents
                ),
            });
        }
        if self.spent_seconds > self.caps.timeout_s {
            return Err(EngineError::BudgetExceeded {
                message: format!(
                    "Timeout exceeded: {:.1}/{}s",
                    self.spent_seconds, self.caps.timeout_s
                ),
            });
        }
        Ok(())
    }

    /// Append a degradation warning.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Warnings accumulated so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Drain the warnings for the response envelope.
    #[must_use]
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Zero the counters and warnings, restoring the initial state.
    pub fn reset(&mut self) {
        self.spent_tokens = 0;
        self.spent_cents = 0.0;
        self.spent_seconds = 0.0;
        self.warnings.clear();
        info!("budget reset");
    }

    /// Snapshot for logging and the `/dashboard` surface.
    #[must_use]
    pub fn summary(&self) -> BudgetSummary {
        BudgetSummary {
            spent_tokens: self.spent_tokens,
            spent_cents: (self.spent_cents * 100.0).round() / 100.0,
            spent_seconds: (self.spent_seconds * 10.0).round() / 10.0,
            caps: self.caps,
            remaining: self.remaining_pct(),
            warnings: self.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(tokens: u64, cents: f64, seconds: f64) -> BudgetCaps {
        BudgetCaps {
            max_tokens: tokens,
            budget_cents: cents,
            timeout_s: seconds,
        }
    }

    #[test]
    fn test_fresh_ledger() {
        let ledger = BudgetLedger::with_defaults();
        assert_eq!(ledger.spent_tokens(), 0);
        assert!(ledger.can_afford(8000, 50.0, 30.0));
        assert!(!ledger.should_degrade());
        assert!(ledger.check_exceeded().is_ok());
    }

    #[test]
    fn test_record_usage_accumulates() {
        let mut ledger = BudgetLedger::with_defaults();
        ledger.record_usage(500, 1.5, 0.8);
        ledger.record_usage(300, 0.5, 0.2);
        assert_eq!(ledger.spent_tokens(), 800);
        assert!((ledger.spent_cents() - 2.0).abs() < 1e-9);
        assert!((ledger.spent_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_can_afford_all_dimensions() {
        let mut ledger = BudgetLedger::new(caps(1000, 10.0, 10.0));
        ledger.record_usage(900, 5.0, 5.0);

        // Each dimension checked independently; all must fit.
        assert!(ledger.can_afford(100, 5.0, 5.0));
        assert!(!ledger.can_afford(101, 0.0, 0.0));
        assert!(!ledger.can_afford(0, 5.1, 0.0));
        assert!(!ledger.can_afford(0, 0.0, 5.1));
    }

    #[test]
    fn test_can_afford_boundary_inclusive() {
        let ledger = BudgetLedger::new(caps(1000, 10.0, 10.0));
        // spent + est == cap is affordable
        assert!(ledger.can_afford(1000, 10.0, 10.0));
    }

    #[test]
    fn test_remaining_pct() {
        let mut ledger = BudgetLedger::new(caps(1000, 100.0, 10.0));
        ledger.record_usage(250, 50.0, 1.0);
        let remaining = ledger.remaining_pct();
        assert!((remaining.tokens_pct - 75.0).abs() < 0.01);
        assert!((remaining.cost_pct - 50.0).abs() < 0.01);
        assert!((remaining.time_pct - 90.0).abs() < 0.01);
        assert!((remaining.min() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_should_degrade_threshold() {
        let mut ledger = BudgetLedger::new(caps(1000, 100.0, 100.0));
        ledger.record_usage(700, 0.0, 0.0);
        assert!(!ledger.should_degrade()); // exactly 30% left

        ledger.record_usage(1, 0.0, 0.0);
        assert!(ledger.should_degrade()); // below 30%
    }

    #[test]
    fn test_check_exceeded_strict() {
        let mut ledger = BudgetLedger::new(caps(1000, 10.0, 10.0));
        ledger.record_usage(1000, 10.0, 10.0);
        // At the cap exactly is not exceeded
        assert!(ledger.check_exceeded().is_ok());

        ledger.record_usage(1, 0.0, 0.0);
        let err = ledger.check_exceeded().unwrap_err();
        assert!(err.to_string().contains("Token limit exceeded"));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut ledger = BudgetLedger::new(caps(1000, 10.0, 10.0));
        ledger.record_usage(999, 9.0, 9.0);
        ledger.push_warning("degraded");
        ledger.reset();

        assert_eq!(ledger.spent_tokens(), 0);
        assert!(ledger.warnings().is_empty());
        assert!(ledger.can_afford(1000, 10.0, 10.0));
        assert!(!ledger.should_degrade());
    }

    #[test]
    fn test_summary_snapshot() {
        let mut ledger = BudgetLedger::new(caps(1000, 10.0, 10.0));
        ledger.record_usage(100, 1.234, 0.56);
        ledger.push_warning("w1");
        let summary = ledger.summary();
        assert_eq!(summary.spent_tokens, 100);
        assert!((summary.spent_cents - 1.23).abs() < 1e-9);
        assert_eq!(summary.warnings, vec!["w1".to_string()]);
    }

    #[test]
    fn test_zero_caps_do_not_divide_by_zero() {
        let ledger = BudgetLedger::new(caps(0, 0.0, 0.0));
        let remaining = ledger.remaining_pct();
        assert!(remaining.tokens_pct.abs() < f64::EPSILON);
        assert!(ledger.should_degrade());
    }
}
