//! Budget ledger arithmetic and degradation properties.

use insight_budget::{apply_degradation, BudgetCaps, BudgetLedger};
use insight_core::{Command, CommandParams, MemoryOp};

fn caps(tokens: u64, cents: f64, seconds: f64) -> BudgetCaps {
    BudgetCaps {
        max_tokens: tokens,
        budget_cents: cents,
        timeout_s: seconds,
    }
}

#[test]
fn spend_is_the_sum_of_increments() {
    let mut ledger = BudgetLedger::new(caps(10_000, 100.0, 60.0));
    let increments = [(100u64, 0.5f64, 0.1f64), (250, 1.25, 0.4), (75, 0.0, 0.0), (400, 2.0, 1.5)];
    for (tokens, cents, seconds) in increments {
        ledger.record_usage(tokens, cents, seconds);
    }
    assert_eq!(ledger.spent_tokens(), 825);
    assert!((ledger.spent_cents() - 3.75).abs() < 1e-9);
    assert!((ledger.spent_seconds() - 2.0).abs() < 1e-9);
}

#[test]
fn can_afford_matches_its_definition() {
    let mut ledger = BudgetLedger::new(caps(1000, 10.0, 20.0));
    ledger.record_usage(400, 4.0, 8.0);

    for (tokens, cents, seconds) in [
        (0u64, 0.0f64, 0.0f64),
        (600, 6.0, 12.0),
        (601, 0.0, 0.0),
        (0, 6.1, 0.0),
        (0, 0.0, 12.1),
        (600, 6.1, 12.0),
    ] {
        let expected = ledger.spent_tokens() + tokens <= 1000
            && ledger.spent_cents() + cents <= 10.0
            && ledger.spent_seconds() + seconds <= 20.0;
        assert_eq!(
            ledger.can_afford(tokens, cents, seconds),
            expected,
            "est=({tokens},{cents},{seconds})"
        );
    }
}

#[test]
fn reset_behaves_like_a_fresh_ledger() {
    let mut used = BudgetLedger::new(caps(1000, 10.0, 20.0));
    used.record_usage(999, 9.9, 19.9);
    used.push_warning("degraded");
    used.reset();

    let fresh = BudgetLedger::new(caps(1000, 10.0, 20.0));
    assert_eq!(used.spent_tokens(), fresh.spent_tokens());
    assert_eq!(used.warnings().len(), fresh.warnings().len());
    assert_eq!(
        used.can_afford(1000, 10.0, 20.0),
        fresh.can_afford(1000, 10.0, 20.0)
    );
    assert_eq!(used.should_degrade(), fresh.should_degrade());
}

#[test]
fn exceeding_any_cap_fails_check() {
    let mut ledger = BudgetLedger::new(caps(100, 1.0, 1.0));
    ledger.record_usage(100, 1.0, 1.0);
    assert!(ledger.check_exceeded().is_ok());

    ledger.record_usage(0, 0.1, 0.0);
    let err = ledger.check_exceeded().unwrap_err();
    assert!(err.to_string().contains("Cost limit exceeded"));
}

#[test]
fn degradation_is_deterministic() {
    let run = || {
        let mut ledger = BudgetLedger::new(caps(1000, 1000.0, 1000.0));
        ledger.record_usage(760, 0.0, 0.0); // 24% remaining
        apply_degradation(&mut ledger, Command::Ask, CommandParams::default())
    };
    assert_eq!(run(), run());
}

#[test]
fn degradation_covers_every_command_family() {
    let mut ledger = BudgetLedger::new(caps(1000, 1000.0, 1000.0));
    ledger.record_usage(850, 0.0, 0.0); // 15% remaining: all thresholds fire

    for command in [
        Command::Ask,
        Command::Events,
        Command::Graph,
        Command::Memory,
        Command::Synthesize,
        Command::Trends,
        Command::Analyze,
        Command::Predict,
        Command::Competitors,
    ] {
        let params = apply_degradation(&mut ledger, command, CommandParams::default());
        // Global <20% clamp applies regardless of family.
        assert!(params.k_final <= 3, "{command}");
    }
}

#[test]
fn memory_degradation_forces_recall() {
    let mut ledger = BudgetLedger::new(caps(1000, 1000.0, 1000.0));
    ledger.record_usage(760, 0.0, 0.0);
    let params = apply_degradation(
        &mut ledger,
        Command::Memory,
        CommandParams {
            memory_op: MemoryOp::Suggest,
            ..CommandParams::default()
        },
    );
    assert_eq!(params.memory_op, MemoryOp::Recall);
}
