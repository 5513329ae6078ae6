//! The degradation table.
//!
//! When the tightest budget dimension drops below a threshold, command
//! parameters shrink deterministically. Command-specific rules are evaluated
//! first (looser threshold before tighter), then the global <20% clamp; each
//! applied change appends a human-readable warning to the ledger.

use crate::ledger::BudgetLedger;
use insight_core::{Command, CommandParams, MemoryOp};
use tracing::info;

/// Apply the degradation table to `params` for `command`, based on the
/// ledger's tightest remaining dimension. Returns the degraded parameters;
/// warnings are appended to the ledger.
#[must_use]
pub fn apply_degradation(
    ledger: &mut BudgetLedger,
    command: Command,
    params: CommandParams,
) -> CommandParams {
    let mut degraded = params;
    let min_remaining = ledger.remaining_pct().min();

    info!(
        command = %command,
        min_remaining_pct = format!("{min_remaining:.1}"),
        "applying degradation"
    );

    match command {
        Command::Ask => {
            if min_remaining < 50.0 {
                degraded.depth = degraded.depth.min(2);
                degraded.self_check = false;
                ledger.push_warning("Degraded to 2 iterations (no self-check)");
            }
            if min_remaining < 30.0 {
                degraded.depth = 1;
                degraded.self_check = false;
                degraded.use_rerank = false;
                ledger.push_warning("Degraded to 1 iteration (no self-check, no rerank)");
            }
        }
        Command::Graph => {
            if min_remaining < 50.0 {
                degraded.hop_limit = 2;
                degraded.max_nodes = 120;
                degraded.max_edges = 360;
                ledger.push_warning("Degraded graph: hop_limit=2, max_nodes=120");
            }
            if min_remaining < 30.0 {
                degraded.hop_limit = 1;
                degraded.max_nodes = 60;
                degraded.max_edges = 180;
                degraded.use_rerank = false;
                ledger.push_warning("Degraded graph: hop_limit=1, max_nodes=60, max_edges=180");
            }
        }
        Command::Events => {
            if min_remaining < 50.0 {
                degraded.include_alternatives = false;
                ledger.push_warning("Degraded events: no alternative interpretations");
            }
            if min_remaining < 30.0 {
                degraded.k_final = degraded.k_final.min(5);
                degraded.include_alternatives = false;
                degraded.use_rerank = false;
                ledger.push_warning("Degraded events: top-5 only, no alternatives, no rerank");
            }
        }
        Command::Memory => {
            if min_remaining < 30.0 {
                degraded.memory_op = MemoryOp::Recall;
                ledger.push_warning("Degraded memory: recall-only (no suggest/store)");
            }
        }
        Command::Synthesize => {
            if min_remaining < 30.0 {
                degraded.k_final = degraded.k_final.min(5);
                degraded.use_rerank = false;
                ledger.push_warning("Degraded synthesis: k_final=5, no rerank");
            }
        }
        _ => {}
    }

    // Global rule runs after the command-specific rules.
    if min_remaining < 20.0 {
        degraded.k_final = degraded.k_final.min(3);
        ledger.push_warning("Critical budget: reduced k_final to 3");
    }

    degraded
}
