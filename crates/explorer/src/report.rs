//! Final session summary.

use serde::{Deserialize, Serialize};

use statewalker_core_types::SessionId;
use statewalker_state_graph::GraphStats;

/// Why the session ended. The engine never decides that testing is
/// semantically "complete"; it only knows when the graph is exhausted
/// under the budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationOutcome {
    /// The root node is fully explored.
    RootExhausted,
    /// Depth, action, or wall-clock budget was hit first.
    BudgetExhausted,
    /// External cancellation; state was checkpointed before returning.
    Cancelled,
    /// The root context produced no usable observation.
    RootUnreachable,
}

/// Result of one exploration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub outcome: ExplorationOutcome,
    pub session_id: SessionId,
    pub message: String,
    /// Total steps taken (including gated and failed ones).
    pub steps: u64,
    /// Actions actually handed to the executor.
    pub actions_executed: u64,
    /// Actions the safety gate or scope rule refused.
    pub blocked_actions: u64,
    /// Subtrees abandoned after restoration failures.
    pub abandoned_branches: u64,
    pub graph: GraphStats,
    pub elapsed_ms: u64,
}

impl ExplorationReport {
    pub fn is_exhaustive(&self) -> bool {
        matches!(self.outcome, ExplorationOutcome::RootExhausted)
    }

    /// One-line summary for the final log record.
    pub fn summary(&self) -> String {
        format!(
            "{:?}: {} states, {} transitions, {} steps, {} executed, {} blocked, {}ms",
            self.outcome,
            self.graph.nodes,
            self.graph.transitions,
            self.steps,
            self.actions_executed,
            self.blocked_actions,
            self.elapsed_ms
        )
    }
}
