//! Exploration policy limits.

use serde::{Deserialize, Serialize};

use statewalker_action_gate::{SafetyPolicy, ScopeRule};

/// Budgets and thresholds for one exploration session.
///
/// The saturation and dead thresholds are empirically chosen defaults,
/// kept configurable rather than baked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Maximum recursion depth from the root state.
    /// Default: 8
    pub max_depth: u32,

    /// Global budget of executed actions across the whole session.
    /// Default: 150
    pub max_total_actions: u64,

    /// Re-entries of the same coarse locator before the controller forces
    /// a backtrack instead of looping.
    /// Default: 3
    pub saturation_threshold: u32,

    /// No-op results before an action is declared dead.
    /// Default: 3
    pub dead_threshold: u32,

    /// Wall-clock budget in seconds; `None` means unlimited.
    pub max_wall_clock_secs: Option<u64>,

    /// Pause before re-observing after a progress transition, giving the
    /// application time to settle. Default: 200
    pub settle_delay_ms: u64,

    /// Window of recent progress transitions inspected for loops.
    /// Default: 5
    pub loop_window: usize,

    /// Repetitions of one action signature within the window that count
    /// as a loop.
    /// Default: 3
    pub loop_threshold: usize,

    /// Safety policy gating which risk levels may execute.
    pub policy: SafetyPolicy,

    /// Optional scope pin restricting navigation to one path.
    pub scope: Option<ScopeRule>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_total_actions: 150,
            saturation_threshold: 3,
            dead_threshold: 3,
            max_wall_clock_secs: None,
            settle_delay_ms: 200,
            loop_window: 5,
            loop_threshold: 3,
            policy: SafetyPolicy::ExplorationOnly,
            scope: None,
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small limits for tests.
    pub fn minimal() -> Self {
        Self {
            max_depth: 3,
            max_total_actions: 25,
            settle_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Builder: set max depth.
    pub fn depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder: set the total action budget.
    pub fn action_budget(mut self, budget: u64) -> Self {
        self.max_total_actions = budget;
        self
    }

    /// Builder: set the saturation threshold.
    pub fn saturation(mut self, threshold: u32) -> Self {
        self.saturation_threshold = threshold;
        self
    }

    /// Builder: set the safety policy.
    pub fn with_policy(mut self, policy: SafetyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: pin the exploration scope.
    pub fn with_scope(mut self, scope: ScopeRule) -> Self {
        self.scope = Some(scope);
        self
    }
}
