//! Gate decision model.

use serde::{Deserialize, Serialize};

/// Coarse risk label for one candidate action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Navigation and reads; no data mutated.
    Safe,
    /// Mutates data in a way the application can undo (edit, rename).
    Reversible,
    /// Removes or invalidates data (delete, purge, archive).
    Destructive,
    /// Account- or system-level damage; never executed outside full testing.
    Critical,
}

impl RiskLevel {
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Reversible => "reversible",
            RiskLevel::Destructive => "destructive",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Exploration policy selecting which risk levels may run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPolicy {
    /// Only safe navigation-type actions.
    ReadOnly,
    /// Safe and reversible; destructive admitted with verify-then-cancel.
    #[default]
    ExplorationOnly,
    /// Everything allowed.
    FullTesting,
}

impl SafetyPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SafetyPolicy::ReadOnly => "read_only",
            SafetyPolicy::ExplorationOnly => "exploration_only",
            SafetyPolicy::FullTesting => "full_testing",
        }
    }
}

/// Execution caveat attached to an admitted action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHandling {
    /// Run the action to confirm the control exists and produces a
    /// confirmation surface, then cancel instead of confirming.
    VerifyThenCancel,
}

/// Outcome of gating one action under a policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub risk: RiskLevel,
    pub special_handling: Option<SpecialHandling>,
    pub reason: String,
}

impl GateDecision {
    pub fn allow(risk: RiskLevel, policy: SafetyPolicy) -> Self {
        Self {
            allowed: true,
            risk,
            special_handling: None,
            reason: format!("{} action in {} mode", risk.name(), policy.name()),
        }
    }

    pub fn allow_with(risk: RiskLevel, policy: SafetyPolicy, handling: SpecialHandling) -> Self {
        Self {
            special_handling: Some(handling),
            ..Self::allow(risk, policy)
        }
    }

    pub fn deny(risk: RiskLevel, policy: SafetyPolicy) -> Self {
        Self {
            allowed: false,
            risk,
            special_handling: None,
            reason: format!("{} action blocked in {} mode", risk.name(), policy.name()),
        }
    }

    pub fn deny_reason(risk: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            risk,
            special_handling: None,
            reason: reason.into(),
        }
    }
}
