//! Keyword/pattern based risk classification.

use once_cell::sync::Lazy;
use regex::RegexSet;
use tracing::debug;

use statewalker_core_types::{ActionDescriptor, ActionKind};

use crate::model::{GateDecision, RiskLevel, SafetyPolicy, SpecialHandling};

static CRITICAL_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)delete\s+account",
        r"(?i)close\s+account",
        r"(?i)drop\s+(database|table)",
        r"(?i)factory\s+reset",
        r"(?i)wipe\s+all",
        r"(?i)revoke\s+all",
    ])
    .expect("critical patterns compile")
});

static DESTRUCTIVE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\bdelete\b",
        r"(?i)\bremove\b",
        r"(?i)\bdestroy\b",
        r"(?i)\bpurge\b",
        r"(?i)clear\s+all",
        r"(?i)\breset\b",
        r"(?i)\bdeactivate\b",
        r"(?i)\barchive\b",
        r"(?i)\btrash\b",
        r"(?i)\bwipe\b",
        r"(?i)\bpermanently\b",
        r"(?i)cannot\s+be\s+undone",
        r"(?i)\birreversible\b",
    ])
    .expect("destructive patterns compile")
});

static REVERSIBLE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\bedit\b",
        r"(?i)\bupdate\b",
        r"(?i)\brename\b",
        r"(?i)\bmodify\b",
        r"(?i)\bchange\b",
    ])
    .expect("reversible patterns compile")
});

static DESTRUCTIVE_HINT_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)/delete\b", r"(?i)/remove\b", r"(?i)/destroy\b"])
        .expect("destructive hint patterns compile")
});

/// Stateless classifier over action labels and target hints.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionClassifier;

impl ActionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Label an action by risk, from its label and target-location hint.
    pub fn classify(&self, action: &ActionDescriptor) -> RiskLevel {
        let label = action.label.as_str();
        let hint = action.target_hint.as_deref().unwrap_or("");

        if CRITICAL_PATTERNS.is_match(label) || CRITICAL_PATTERNS.is_match(hint) {
            return RiskLevel::Critical;
        }
        if DESTRUCTIVE_PATTERNS.is_match(label) || DESTRUCTIVE_HINT_PATTERNS.is_match(hint) {
            return RiskLevel::Destructive;
        }
        match action.kind {
            // Filling a field or toggling a switch mutates form state the
            // application still has to commit.
            ActionKind::Fill | ActionKind::Select | ActionKind::Toggle | ActionKind::Submit => {
                RiskLevel::Reversible
            }
            ActionKind::Click | ActionKind::Hover | ActionKind::Navigate | ActionKind::Other => {
                if REVERSIBLE_PATTERNS.is_match(label) {
                    RiskLevel::Reversible
                } else {
                    RiskLevel::Safe
                }
            }
        }
    }

    /// Gate one action under a policy.
    pub fn evaluate(&self, action: &ActionDescriptor, policy: SafetyPolicy) -> GateDecision {
        let risk = self.classify(action);
        let decision = match policy {
            SafetyPolicy::ReadOnly => {
                if risk == RiskLevel::Safe && matches!(action.kind, ActionKind::Navigate) {
                    GateDecision::allow(risk, policy)
                } else {
                    GateDecision::deny(risk, policy)
                }
            }
            SafetyPolicy::ExplorationOnly => match risk {
                RiskLevel::Safe | RiskLevel::Reversible => GateDecision::allow(risk, policy),
                RiskLevel::Destructive => {
                    GateDecision::allow_with(risk, policy, SpecialHandling::VerifyThenCancel)
                }
                RiskLevel::Critical => GateDecision::deny(risk, policy),
            },
            SafetyPolicy::FullTesting => GateDecision::allow(risk, policy),
        };

        debug!(
            action = %action.id,
            risk = risk.name(),
            allowed = decision.allowed,
            policy = policy.name(),
            "gate decision"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewalker_core_types::ActionKind;

    fn click(label: &str) -> ActionDescriptor {
        ActionDescriptor::new(label, ActionKind::Click, 0)
    }

    #[test]
    fn delete_label_is_destructive() {
        let gate = ActionClassifier::new();
        assert_eq!(gate.classify(&click("Delete user")), RiskLevel::Destructive);
        assert_eq!(
            gate.classify(&click("Remove from list")),
            RiskLevel::Destructive
        );
        assert_eq!(gate.classify(&click("Open profile")), RiskLevel::Safe);
    }

    #[test]
    fn destructive_href_is_destructive() {
        let gate = ActionClassifier::new();
        let action = click("Go").with_target("/api/items/42/delete");
        assert_eq!(gate.classify(&action), RiskLevel::Destructive);
    }

    #[test]
    fn account_deletion_is_critical() {
        let gate = ActionClassifier::new();
        assert_eq!(
            gate.classify(&click("Delete Account")),
            RiskLevel::Critical
        );
    }

    #[test]
    fn edit_is_reversible() {
        let gate = ActionClassifier::new();
        assert_eq!(gate.classify(&click("Edit profile")), RiskLevel::Reversible);
    }

    #[test]
    fn exploration_only_admits_destructive_with_cancel() {
        let gate = ActionClassifier::new();
        let decision = gate.evaluate(&click("Delete user"), SafetyPolicy::ExplorationOnly);
        assert!(decision.allowed);
        assert_eq!(
            decision.special_handling,
            Some(SpecialHandling::VerifyThenCancel)
        );
    }

    #[test]
    fn critical_never_allowed_outside_full_testing() {
        let gate = ActionClassifier::new();
        let action = click("Delete Account");
        for policy in [SafetyPolicy::ReadOnly, SafetyPolicy::ExplorationOnly] {
            let decision = gate.evaluate(&action, policy);
            assert!(!decision.allowed, "critical allowed under {policy:?}");
        }
        assert!(gate.evaluate(&action, SafetyPolicy::FullTesting).allowed);
    }

    #[test]
    fn read_only_admits_only_safe_navigation() {
        let gate = ActionClassifier::new();
        let nav = ActionDescriptor::new("Reports", ActionKind::Navigate, 0);
        assert!(gate.evaluate(&nav, SafetyPolicy::ReadOnly).allowed);
        assert!(!gate.evaluate(&click("Open panel"), SafetyPolicy::ReadOnly).allowed);
        let fill = ActionDescriptor::new("Name", ActionKind::Fill, 0);
        assert!(!gate.evaluate(&fill, SafetyPolicy::ReadOnly).allowed);
    }
}
