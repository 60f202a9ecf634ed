//! Risk classification and policy gating for candidate actions.
//!
//! Destructive controls are valuable to discover (they prove a feature
//! exists) but not valuable to commit, so the exploration policy can admit
//! them with verify-then-cancel handling instead of a flat deny.

mod classifier;
mod model;
mod scope;

pub use classifier::ActionClassifier;
pub use model::{GateDecision, RiskLevel, SafetyPolicy, SpecialHandling};
pub use scope::ScopeRule;
