//! Collaborator ports.
//!
//! The core is decoupled from concrete browser or model technology; these
//! three traits are the entire surface it consumes. Implementations own
//! their live handle, so the port methods take no handle parameter.

use async_trait::async_trait;

use statewalker_action_gate::SpecialHandling;
use statewalker_core_types::{ActionDescriptor, NodeContext, TransitionKind};
use statewalker_fingerprint::StateSnapshot;
use statewalker_state_graph::NodeView;

use crate::errors::PortError;

/// One observation of the live system.
#[derive(Clone, Debug)]
pub struct Observation {
    /// Normalized structural snapshot for fingerprinting.
    pub snapshot: StateSnapshot,
    /// Stable, ordering-independent action inventory.
    pub actions: Vec<ActionDescriptor>,
    /// Full URL the observation was taken at.
    pub url: String,
}

/// Reads the live system and restores earlier contexts during backtracking.
#[async_trait]
pub trait Perception: Send + Sync {
    /// Perceive the current state and its action inventory.
    async fn observe(&self) -> Result<Observation, PortError>;

    /// Literal "go back" for reversing a navigation transition.
    async fn go_back(&self) -> Result<(), PortError>;

    /// Replay whatever produced `context` (e.g. re-expand a side menu that
    /// collapsed); used when a simple go-back cannot reverse a DOM change.
    async fn restore(&self, context: &NodeContext) -> Result<(), PortError>;

    /// Last-resort reset to the session's root context.
    async fn goto_root(&self) -> Result<(), PortError>;
}

/// Chooses the next action to try in a state.
///
/// The controller treats the oracle as opaque and re-queries it fresh each
/// step; any heuristic, learned, or human-in-the-loop strategy fits.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn select_next(
        &self,
        node: &NodeView,
        unvisited: &[ActionDescriptor],
    ) -> Option<ActionDescriptor>;
}

/// Baseline oracle: takes unvisited actions in inventory order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinOracle;

#[async_trait]
impl DecisionOracle for RoundRobinOracle {
    async fn select_next(
        &self,
        _node: &NodeView,
        unvisited: &[ActionDescriptor],
    ) -> Option<ActionDescriptor> {
        unvisited.first().cloned()
    }
}

/// Performs one action against the live system and classifies the
/// resulting transition. One attempt per step; the controller never
/// requires idempotent retry. Timeouts surface as `TransitionKind::Error`.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        action: &ActionDescriptor,
        special_handling: Option<SpecialHandling>,
    ) -> Result<TransitionKind, PortError>;
}
