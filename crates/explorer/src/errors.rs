//! Error taxonomy for the exploration loop.
//!
//! Per-action and per-node failures are recovered locally; restoration
//! failures abandon the subtree; only a lost live session is fatal, and
//! even then the last checkpoint is preserved for resumption.

use thiserror::Error;

use statewalker_session_store::StoreError;
use statewalker_state_graph::GraphError;

/// Failures reported by the collaborator ports.
#[derive(Debug, Error, Clone)]
pub enum PortError {
    /// No inventory obtainable; the affected node becomes a terminal leaf.
    #[error("perception failure: {0}")]
    Perception(String),

    /// A single action failed; logged, counted visited, loop continues.
    #[error("execution failure: {0}")]
    Execution(String),

    /// Backtracking could not reach the requested context.
    #[error("restoration failure: {0}")]
    Restoration(String),

    /// The live handle itself died; fatal to the session.
    #[error("live session lost: {0}")]
    SessionLost(String),
}

impl PortError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PortError::SessionLost(_))
    }
}

/// Session-level errors surfaced by the controller.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// The live system is gone; the last snapshot was written before this
    /// was raised.
    #[error("fatal session error: {0}")]
    Fatal(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
