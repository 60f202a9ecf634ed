use thiserror::Error;

/// Errors emitted by graph operations.
#[derive(Debug, Error, Clone)]
pub enum GraphError {
    /// The fingerprint has no node; resolve it first.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// The action id is not part of the node's inventory.
    #[error("unknown action {action} in node {node}")]
    UnknownAction { node: String, action: String },
}
