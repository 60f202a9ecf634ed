//! Exploration memory: every discovered state, its action bookkeeping, and
//! the saturation table used for cycle escape.
//!
//! The graph is the only shared mutable resource between concurrent
//! sessions. Every public operation is a single critical section on the
//! touched entry; no lock is ever held across I/O.

mod errors;
mod graph;
mod locator;
mod model;

pub use errors::GraphError;
pub use graph::{StateGraph, DEFAULT_DEAD_THRESHOLD};
pub use locator::coarse_locator;
pub use model::{GraphSnapshot, GraphStats, NodeRecord, NodeView};
