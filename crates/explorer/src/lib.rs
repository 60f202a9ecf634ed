//! The exploration control loop.
//!
//! The controller drives one live-system session through the step machine
//! OBSERVE → RESOLVE_NODE → CHECK_TERMINATION → SELECT_ACTION →
//! SAFETY_CHECK → EXECUTE → CLASSIFY_TRANSITION → UPDATE_GRAPH →
//! (RECURSE | BACKTRACK | CONTINUE), consuming perception, decision, and
//! execution through narrow ports. It owns the session exclusively;
//! collaborators only ever see read-only node views.

mod config;
mod controller;
mod errors;
mod loop_detect;
mod ports;
mod report;
mod session;

pub use config::ExplorerConfig;
pub use controller::ExplorationController;
pub use errors::{ExploreError, PortError};
pub use loop_detect::LoopDetector;
pub use ports::{ActionExecutor, DecisionOracle, Observation, Perception, RoundRobinOracle};
pub use report::{ExplorationOutcome, ExplorationReport};
pub use session::ExplorationSession;
