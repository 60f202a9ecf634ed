//! Serializable session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use statewalker_core_types::SessionId;
use statewalker_state_graph::GraphSnapshot;

/// Everything needed to resume an interrupted exploration: the flattened
/// graph, the saturation table (inside the graph snapshot), and the session
/// counters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub root_fingerprint: Option<String>,
    pub root_url: String,
    pub step_count: u64,
    pub actions_executed: u64,
    pub graph: GraphSnapshot,
    pub taken_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(session_id: SessionId, root_url: impl Into<String>) -> Self {
        Self {
            session_id,
            root_fingerprint: None,
            root_url: root_url.into(),
            step_count: 0,
            actions_executed: 0,
            graph: GraphSnapshot::default(),
            taken_at: Utc::now(),
        }
    }
}
