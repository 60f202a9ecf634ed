//! Session lifecycle: created fresh, optionally resumed from a snapshot,
//! checkpointed after each transition, finalized at the end.

use std::sync::Arc;

use tracing::info;

use statewalker_core_types::{SessionId, StateFingerprint};
use statewalker_session_store::SessionSnapshot;
use statewalker_state_graph::StateGraph;

/// Mutable session state, owned exclusively by the controller.
///
/// The graph handle is shared (concurrent sessions over disjoint subtrees
/// may hold clones), but counters and the root fingerprint belong to this
/// session alone.
pub struct ExplorationSession {
    pub id: SessionId,
    pub root_url: String,
    pub root_fingerprint: Option<StateFingerprint>,
    pub graph: Arc<StateGraph>,
    /// Monotonically increasing step counter.
    pub step_count: u64,
    /// Actions actually passed to the executor.
    pub actions_executed: u64,
}

impl ExplorationSession {
    /// Start a fresh session.
    pub fn new(root_url: impl Into<String>, dead_threshold: u32) -> Self {
        Self {
            id: SessionId::new(),
            root_url: root_url.into(),
            root_fingerprint: None,
            graph: Arc::new(StateGraph::new(dead_threshold)),
            step_count: 0,
            actions_executed: 0,
        }
    }

    /// Rebuild a session from a persisted snapshot.
    pub fn resume(snapshot: SessionSnapshot, dead_threshold: u32) -> Self {
        info!(
            session = %snapshot.session_id,
            steps = snapshot.step_count,
            states = snapshot.graph.nodes.len(),
            "resuming exploration session"
        );
        Self {
            id: snapshot.session_id,
            root_url: snapshot.root_url,
            root_fingerprint: snapshot
                .root_fingerprint
                .map(StateFingerprint::from_raw),
            graph: Arc::new(StateGraph::import(snapshot.graph, dead_threshold)),
            step_count: snapshot.step_count,
            actions_executed: snapshot.actions_executed,
        }
    }

    /// Flatten to the persistable form.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            root_fingerprint: self.root_fingerprint.as_ref().map(|fp| fp.to_string()),
            root_url: self.root_url.clone(),
            step_count: self.step_count,
            actions_executed: self.actions_executed,
            graph: self.graph.export(),
            taken_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewalker_core_types::{ActionDescriptor, ActionKind, NodeContext};

    #[test]
    fn snapshot_resume_round_trip() {
        let mut session = ExplorationSession::new("https://app.test/", 3);
        let ctx = NodeContext::root("https://app.test/");
        let inventory = vec![ActionDescriptor::new("Open", ActionKind::Click, 0)];
        let id = inventory[0].id.clone();
        let fp = StateFingerprint::from_digest("f00d");
        session.graph.resolve(&fp, &ctx, inventory);
        session.graph.mark_visited(&fp, &id).unwrap();
        session.step_count = 5;
        session.root_fingerprint = Some(fp.clone());

        let resumed = ExplorationSession::resume(session.snapshot(), 3);
        assert_eq!(resumed.step_count, 5);
        assert_eq!(resumed.root_fingerprint, Some(fp.clone()));
        assert!(resumed.graph.unvisited_actions(&fp).unwrap().is_empty());
    }
}
