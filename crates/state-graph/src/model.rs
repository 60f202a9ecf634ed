//! Node records, read-only views, and the serializable graph form.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use statewalker_core_types::{ActionDescriptor, NodeContext, StateFingerprint};

/// Full bookkeeping for one discovered state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Context the state was first discovered under.
    pub context: NodeContext,
    /// Last-seen action inventory.
    pub inventory: Vec<ActionDescriptor>,
    /// Action ids already decided (executed or gated off).
    pub visited: BTreeSet<String>,
    /// Action ids excluded from further selection.
    pub dead: BTreeSet<String>,
    /// No-op counts per action id; crossing the dead threshold kills the action.
    pub noop_counts: BTreeMap<String, u32>,
    /// Action id to resulting state fingerprint.
    pub transitions: BTreeMap<String, StateFingerprint>,
    /// True once every inventory action is visited or dead.
    pub fully_explored: bool,
}

impl NodeRecord {
    pub fn new(context: NodeContext, inventory: Vec<ActionDescriptor>) -> Self {
        let fully_explored = inventory.is_empty();
        Self {
            context,
            inventory,
            visited: BTreeSet::new(),
            dead: BTreeSet::new(),
            noop_counts: BTreeMap::new(),
            transitions: BTreeMap::new(),
            fully_explored,
        }
    }

    /// Refresh the inventory on a re-observation. Bookkeeping survives
    /// because action ids are content-derived and stable across scans.
    pub fn refresh_inventory(&mut self, inventory: Vec<ActionDescriptor>) {
        self.inventory = inventory;
        self.recompute_fully_explored();
    }

    pub fn has_action(&self, action_id: &str) -> bool {
        self.inventory.iter().any(|a| a.id == action_id)
    }

    /// Actions still eligible for selection.
    pub fn unvisited(&self) -> Vec<ActionDescriptor> {
        self.inventory
            .iter()
            .filter(|a| !self.visited.contains(&a.id) && !self.dead.contains(&a.id))
            .cloned()
            .collect()
    }

    /// fully_explored ⇔ every inventory id is visited or dead.
    pub fn recompute_fully_explored(&mut self) {
        self.fully_explored = self
            .inventory
            .iter()
            .all(|a| self.visited.contains(&a.id) || self.dead.contains(&a.id));
    }
}

/// Read-only view handed to collaborators; they never mutate the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeView {
    pub fingerprint: StateFingerprint,
    pub context: NodeContext,
    pub unvisited: Vec<ActionDescriptor>,
    pub fully_explored: bool,
}

/// Aggregate counters for reporting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub fully_explored_nodes: usize,
    pub transitions: usize,
    pub visited_actions: usize,
    pub dead_actions: usize,
    pub saturation_entries: usize,
}

/// Flat serializable form of the whole graph.
///
/// Keys are raw fingerprint strings so the on-disk layout stays a plain
/// string map regardless of how the in-memory key type evolves.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: BTreeMap<String, NodeRecord>,
    pub saturation: BTreeMap<String, u32>,
    /// Sequence for minting unique unknown-state keys.
    pub unknown_seq: u64,
}
