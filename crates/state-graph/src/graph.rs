//! The shared state graph.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, info};

use statewalker_core_types::{ActionDescriptor, NodeContext, StateFingerprint};

use crate::errors::GraphError;
use crate::model::{GraphSnapshot, GraphStats, NodeRecord, NodeView};

/// Default number of no-op results before an action is declared dead.
pub const DEFAULT_DEAD_THRESHOLD: u32 = 3;

/// All discovered states plus the visit-count table keyed by coarse locator.
///
/// Each operation locks only the touched map entry, so independent sessions
/// sharing one graph never contend except on the same node.
pub struct StateGraph {
    nodes: DashMap<StateFingerprint, NodeRecord>,
    saturation: DashMap<String, u32>,
    dead_threshold: u32,
    unknown_seq: AtomicU64,
}

impl StateGraph {
    pub fn new(dead_threshold: u32) -> Self {
        Self {
            nodes: DashMap::new(),
            saturation: DashMap::new(),
            // A threshold of zero would kill every action on first sight.
            dead_threshold: dead_threshold.max(1),
            unknown_seq: AtomicU64::new(0),
        }
    }

    pub fn dead_threshold(&self) -> u32 {
        self.dead_threshold
    }

    /// Resolve a fingerprint to its node, creating it on first sight.
    ///
    /// Unknown-sentinel fingerprints are never deduplicated: each sighting
    /// mints a fresh key, failing open instead of merging unrelated states.
    /// Known nodes get their inventory refreshed; visited/dead bookkeeping
    /// survives because action ids are content-derived.
    pub fn resolve(
        &self,
        fingerprint: &StateFingerprint,
        context: &NodeContext,
        inventory: Vec<ActionDescriptor>,
    ) -> (NodeView, bool) {
        let key = if fingerprint.is_unknown() {
            let seq = self.unknown_seq.fetch_add(1, Ordering::SeqCst);
            StateFingerprint::from_raw(format!("st_unknown:{seq}"))
        } else {
            fingerprint.clone()
        };

        let mut is_new = false;
        let mut entry = self.nodes.entry(key.clone()).or_insert_with(|| {
            is_new = true;
            NodeRecord::new(context.clone(), Vec::new())
        });
        entry.refresh_inventory(inventory);
        if is_new {
            info!(state = key.short(), context = %context, "discovered new state");
        }

        let view = NodeView {
            fingerprint: key,
            context: entry.context.clone(),
            unvisited: entry.unvisited(),
            fully_explored: entry.fully_explored,
        };
        (view, is_new)
    }

    /// Actions in the node still eligible for selection.
    pub fn unvisited_actions(
        &self,
        fingerprint: &StateFingerprint,
    ) -> Result<Vec<ActionDescriptor>, GraphError> {
        let node = self
            .nodes
            .get(fingerprint)
            .ok_or_else(|| GraphError::UnknownNode(fingerprint.to_string()))?;
        Ok(node.unvisited())
    }

    /// Mark an action visited. Called before execution so a crash mid-step
    /// cannot silently retry the same action forever.
    pub fn mark_visited(
        &self,
        fingerprint: &StateFingerprint,
        action_id: &str,
    ) -> Result<(), GraphError> {
        self.with_action(fingerprint, action_id, |node| {
            node.visited.insert(action_id.to_string());
            node.recompute_fully_explored();
        })
    }

    /// Exclude an action from further selection.
    pub fn mark_dead(
        &self,
        fingerprint: &StateFingerprint,
        action_id: &str,
    ) -> Result<(), GraphError> {
        self.with_action(fingerprint, action_id, |node| {
            node.dead.insert(action_id.to_string());
            node.recompute_fully_explored();
        })
    }

    /// Count one no-op result; returns true when the action just crossed
    /// the dead threshold and was excluded.
    ///
    /// Below the threshold the visited mark set before execution is
    /// explicitly reset, so the action stays selectable for its remaining
    /// retries. This reset is the only way an executed action re-enters
    /// the unvisited pool.
    pub fn record_no_change(
        &self,
        fingerprint: &StateFingerprint,
        action_id: &str,
    ) -> Result<bool, GraphError> {
        let threshold = self.dead_threshold;
        let mut became_dead = false;
        self.with_action(fingerprint, action_id, |node| {
            let count = node.noop_counts.entry(action_id.to_string()).or_insert(0);
            *count += 1;
            if *count >= threshold {
                node.dead.insert(action_id.to_string());
                became_dead = true;
            } else {
                node.visited.remove(action_id);
            }
            node.recompute_fully_explored();
        })?;
        if became_dead {
            debug!(state = fingerprint.short(), action = action_id, "action dead after repeated no-ops");
        }
        Ok(became_dead)
    }

    /// Record the edge action → resulting state.
    pub fn record_transition(
        &self,
        fingerprint: &StateFingerprint,
        action_id: &str,
        result: StateFingerprint,
    ) -> Result<(), GraphError> {
        self.with_action(fingerprint, action_id, |node| {
            node.transitions.insert(action_id.to_string(), result);
        })
    }

    /// Increment and return the visit count for a coarse locator. Feeds
    /// the controller's saturation guard only, never dedup logic.
    pub fn increment_saturation(&self, locator: &str) -> u32 {
        let mut entry = self.saturation.entry(locator.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn saturation_count(&self, locator: &str) -> u32 {
        self.saturation.get(locator).map(|c| *c).unwrap_or(0)
    }

    pub fn is_fully_explored(&self, fingerprint: &StateFingerprint) -> bool {
        self.nodes
            .get(fingerprint)
            .map(|n| n.fully_explored)
            .unwrap_or(false)
    }

    pub fn node_view(&self, fingerprint: &StateFingerprint) -> Option<NodeView> {
        self.nodes.get(fingerprint).map(|node| NodeView {
            fingerprint: fingerprint.clone(),
            context: node.context.clone(),
            unvisited: node.unvisited(),
            fully_explored: node.fully_explored,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.nodes.len(),
            saturation_entries: self.saturation.len(),
            ..GraphStats::default()
        };
        for node in self.nodes.iter() {
            if node.fully_explored {
                stats.fully_explored_nodes += 1;
            }
            stats.transitions += node.transitions.len();
            stats.visited_actions += node.visited.len();
            stats.dead_actions += node.dead.len();
        }
        stats
    }

    /// Flatten into the persistable form.
    pub fn export(&self) -> GraphSnapshot {
        let mut nodes = BTreeMap::new();
        for entry in self.nodes.iter() {
            nodes.insert(entry.key().to_string(), entry.value().clone());
        }
        let mut saturation = BTreeMap::new();
        for entry in self.saturation.iter() {
            saturation.insert(entry.key().clone(), *entry.value());
        }
        GraphSnapshot {
            nodes,
            saturation,
            unknown_seq: self.unknown_seq.load(Ordering::SeqCst),
        }
    }

    /// Rebuild a graph from a persisted snapshot.
    pub fn import(snapshot: GraphSnapshot, dead_threshold: u32) -> Self {
        let graph = Self::new(dead_threshold);
        for (raw, record) in snapshot.nodes {
            graph.nodes.insert(StateFingerprint::from_raw(raw), record);
        }
        for (locator, count) in snapshot.saturation {
            graph.saturation.insert(locator, count);
        }
        graph.unknown_seq.store(snapshot.unknown_seq, Ordering::SeqCst);
        graph
    }

    fn with_action<F>(
        &self,
        fingerprint: &StateFingerprint,
        action_id: &str,
        mutate: F,
    ) -> Result<(), GraphError>
    where
        F: FnOnce(&mut NodeRecord),
    {
        let mut node = self
            .nodes
            .get_mut(fingerprint)
            .ok_or_else(|| GraphError::UnknownNode(fingerprint.to_string()))?;
        if !node.has_action(action_id) {
            return Err(GraphError::UnknownAction {
                node: fingerprint.to_string(),
                action: action_id.to_string(),
            });
        }
        mutate(&mut node);
        Ok(())
    }
}
