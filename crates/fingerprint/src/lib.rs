//! Deterministic state fingerprinting.
//!
//! A [`StateSnapshot`] carries only structural facts about a perceived
//! state; volatile content (timestamps, live counters, generated ids) is
//! excluded by construction because perception never puts it here. The
//! fingerprinter canonicalizes the facts by sorting them before hashing,
//! so unstable enumeration order on the perception side cannot produce
//! spurious "new state" detections.

mod model;

pub use model::{FieldSchema, StateSnapshot, StructuralFact};

use blake3::Hasher;
use tracing::warn;

use statewalker_core_types::StateFingerprint;

/// Stateless fingerprint function over normalized snapshots.
///
/// Fingerprinting never fails: an empty or otherwise degenerate snapshot
/// yields the `unknown` sentinel, which downstream consumers treat as
/// always-new rather than silently merging unrelated states.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fingerprinter;

impl Fingerprinter {
    pub fn new() -> Self {
        Self
    }

    /// Reduce a snapshot to its canonical fingerprint.
    pub fn fingerprint(&self, snapshot: &StateSnapshot) -> StateFingerprint {
        if snapshot.is_degenerate() {
            warn!(url_path = %snapshot.url_path, "degenerate snapshot, emitting unknown fingerprint");
            return StateFingerprint::unknown();
        }

        let mut lines: Vec<String> = snapshot
            .facts
            .iter()
            .map(StructuralFact::canonical)
            .collect();
        lines.sort_unstable();
        lines.dedup();

        let mut hasher = Hasher::new();
        hasher.update(b"statewalker/v1\n");
        hasher.update(snapshot.url_path.as_bytes());
        hasher.update(b"\n");
        if let Some(title) = &snapshot.title {
            hasher.update(title.as_bytes());
        }
        hasher.update(b"\n");
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }

        StateFingerprint::from_digest(hasher.finalize().to_hex().as_str())
    }
}
