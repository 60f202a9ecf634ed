//! Shared primitives for the statewalker exploration kernel.
//!
//! Everything the graph, gate, and controller crates exchange lives here:
//! state fingerprints, action descriptors, transition outcomes, and the
//! navigation context that ties a discovered state back to a location.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared message-style error for cross-crate boundaries.
#[derive(Debug, Error, Clone)]
pub enum WalkerError {
    #[error("{message}")]
    Message { message: String },
}

impl WalkerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifier for one exploration session.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefix carried by every real fingerprint digest.
pub const FINGERPRINT_PREFIX: &str = "st_";

/// Sentinel digest for states that could not be fingerprinted.
pub const UNKNOWN_FINGERPRINT: &str = "st_unknown";

/// Canonical identifier for one discovered UI state.
///
/// Real fingerprints are `st_<hex>` digests produced by the fingerprint
/// crate. The `unknown` sentinel marks a state whose perception input was
/// empty or malformed; consumers must treat it as always-new and never
/// deduplicate it against earlier sightings.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateFingerprint(String);

impl StateFingerprint {
    /// Wrap a hex digest produced by the fingerprint crate.
    pub fn from_digest(hex: impl AsRef<str>) -> Self {
        Self(format!("{}{}", FINGERPRINT_PREFIX, hex.as_ref()))
    }

    /// Sentinel for unperceivable states.
    pub fn unknown() -> Self {
        Self(UNKNOWN_FINGERPRINT.to_string())
    }

    /// Rehydrate a fingerprint from persisted form.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_FINGERPRINT || self.0.starts_with("st_unknown:")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(FINGERPRINT_PREFIX.len() + 12);
        &self.0[..end]
    }
}

impl fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse interaction category for a candidate action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Fill,
    Select,
    Toggle,
    Hover,
    Navigate,
    Submit,
    Other,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Toggle => "toggle",
            ActionKind::Hover => "hover",
            ActionKind::Navigate => "navigate",
            ActionKind::Submit => "submit",
            ActionKind::Other => "other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One candidate interaction within a state.
///
/// The `id` is local to the owning state and derived from content
/// (label + kind + position signature), so repeated scans of the same
/// state reproduce the same id regardless of enumeration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Content-derived local id, unique within the owning state only.
    pub id: String,
    /// Human-readable label as perceived.
    pub label: String,
    /// Coarse interaction category.
    pub kind: ActionKind,
    /// Target location hint (href, route) when the action navigates.
    pub target_hint: Option<String>,
    /// Effect depends on prior state (e.g. a sub-menu item); backtracking
    /// must replay rather than just go back.
    pub requires_replay: bool,
    /// Free-form locator hints for the executor.
    pub metadata: serde_json::Value,
}

impl ActionDescriptor {
    pub fn new(label: impl Into<String>, kind: ActionKind, position: u32) -> Self {
        let label = label.into();
        let id = Self::derive_id(&label, kind, position);
        Self {
            id,
            label,
            kind,
            target_hint: None,
            requires_replay: false,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_target(mut self, hint: impl Into<String>) -> Self {
        self.target_hint = Some(hint.into());
        self
    }

    pub fn with_replay(mut self) -> Self {
        self.requires_replay = true;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Derive the content signature used as local id.
    ///
    /// Position disambiguates identically-labelled siblings (two "Edit"
    /// buttons in a table); the label is truncated so long texts do not
    /// produce unwieldy ids.
    pub fn derive_id(label: &str, kind: ActionKind, position: u32) -> String {
        let trimmed = label.trim();
        let head: String = trimmed.chars().take(48).collect();
        format!("{}:{}#{}", kind.name(), head.to_lowercase(), position)
    }

    /// Signature used by loop detection (action + target identity).
    pub fn signature(&self) -> String {
        format!("{}:{}", self.kind.name(), self.id)
    }
}

/// Location context a state was discovered under.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeContext {
    /// URL the state was observed at.
    pub url: String,
    /// Action labels taken from the root to reach this state.
    pub breadcrumb: Vec<String>,
}

impl NodeContext {
    pub fn root(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            breadcrumb: Vec::new(),
        }
    }

    /// Context of a state reached by taking `label` from this one.
    pub fn child(&self, url: impl Into<String>, label: &str) -> Self {
        let mut breadcrumb = self.breadcrumb.clone();
        breadcrumb.push(label.to_string());
        Self {
            url: url.into(),
            breadcrumb,
        }
    }

    pub fn depth(&self) -> usize {
        self.breadcrumb.len()
    }
}

impl fmt::Display for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.breadcrumb.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{} ({})", self.url, self.breadcrumb.join(" > "))
        }
    }
}

/// Observable outcome of executing one action, as reported by the executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionKind {
    /// URL or content identity changed.
    Navigation { context: NodeContext },
    /// Same location, observable structural change.
    DomChange,
    /// No observable effect.
    NoChange,
    /// The action itself failed; local to this action, never fatal.
    Error { reason: String },
}

impl TransitionKind {
    pub fn is_progress(&self) -> bool {
        matches!(self, TransitionKind::Navigation { .. } | TransitionKind::DomChange)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransitionKind::Navigation { .. } => "navigation",
            TransitionKind::DomChange => "dom_change",
            TransitionKind::NoChange => "no_change",
            TransitionKind::Error { .. } => "error",
        }
    }
}
