//! Scripted site driver.
//!
//! A small YAML site model that stands in for a live application: each
//! state declares a URL and a list of labelled actions with declared
//! effects. The driver implements the perception and execution ports, so
//! the whole engine can be exercised end to end without a browser. Useful
//! for dry runs, demos, and integration tests.
//!
//! ```yaml
//! root: home
//! states:
//!   home:
//!     url: https://demo.test/home
//!     actions:
//!       - label: Open reports
//!         kind: click
//!         effect: { goto: reports }
//!   reports:
//!     url: https://demo.test/reports
//!     actions: []
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use url::Url;

use statewalker_action_gate::SpecialHandling;
use statewalker_core_types::{ActionDescriptor, ActionKind, NodeContext, TransitionKind};
use statewalker_explorer::{ActionExecutor, Observation, Perception, PortError};
use statewalker_fingerprint::{StateSnapshot, StructuralFact};

/// Declared effect of executing one scripted action.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEffect {
    /// Navigate to another state.
    Goto(String),
    /// In-place structural change to another state (same or different URL).
    Mutate(String),
    /// No observable change.
    Noop,
    /// Executor-level failure with a reason.
    Error(String),
    /// Destructive commit; only happens without verify-then-cancel.
    Commit(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptAction {
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: ActionKind,
    /// Navigation target hint exposed to the scope rule.
    #[serde(default)]
    pub target: Option<String>,
    /// Externally tagged enums only accept `!tag` YAML natively; the
    /// singleton-map form keeps `effect: { goto: reports }` working.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub effect: ScriptEffect,
}

fn default_kind() -> ActionKind {
    ActionKind::Click
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptState {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Overlay states (modals, drawers) share a URL with their base state.
    #[serde(default)]
    pub overlay: bool,
    #[serde(default)]
    pub actions: Vec<ScriptAction>,
}

/// Whole-site model loaded from YAML.
#[derive(Clone, Debug, Deserialize)]
pub struct SiteScript {
    pub root: String,
    pub states: BTreeMap<String, ScriptState>,
}

impl SiteScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site script {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: SiteScript = serde_yaml::from_str(yaml).context("invalid site script")?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        if !self.states.contains_key(&self.root) {
            bail!("root state `{}` is not declared", self.root);
        }
        for (name, state) in &self.states {
            Url::parse(&state.url)
                .with_context(|| format!("state `{name}` has an invalid url"))?;
            for action in &state.actions {
                let target = match &action.effect {
                    ScriptEffect::Goto(t) | ScriptEffect::Mutate(t) => Some(t),
                    _ => None,
                };
                if let Some(target) = target {
                    if !self.states.contains_key(target) {
                        bail!("state `{name}` action `{}` points at undeclared state `{target}`", action.label);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn root_url(&self) -> &str {
        &self.states[&self.root].url
    }
}

/// Perception and execution over a [`SiteScript`].
pub struct ScriptedDriver {
    script: SiteScript,
    /// Pre-built inventories per state, positions fixed at load time.
    inventories: BTreeMap<String, Vec<(ActionDescriptor, ScriptEffect)>>,
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
    committed: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new(script: SiteScript) -> Arc<Self> {
        let mut inventories = BTreeMap::new();
        for (name, state) in &script.states {
            let mut inventory = Vec::with_capacity(state.actions.len());
            for (position, action) in state.actions.iter().enumerate() {
                let mut descriptor =
                    ActionDescriptor::new(&action.label, action.kind, position as u32);
                if let Some(target) = &action.target {
                    descriptor = descriptor.with_target(target.clone());
                }
                inventory.push((descriptor, action.effect.clone()));
            }
            inventories.insert(name.clone(), inventory);
        }
        let root = script.root.clone();
        Arc::new(Self {
            script,
            inventories,
            current: Mutex::new(root),
            history: Mutex::new(Vec::new()),
            committed: Mutex::new(Vec::new()),
        })
    }

    /// Destructive commits that actually went through.
    pub fn committed(&self) -> Vec<String> {
        self.committed.lock().clone()
    }

    pub fn current_state(&self) -> String {
        self.current.lock().clone()
    }

    fn state(&self, name: &str) -> &ScriptState {
        &self.script.states[name]
    }
}

#[async_trait]
impl Perception for ScriptedDriver {
    async fn observe(&self) -> Result<Observation, PortError> {
        let name = self.current.lock().clone();
        let state = self.state(&name);
        let inventory = &self.inventories[&name];

        let path = Url::parse(&state.url)
            .map(|u| u.path().to_string())
            .map_err(|e| PortError::Perception(e.to_string()))?;
        let mut snapshot = StateSnapshot::new(path).with_fact(StructuralFact::ElementCount {
            tag: "button".to_string(),
            count: inventory.len() as u32,
        });
        if let Some(title) = &state.title {
            snapshot = snapshot.with_title(title.clone());
        }
        for (descriptor, _) in inventory {
            snapshot = snapshot.with_fact(StructuralFact::NavLabel(descriptor.label.clone()));
        }
        if state.overlay {
            snapshot = snapshot.with_fact(StructuralFact::ModalCount(1));
        }

        Ok(Observation {
            snapshot,
            actions: inventory.iter().map(|(d, _)| d.clone()).collect(),
            url: state.url.clone(),
        })
    }

    async fn go_back(&self) -> Result<(), PortError> {
        let mut history = self.history.lock();
        match history.pop() {
            Some(previous) => {
                *self.current.lock() = previous;
                Ok(())
            }
            None => Err(PortError::Restoration("history is empty".to_string())),
        }
    }

    /// Replays the context's breadcrumb from the root; overlay states
    /// share a URL with their base, so the label trail is what identifies
    /// the state to bring back.
    async fn restore(&self, context: &NodeContext) -> Result<(), PortError> {
        let mut name = self.script.root.clone();
        let mut trail = Vec::new();
        for label in &context.breadcrumb {
            let effect = self
                .state(&name)
                .actions
                .iter()
                .find(|a| a.label == *label)
                .map(|a| a.effect.clone())
                .ok_or_else(|| {
                    PortError::Restoration(format!("cannot replay `{label}` from `{name}`"))
                })?;
            name = match effect {
                ScriptEffect::Goto(target) => {
                    trail.push(name);
                    target
                }
                ScriptEffect::Mutate(target) => target,
                _ => {
                    return Err(PortError::Restoration(format!(
                        "`{label}` does not reach a state"
                    )))
                }
            };
        }
        *self.current.lock() = name;
        *self.history.lock() = trail;
        Ok(())
    }

    async fn goto_root(&self) -> Result<(), PortError> {
        *self.current.lock() = self.script.root.clone();
        self.history.lock().clear();
        Ok(())
    }
}

#[async_trait]
impl ActionExecutor for ScriptedDriver {
    async fn execute(
        &self,
        action: &ActionDescriptor,
        special_handling: Option<SpecialHandling>,
    ) -> Result<TransitionKind, PortError> {
        let name = self.current.lock().clone();
        let effect = self.inventories[&name]
            .iter()
            .find(|(d, _)| d.id == action.id)
            .map(|(_, e)| e.clone())
            .ok_or_else(|| {
                PortError::Execution(format!("action {} not present in state {name}", action.id))
            })?;

        match effect {
            ScriptEffect::Goto(target) => {
                self.history.lock().push(name);
                *self.current.lock() = target.clone();
                let url = self.state(&target).url.clone();
                Ok(TransitionKind::Navigation {
                    context: NodeContext::root(url),
                })
            }
            ScriptEffect::Mutate(target) => {
                *self.current.lock() = target;
                Ok(TransitionKind::DomChange)
            }
            ScriptEffect::Noop => Ok(TransitionKind::NoChange),
            ScriptEffect::Error(reason) => Ok(TransitionKind::Error { reason }),
            ScriptEffect::Commit(what) => {
                if special_handling == Some(SpecialHandling::VerifyThenCancel) {
                    // Confirmation surface raised and dismissed; nothing
                    // actually committed.
                    Ok(TransitionKind::DomChange)
                } else {
                    self.committed.lock().push(what);
                    Ok(TransitionKind::DomChange)
                }
            }
        }
    }
}
