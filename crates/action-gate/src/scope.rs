//! Scope pinning for focused exploration runs.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use statewalker_core_types::{ActionDescriptor, ActionKind};

/// Restricts exploration to one page/path of the target application.
///
/// Navigation actions whose target resolves outside the pinned path are
/// reported out of scope; the controller marks them dead instead of
/// following them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeRule {
    target_path: String,
}

impl ScopeRule {
    /// Pin scope to the path of `target_url`.
    pub fn pin(target_url: &str) -> Option<Self> {
        let parsed = Url::parse(target_url).ok()?;
        Some(Self {
            target_path: parsed.path().to_string(),
        })
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// Decide whether `action`, perceived at `current_url`, stays in scope.
    /// Returns the rejection reason for out-of-scope actions.
    pub fn check(&self, action: &ActionDescriptor, current_url: &str) -> Result<(), String> {
        if !matches!(action.kind, ActionKind::Navigate) {
            return Ok(());
        }
        let Some(hint) = action.target_hint.as_deref() else {
            return Ok(());
        };

        let resolved = match Url::parse(current_url) {
            Ok(base) => base.join(hint).ok(),
            Err(_) => Url::parse(hint).ok(),
        };
        let Some(resolved) = resolved else {
            return Ok(());
        };

        if resolved.path() == self.target_path {
            Ok(())
        } else {
            debug!(action = %action.id, path = resolved.path(), "navigation out of scope");
            Err(format!(
                "navigation to {} leaves pinned scope {}",
                resolved.path(),
                self.target_path
            ))
        }
    }
}
