//! Normalized snapshot model supplied by the external perception layer.

use serde::{Deserialize, Serialize};

/// A normalized description of one perceived state.
///
/// Only structural identity belongs here. URL path and title are part of
/// identity; query strings, visible timestamps, and row contents are not
/// and must be stripped before this struct is built.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// URL path without query or fragment.
    pub url_path: String,
    /// Document title, if stable enough to matter.
    pub title: Option<String>,
    /// Structural facts, order-insensitive.
    pub facts: Vec<StructuralFact>,
}

impl StateSnapshot {
    pub fn new(url_path: impl Into<String>) -> Self {
        Self {
            url_path: url_path.into(),
            title: None,
            facts: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_fact(mut self, fact: StructuralFact) -> Self {
        self.facts.push(fact);
        self
    }

    /// True when there is nothing to hash; such input maps to the unknown
    /// sentinel fingerprint.
    pub fn is_degenerate(&self) -> bool {
        self.url_path.is_empty() && self.facts.is_empty()
    }
}

/// One structural fact about a state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum StructuralFact {
    /// Count of elements by tag (button, a, input, form, ...).
    ElementCount { tag: String, count: u32 },
    /// Count of elements by ARIA role.
    RoleCount { role: String, count: u32 },
    /// A visible navigation label.
    NavLabel(String),
    /// Heading tag names in document order (schema, not content).
    HeadingTag(String),
    /// Field schema of one form (types and names, never values).
    FormSchema { fields: Vec<FieldSchema> },
    /// Number of open modal/dialog surfaces.
    ModalCount(u32),
}

impl StructuralFact {
    /// Canonical line used for hashing. Stable across releases; changing
    /// this invalidates every persisted fingerprint.
    pub fn canonical(&self) -> String {
        match self {
            StructuralFact::ElementCount { tag, count } => format!("tag:{tag}={count}"),
            StructuralFact::RoleCount { role, count } => format!("role:{role}={count}"),
            StructuralFact::NavLabel(label) => format!("nav:{}", label.trim()),
            StructuralFact::HeadingTag(tag) => format!("heading:{tag}"),
            StructuralFact::FormSchema { fields } => {
                let parts: Vec<String> = fields.iter().map(FieldSchema::canonical).collect();
                format!("form:[{}]", parts.join(","))
            }
            StructuralFact::ModalCount(count) => format!("modals={count}"),
        }
    }
}

/// Type and name of one form field; values are deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field_type: String,
    pub name: String,
}

impl FieldSchema {
    pub fn new(field_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            name: name.into(),
        }
    }

    fn canonical(&self) -> String {
        format!("{}:{}", self.field_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_lines_are_stable() {
        let fact = StructuralFact::FormSchema {
            fields: vec![FieldSchema::new("text", "email")],
        };
        assert_eq!(fact.canonical(), "form:[text:email]");
        assert_eq!(
            StructuralFact::NavLabel("  Users ".into()).canonical(),
            "nav:Users"
        );
    }
}
