use serde::{Deserialize, Serialize};

/// The objective a run is working toward.
///
/// The goal is opaque to the execution engine: it never influences
/// traversal or retry decisions. It exists so the run tracker can
/// associate every run, decision, and outcome with what the run was
/// trying to achieve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier for this goal.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What success looks like, in prose.
    #[serde(default)]
    pub description: String,
}

impl Goal {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}
