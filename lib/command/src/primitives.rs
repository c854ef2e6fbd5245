use serde::{Deserialize, Serialize};

/// Registry key of a state-changing operation, e.g. `DELINQUENCY_BUCKET|CREATE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandKey {
    entity: String,
    action: String,
}

impl CommandKey {
    pub fn new(entity: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            action: action.into(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl std::fmt::Display for CommandKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.entity, self.action)
    }
}

/// What a handler hands back: the id of the touched resource and the
/// field-level diff it applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResult {
    pub resource_id: Option<String>,
    pub changes: serde_json::Map<String, serde_json::Value>,
}

impl CommandResult {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            changes: serde_json::Map::new(),
        }
    }

    pub fn with_change(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.changes.insert(field.into(), value);
        self
    }
}
