use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Structured constraint failure surfaced by the store. The constraint is a
/// name, matched exactly, never a substring of a driver message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub constraint: String,
    pub field: Option<String>,
    pub value: Option<String>,
}

impl ConstraintViolation {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
            field: None,
            value: None,
        }
    }

    pub fn on_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self.value = Some(value.into());
        self
    }
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.field, &self.value) {
            (Some(field), Some(value)) => {
                write!(f, "{} ({field}={value})", self.constraint)
            }
            _ => self.constraint.fmt(f),
        }
    }
}

/// Per-handler table mapping constraint names to named domain errors. Lives
/// with the handler so new commands extend it without touching the
/// dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTranslations {
    entries: HashMap<String, String>,
}

impl ConstraintTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        constraint: impl Into<String>,
        domain_error: impl Into<String>,
    ) -> Self {
        self.entries.insert(constraint.into(), domain_error.into());
        self
    }

    pub fn translate(&self, violation: ConstraintViolation) -> CommandError {
        match self.entries.get(&violation.constraint) {
            Some(domain_error) => CommandError::Integrity {
                error: domain_error.clone(),
                constraint: violation.constraint,
                field: violation.field,
                value: violation.value,
            },
            None => CommandError::UntranslatedConstraint(violation.constraint),
        }
    }
}
