use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

/// One immutable record of a state-changing command: what ran, who ran it,
/// what came out. The changes map is the field-level diff the handler
/// reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub entity: String,
    pub action: String,
    pub resource_id: Option<String>,
    pub payload: serde_json::Value,
    pub changes: serde_json::Map<String, serde_json::Value>,
    pub maker: AuditSubject,
    pub made_at: DateTime<Utc>,
    pub processing_result: ProcessingResult,
    pub checker: Option<AuditSubject>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    pub fn is_terminal(&self) -> bool {
        self.processing_result.is_terminal()
    }
}

#[derive(Debug, Builder)]
pub struct NewAuditEntry {
    #[builder(setter(into))]
    pub(super) entity: String,
    #[builder(setter(into))]
    pub(super) action: String,
    #[builder(setter(strip_option, into), default)]
    pub(super) resource_id: Option<String>,
    pub(super) payload: serde_json::Value,
    #[builder(default)]
    pub(super) changes: serde_json::Map<String, serde_json::Value>,
    #[builder(setter(into))]
    pub(super) maker: AuditSubject,
}

impl NewAuditEntry {
    pub fn builder() -> NewAuditEntryBuilder {
        NewAuditEntryBuilder::default()
    }

    pub(super) fn into_entry(self, result: ProcessingResult, now: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            id: AuditEntryId::new(),
            entity: self.entity,
            action: self.action,
            resource_id: self.resource_id,
            payload: self.payload,
            changes: self.changes,
            maker: self.maker,
            made_at: now,
            processing_result: result,
            checker: None,
            checked_at: None,
        }
    }
}
