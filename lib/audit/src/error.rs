use thiserror::Error;

use crate::primitives::AuditEntryId;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("AuditError - EntryNotFound: {0}")]
    EntryNotFound(AuditEntryId),
    #[error("AuditError - EntryAlreadyConcluded: {0}")]
    EntryAlreadyConcluded(AuditEntryId),
    #[error("AuditError - CheckerIsMaker: {0}")]
    CheckerIsMaker(AuditEntryId),
    #[error("AuditError - Serde: {0}")]
    Serde(#[from] serde_json::Error),
}
