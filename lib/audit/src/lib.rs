#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

mod entry;
pub mod error;
mod primitives;
mod purge_job;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

pub use entry::{AuditEntry, NewAuditEntry, NewAuditEntryBuilder};
use error::AuditError;
pub use primitives::{AuditEntryId, AuditSubject, ProcessingResult};
pub use purge_job::{AuditPurgeInit, AuditPurgeJobConfig};

/// Append-only log of command executions, independent of the business
/// entities the entries describe.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl AuditLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Records a command that has already executed.
    #[instrument(name = "audit.record", skip(self, new_entry))]
    pub fn record(&self, new_entry: NewAuditEntry) -> AuditEntry {
        self.push(new_entry, ProcessingResult::Processed)
    }

    /// Records a maker-checker command awaiting a checker's decision.
    #[instrument(name = "audit.record_awaiting_approval", skip(self, new_entry))]
    pub fn record_awaiting_approval(&self, new_entry: NewAuditEntry) -> AuditEntry {
        self.push(new_entry, ProcessingResult::AwaitingApproval)
    }

    fn push(&self, new_entry: NewAuditEntry, result: ProcessingResult) -> AuditEntry {
        let entry = new_entry.into_entry(result, Utc::now());
        self.entries.write().expect("poisoned").push(entry.clone());
        entry
    }

    pub fn approve(
        &self,
        id: AuditEntryId,
        checker: impl Into<AuditSubject>,
    ) -> Result<AuditEntry, AuditError> {
        self.conclude(id, checker.into(), ProcessingResult::Processed)
    }

    pub fn reject(
        &self,
        id: AuditEntryId,
        checker: impl Into<AuditSubject>,
    ) -> Result<AuditEntry, AuditError> {
        self.conclude(id, checker.into(), ProcessingResult::Rejected)
    }

    fn conclude(
        &self,
        id: AuditEntryId,
        checker: AuditSubject,
        result: ProcessingResult,
    ) -> Result<AuditEntry, AuditError> {
        let mut entries = self.entries.write().expect("poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AuditError::EntryNotFound(id))?;
        if entry.processing_result != ProcessingResult::AwaitingApproval {
            return Err(AuditError::EntryAlreadyConcluded(id));
        }
        if entry.maker == checker {
            return Err(AuditError::CheckerIsMaker(id));
        }
        entry.processing_result = result;
        entry.checker = Some(checker);
        entry.checked_at = Some(Utc::now());
        Ok(entry.clone())
    }

    pub fn find_by_id(&self, id: AuditEntryId) -> Result<AuditEntry, AuditError> {
        self.entries
            .read()
            .expect("poisoned")
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(AuditError::EntryNotFound(id))
    }

    pub fn list(&self) -> Vec<AuditEntry> {
        self.entries.read().expect("poisoned").clone()
    }

    /// Deletes terminal entries older than the retention window. Entries
    /// still awaiting a checker are never purged regardless of age.
    #[instrument(name = "audit.purge", skip(self))]
    pub fn purge(&self, retention_days: u32, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(i64::from(retention_days));
        let mut entries = self.entries.write().expect("poisoned");
        let before = entries.len();
        entries.retain(|e| !e.is_terminal() || e.made_at >= cutoff);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(maker: &str) -> NewAuditEntry {
        NewAuditEntry::builder()
            .entity("DELINQUENCY_BUCKET")
            .action("CREATE")
            .payload(serde_json::json!({ "name": "default" }))
            .maker(maker)
            .build()
            .unwrap()
    }

    #[test]
    fn maker_checker_approval_flow() {
        let log = AuditLog::new();
        let entry = log.record_awaiting_approval(new_entry("maker"));
        assert_eq!(
            entry.processing_result,
            ProcessingResult::AwaitingApproval
        );

        let approved = log.approve(entry.id, "checker").unwrap();
        assert_eq!(approved.processing_result, ProcessingResult::Processed);
        assert_eq!(approved.checker, Some(AuditSubject::from("checker")));

        // terminal entries cannot be concluded twice
        assert!(matches!(
            log.approve(entry.id, "another-checker"),
            Err(AuditError::EntryAlreadyConcluded(_))
        ));
    }

    #[test]
    fn checker_must_differ_from_maker() {
        let log = AuditLog::new();
        let entry = log.record_awaiting_approval(new_entry("alice"));
        assert!(matches!(
            log.approve(entry.id, "alice"),
            Err(AuditError::CheckerIsMaker(_))
        ));
    }

    #[test]
    fn purge_respects_retention_window() {
        let log = AuditLog::new();
        let old = log.record(new_entry("maker"));
        let recent = log.record(new_entry("maker"));

        // age the first entry by 3 days
        {
            let mut entries = log.entries.write().unwrap();
            entries
                .iter_mut()
                .find(|e| e.id == old.id)
                .unwrap()
                .made_at -= Duration::days(3);
            entries
                .iter_mut()
                .find(|e| e.id == recent.id)
                .unwrap()
                .made_at -= Duration::days(1);
        }

        let deleted = log.purge(2, Utc::now());
        assert_eq!(deleted, 1);
        assert!(log.find_by_id(old.id).is_err());
        assert!(log.find_by_id(recent.id).is_ok());
    }

    #[test]
    fn purge_never_touches_pending_entries() {
        let log = AuditLog::new();
        let pending = log.record_awaiting_approval(new_entry("maker"));
        {
            let mut entries = log.entries.write().unwrap();
            entries.first_mut().unwrap().made_at -= Duration::days(30);
        }

        assert_eq!(log.purge(2, Utc::now()), 0);
        assert!(log.find_by_id(pending.id).is_ok());
    }
}
