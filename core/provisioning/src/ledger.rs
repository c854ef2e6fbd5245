use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::primitives::{GlAccountId, UsdCents};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("LedgerError - UnknownAccount: {0}")]
    UnknownAccount(GlAccountId),
    #[error("LedgerError - Unbalanced: debits {debits} != credits {credits}")]
    Unbalanced { debits: UsdCents, credits: UsdCents },
    #[error("LedgerError - EmptyEntry")]
    EmptyEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Debit,
    Credit,
}

#[derive(Debug, Clone)]
pub struct JournalEntryLine {
    pub account: GlAccountId,
    pub direction: Direction,
    pub amount: UsdCents,
}

/// Balanced double-entry posting. Amounts are always positive; direction
/// carries the sign.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub effective: NaiveDate,
    pub narrative: String,
    pub lines: Vec<JournalEntryLine>,
}

impl JournalEntry {
    pub fn new(effective: NaiveDate, narrative: impl Into<String>) -> Self {
        Self {
            effective,
            narrative: narrative.into(),
            lines: Vec::new(),
        }
    }

    pub fn debit(mut self, account: GlAccountId, amount: UsdCents) -> Self {
        self.lines.push(JournalEntryLine {
            account,
            direction: Direction::Debit,
            amount,
        });
        self
    }

    pub fn credit(mut self, account: GlAccountId, amount: UsdCents) -> Self {
        self.lines.push(JournalEntryLine {
            account,
            direction: Direction::Credit,
            amount,
        });
        self
    }

    pub fn balanced(&self) -> bool {
        let debits: UsdCents = self
            .lines
            .iter()
            .filter(|l| l.direction == Direction::Debit)
            .map(|l| l.amount)
            .sum();
        let credits: UsdCents = self
            .lines
            .iter()
            .filter(|l| l.direction == Direction::Credit)
            .map(|l| l.amount)
            .sum();
        debits == credits
    }
}

/// The GL surface the accrual and provisioning engines post through.
#[async_trait]
pub trait JournalPoster: Send + Sync {
    async fn post(&self, entry: JournalEntry) -> Result<(), LedgerError>;
}

/// In-process poster that verifies and records entries. With a known
/// account set configured it also rejects postings to unknown accounts.
#[derive(Clone, Default)]
pub struct RecordingLedger {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
    known_accounts: Option<HashSet<GlAccountId>>,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_accounts(accounts: impl IntoIterator<Item = GlAccountId>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            known_accounts: Some(accounts.into_iter().collect()),
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().expect("ledger lock").clone()
    }
}

#[async_trait]
impl JournalPoster for RecordingLedger {
    async fn post(&self, entry: JournalEntry) -> Result<(), LedgerError> {
        if entry.lines.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }
        if !entry.balanced() {
            let sum = |direction| {
                entry
                    .lines
                    .iter()
                    .filter(|l| l.direction == direction)
                    .map(|l| l.amount)
                    .sum()
            };
            return Err(LedgerError::Unbalanced {
                debits: sum(Direction::Debit),
                credits: sum(Direction::Credit),
            });
        }
        if let Some(known) = &self.known_accounts {
            for line in &entry.lines {
                if !known.contains(&line.account) {
                    return Err(LedgerError::UnknownAccount(line.account));
                }
            }
        }
        self.entries.lock().expect("ledger lock").push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    #[tokio::test]
    async fn unbalanced_entry_is_rejected() {
        let ledger = RecordingLedger::new();
        let entry = JournalEntry::new(date(), "test")
            .debit(GlAccountId::new(), UsdCents::from(100))
            .credit(GlAccountId::new(), UsdCents::from(99));
        assert!(matches!(
            ledger.post(entry).await.unwrap_err(),
            LedgerError::Unbalanced { .. }
        ));
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let known = GlAccountId::new();
        let ledger = RecordingLedger::with_known_accounts([known]);
        let entry = JournalEntry::new(date(), "test")
            .debit(known, UsdCents::from(100))
            .credit(GlAccountId::new(), UsdCents::from(100));
        assert!(matches!(
            ledger.post(entry).await.unwrap_err(),
            LedgerError::UnknownAccount(_)
        ));
    }
}
