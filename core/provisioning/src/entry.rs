use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

/// One aggregated reserve position: all active loans of one product in one
/// office falling into one ageing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRow {
    pub office_id: OfficeId,
    pub product_id: LoanProductId,
    pub category: String,
    pub outstanding: UsdCents,
    pub provisioned: UsdCents,
}

/// Snapshot of the required reserve for one criteria at one date. Net
/// postings are derived by diffing consecutive entries; an entry is never
/// mutated after creation.
#[derive(Debug, Clone)]
pub struct ProvisioningEntry {
    pub id: ProvisioningEntryId,
    pub criteria_id: ProvisioningCriteriaId,
    pub as_of: NaiveDate,
    pub rows: Vec<ProvisioningRow>,
    pub journal_entries_created: bool,
}

impl ProvisioningEntry {
    pub fn total_provisioned(&self) -> UsdCents {
        self.rows.iter().map(|r| r.provisioned).sum()
    }

    pub fn provisioned_for(
        &self,
        office_id: OfficeId,
        product_id: LoanProductId,
        category: &str,
    ) -> UsdCents {
        self.rows
            .iter()
            .find(|r| {
                r.office_id == office_id && r.product_id == product_id && r.category == category
            })
            .map(|r| r.provisioned)
            .unwrap_or(UsdCents::ZERO)
    }
}

#[derive(Clone, Default)]
pub struct ProvisioningEntryRepo {
    entries: Arc<RwLock<HashMap<ProvisioningCriteriaId, Vec<ProvisioningEntry>>>>,
}

impl ProvisioningEntryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, entry: ProvisioningEntry) -> ProvisioningEntry {
        self.entries
            .write()
            .expect("entries lock")
            .entry(entry.criteria_id)
            .or_default()
            .push(entry.clone());
        entry
    }

    /// The most recently created entry for the criteria; the baseline the
    /// next computation diffs against.
    pub fn latest_for_criteria(
        &self,
        criteria_id: ProvisioningCriteriaId,
    ) -> Option<ProvisioningEntry> {
        self.entries
            .read()
            .expect("entries lock")
            .get(&criteria_id)
            .and_then(|entries| entries.last().cloned())
    }

    pub fn list_for_criteria(
        &self,
        criteria_id: ProvisioningCriteriaId,
    ) -> Vec<ProvisioningEntry> {
        self.entries
            .read()
            .expect("entries lock")
            .get(&criteria_id)
            .cloned()
            .unwrap_or_default()
    }
}
