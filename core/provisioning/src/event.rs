use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

#[derive(Debug, Clone, Serialize, Deserialize, strum::AsRefStr)]
#[serde(tag = "type")]
pub enum ProvisioningEvent {
    PeriodicAccrualsPosted {
        till: NaiveDate,
        loans_accrued: usize,
    },
    ProvisioningEntryCreated {
        entry_id: ProvisioningEntryId,
        criteria_id: ProvisioningCriteriaId,
        as_of: NaiveDate,
        total_provisioned: UsdCents,
    },
}
