use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::primitives::LoanId;

#[derive(Debug, Clone, Serialize, Deserialize, strum::AsRefStr)]
#[serde(tag = "type")]
pub enum DelinquencyEvent {
    LoanTagsRefreshed {
        loan_id: LoanId,
        as_of: NaiveDate,
        tagged_installments: usize,
    },
}
