use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::primitives::{DelinquencyRangeId, InstallmentId, LoanId, UsdCents};

/// Materialized classification of one overdue installment. The whole set
/// for a loan is replaced on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentDelinquencyTag {
    pub loan_id: LoanId,
    pub installment_id: InstallmentId,
    pub range_id: DelinquencyRangeId,
    pub classification: String,
    pub outstanding: UsdCents,
    pub added_on: NaiveDate,
}

#[derive(Clone, Default)]
pub struct DelinquencyTagRepo {
    tags: Arc<RwLock<HashMap<LoanId, Vec<InstallmentDelinquencyTag>>>>,
}

impl DelinquencyTagRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags_for_loan(&self, loan_id: LoanId) -> Vec<InstallmentDelinquencyTag> {
        self.tags
            .read()
            .expect("tags lock")
            .get(&loan_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Swaps the loan's tag set in one step. Returns `false` when the new
    /// set matches what is already stored (ignoring `added_on`, which is
    /// preserved in that case).
    pub fn replace_for_loan(
        &self,
        loan_id: LoanId,
        new_tags: Vec<InstallmentDelinquencyTag>,
    ) -> bool {
        let mut tags = self.tags.write().expect("tags lock");
        let unchanged = match tags.get(&loan_id) {
            None => new_tags.is_empty(),
            Some(current) => {
                current.len() == new_tags.len()
                    && current.iter().zip(&new_tags).all(|(a, b)| {
                        a.installment_id == b.installment_id
                            && a.range_id == b.range_id
                            && a.outstanding == b.outstanding
                    })
            }
        };
        if unchanged {
            return false;
        }
        if new_tags.is_empty() {
            tags.remove(&loan_id);
        } else {
            tags.insert(loan_id, new_tags);
        }
        true
    }
}
