use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

use super::error::ProvisioningCriteriaError;

/// One reserve band: loans whose age falls in `[min_age_days, max_age_days]`
/// are provisioned at `provisioning_pct` of outstanding. GL accounts are
/// optional at configuration time and checked when entries are posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningCategory {
    pub name: String,
    pub min_age_days: u32,
    pub max_age_days: Option<u32>,
    pub provisioning_pct: Decimal,
    pub liability_account: Option<GlAccountId>,
    pub expense_account: Option<GlAccountId>,
}

impl ProvisioningCategory {
    pub fn contains(&self, age_days: u32) -> bool {
        age_days >= self.min_age_days
            && self.max_age_days.map_or(true, |max| age_days <= max)
    }
}

/// Which products are provisioned, and at what rates per ageing band. The
/// band set must cover `[0, ∞)` without gaps, like a delinquency bucket.
#[derive(Debug, Clone)]
pub struct ProvisioningCriteria {
    pub id: ProvisioningCriteriaId,
    pub name: String,
    pub product_ids: Vec<LoanProductId>,
    pub categories: Vec<ProvisioningCategory>,
}

impl ProvisioningCriteria {
    pub fn category_for_age(&self, age_days: u32) -> Option<&ProvisioningCategory> {
        self.categories.iter().find(|c| c.contains(age_days))
    }

    pub fn category_by_name(&self, name: &str) -> Option<&ProvisioningCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Builder)]
pub struct NewProvisioningCriteria {
    #[builder(setter(into))]
    pub(super) id: ProvisioningCriteriaId,
    #[builder(setter(into))]
    pub(super) name: String,
    #[builder(default)]
    pub(super) product_ids: Vec<LoanProductId>,
    pub(super) categories: Vec<ProvisioningCategory>,
}

impl NewProvisioningCriteria {
    pub fn builder() -> NewProvisioningCriteriaBuilder {
        NewProvisioningCriteriaBuilder::default()
    }

    pub(super) fn into_criteria(self) -> Result<ProvisioningCriteria, ProvisioningCriteriaError> {
        let mut categories = self.categories;
        categories.sort_by_key(|c| c.min_age_days);
        validate_cover(&categories)?;
        Ok(ProvisioningCriteria {
            id: self.id,
            name: self.name,
            product_ids: self.product_ids,
            categories,
        })
    }
}

fn validate_cover(categories: &[ProvisioningCategory]) -> Result<(), ProvisioningCriteriaError> {
    use ProvisioningCriteriaError::*;

    let Some(first) = categories.first() else {
        return Err(NoCategories);
    };
    if first.min_age_days != 0 {
        return Err(FirstCategoryMustStartAtZero(first.min_age_days));
    }
    for window in categories.windows(2) {
        let (prior, next) = (&window[0], &window[1]);
        let Some(prior_max) = prior.max_age_days else {
            return Err(UnboundedCategoryBeforeLast(prior.min_age_days));
        };
        if next.min_age_days != prior_max + 1 {
            return Err(GapOrOverlapBetweenCategories {
                prior_max,
                next_min: next.min_age_days,
            });
        }
    }
    let last = categories.last().expect("non-empty checked above");
    if let Some(max) = last.max_age_days {
        return Err(LastCategoryMustBeUnbounded(max));
    }
    Ok(())
}
