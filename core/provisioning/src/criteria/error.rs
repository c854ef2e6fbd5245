use thiserror::Error;

use crate::primitives::ProvisioningCriteriaId;

#[derive(Error, Debug)]
pub enum ProvisioningCriteriaError {
    #[error("ProvisioningCriteriaError - CriteriaNotFound: {0}")]
    CriteriaNotFound(ProvisioningCriteriaId),
    #[error("ProvisioningCriteriaError - DuplicateCriteriaName: {0}")]
    DuplicateCriteriaName(String),
    #[error("ProvisioningCriteriaError - NoCategories")]
    NoCategories,
    #[error("ProvisioningCriteriaError - FirstCategoryMustStartAtZero: starts at {0}")]
    FirstCategoryMustStartAtZero(u32),
    #[error(
        "ProvisioningCriteriaError - GapOrOverlapBetweenCategories: category starting at {next_min} follows category ending at {prior_max}"
    )]
    GapOrOverlapBetweenCategories { prior_max: u32, next_min: u32 },
    #[error("ProvisioningCriteriaError - UnboundedCategoryBeforeLast: category starting at {0}")]
    UnboundedCategoryBeforeLast(u32),
    #[error("ProvisioningCriteriaError - LastCategoryMustBeUnbounded: ends at {0}")]
    LastCategoryMustBeUnbounded(u32),
    #[error("ProvisioningCriteriaError - Builder: {0}")]
    Builder(#[from] super::entity::NewProvisioningCriteriaBuilderError),
}
