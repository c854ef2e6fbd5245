use core_lending::entity_id;

pub use core_lending::primitives::{
    GlAccountId, LoanId, LoanProductId, OfficeId, SignedUsdCents, UsdCents,
};

entity_id! {
    ProvisioningCriteriaId,
    ProvisioningEntryId,
}
