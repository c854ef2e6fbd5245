use core_lending::entity_id;

pub use core_lending::primitives::{DelinquencyBucketId, InstallmentId, LoanId, UsdCents};

entity_id! {
    DelinquencyRangeId,
}
