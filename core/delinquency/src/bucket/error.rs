use thiserror::Error;

use core_lending::primitives::LoanProductId;

use crate::primitives::{DelinquencyBucketId, DelinquencyRangeId};

#[derive(Error, Debug)]
pub enum DelinquencyBucketError {
    #[error("DelinquencyBucketError - BucketNotFound: {0}")]
    BucketNotFound(DelinquencyBucketId),
    #[error("DelinquencyBucketError - RangeNotFound: {0}")]
    RangeNotFound(DelinquencyRangeId),
    #[error("DelinquencyBucketError - DuplicateBucketName: {0}")]
    DuplicateBucketName(String),
    #[error("DelinquencyBucketError - EmptyBucket")]
    EmptyBucket,
    #[error("DelinquencyBucketError - FirstRangeMustStartAtZero: starts at {0}")]
    FirstRangeMustStartAtZero(u32),
    #[error(
        "DelinquencyBucketError - GapOrOverlapBetweenRanges: range starting at {next_min} follows range ending at {prior_max}"
    )]
    GapOrOverlapBetweenRanges { prior_max: u32, next_min: u32 },
    #[error("DelinquencyBucketError - UnboundedRangeBeforeLast: range starting at {0} has no upper bound")]
    UnboundedRangeBeforeLast(u32),
    #[error("DelinquencyBucketError - LastRangeMustBeUnbounded: ends at {0}")]
    LastRangeMustBeUnbounded(u32),
    #[error("DelinquencyBucketError - BucketReferencedByProducts: {0:?}")]
    BucketReferencedByProducts(Vec<LoanProductId>),
}
