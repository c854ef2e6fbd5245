use thiserror::Error;

use crate::primitives::LoanId;

#[derive(Error, Debug)]
pub enum CoreDelinquencyError {
    #[error("CoreDelinquencyError - BucketError: {0}")]
    Bucket(#[from] crate::bucket::error::DelinquencyBucketError),
    #[error("CoreDelinquencyError - ClassificationError: {0}")]
    Classification(#[from] crate::classifier::ClassificationError),
    #[error("CoreDelinquencyError - LoanError: {0}")]
    Loan(#[from] core_lending::loan::error::LoanError),
    #[error("CoreDelinquencyError - LoanProductError: {0}")]
    LoanProduct(#[from] core_lending::product::error::LoanProductError),
    #[error("CoreDelinquencyError - OutboxError: {0}")]
    Outbox(#[from] outbox::OutboxError),
    #[error("CoreDelinquencyError - JobError: {0}")]
    Job(#[from] job::error::JobError),
}

/// Aggregate of per-loan failures from a refresh sweep. Loans that
/// classified cleanly stay committed; the sweep as a whole reports these
/// afterwards.
#[derive(Debug)]
pub struct DelinquencySweepError {
    pub failures: Vec<(LoanId, CoreDelinquencyError)>,
}

impl std::fmt::Display for DelinquencySweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DelinquencySweepError - {} loan(s) failed: ", self.failures.len())?;
        let mut first = true;
        for (loan_id, error) in &self.failures {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{loan_id}: {error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for DelinquencySweepError {}
