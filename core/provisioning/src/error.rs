use thiserror::Error;

use crate::primitives::LoanId;

#[derive(Error, Debug)]
pub enum CoreProvisioningError {
    #[error("CoreProvisioningError - CriteriaError: {0}")]
    Criteria(#[from] crate::criteria::error::ProvisioningCriteriaError),
    #[error("CoreProvisioningError - LedgerError: {0}")]
    Ledger(#[from] crate::ledger::LedgerError),
    #[error("CoreProvisioningError - LoanError: {0}")]
    Loan(#[from] core_lending::loan::error::LoanError),
    #[error("CoreProvisioningError - LoanProductError: {0}")]
    LoanProduct(#[from] core_lending::product::error::LoanProductError),
    #[error("CoreProvisioningError - DelinquencyError: {0}")]
    Delinquency(#[from] core_delinquency::error::CoreDelinquencyError),
    #[error("CoreProvisioningError - OutboxError: {0}")]
    Outbox(#[from] outbox::OutboxError),
    #[error("CoreProvisioningError - JobError: {0}")]
    Job(#[from] job::error::JobError),
    #[error("CoreProvisioningError - MissingGlMapping: product of loan {0} has no GL mapping")]
    MissingGlMapping(LoanId),
    #[error("CoreProvisioningError - UncoveredAge: no category covers {0} days")]
    UncoveredAge(u32),
    #[error("CoreProvisioningError - MissingCategoryAccount: category {category} has no {side} account")]
    MissingCategoryAccount { category: String, side: &'static str },
    #[error("CoreProvisioningError - Posting: {0}")]
    Posting(#[from] ProvisioningPostingError),
}

/// Per-loan failures from an accrual sweep; cleanly accrued loans stay
/// committed.
#[derive(Debug)]
pub struct AccrualSweepError {
    pub failures: Vec<(LoanId, CoreProvisioningError)>,
}

impl std::fmt::Display for AccrualSweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualSweepError - {} loan(s) failed: ", self.failures.len())?;
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

impl std::error::Error for AccrualSweepError {}

/// Per-category posting failures from a provisioning run; categories that
/// posted cleanly stay committed.
#[derive(Debug)]
pub struct ProvisioningPostingError {
    pub failures: Vec<(String, CoreProvisioningError)>,
}

impl std::fmt::Display for ProvisioningPostingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ProvisioningPostingError - {} category(ies) failed: ",
            self.failures.len()
        )?;
        let mut first = true;
        for (category, error) in &self.failures {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{category}: {error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ProvisioningPostingError {}
