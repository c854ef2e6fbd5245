use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreLendingError {
    #[error("CoreLendingError - LoanError: {0}")]
    Loan(#[from] crate::loan::error::LoanError),
    #[error("CoreLendingError - LoanProductError: {0}")]
    LoanProduct(#[from] crate::product::error::LoanProductError),
    #[error("CoreLendingError - JobError: {0}")]
    Job(#[from] job::error::JobError),
}
