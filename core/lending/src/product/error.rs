use thiserror::Error;

use crate::primitives::LoanProductId;

#[derive(Error, Debug)]
pub enum LoanProductError {
    #[error("LoanProductError - ProductNotFound: {0}")]
    ProductNotFound(LoanProductId),
    #[error("LoanProductError - Builder: {0}")]
    Builder(#[from] super::entity::NewLoanProductBuilderError),
}
