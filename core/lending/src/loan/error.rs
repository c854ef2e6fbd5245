use thiserror::Error;

use crate::primitives::{InstallmentId, LoanId};

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("LoanError - LoanNotFound: {0}")]
    LoanNotFound(LoanId),
    #[error("LoanError - InstallmentNotFound: {0}")]
    InstallmentNotFound(InstallmentId),
    #[error("LoanError - AccrualWatermarkMovedBackwards: {current} > {requested}")]
    AccrualWatermarkMovedBackwards {
        current: chrono::NaiveDate,
        requested: chrono::NaiveDate,
    },
    #[error("LoanError - Builder: {0}")]
    Builder(#[from] super::entity::NewLoanBuilderError),
}
