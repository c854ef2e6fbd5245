use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::NaiveDate;

use crate::primitives::{InstallmentId, LoanId, UsdCents};

use super::{entity::*, error::LoanError};

/// Materialized loan store. Installments are kept separately from the loan
/// header so schedule scans don't clone whole aggregates.
#[derive(Clone, Default)]
pub struct LoanRepo {
    loans: Arc<RwLock<HashMap<LoanId, Loan>>>,
    installments: Arc<RwLock<HashMap<InstallmentId, Installment>>>,
}

impl LoanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new_loan: NewLoan) -> Loan {
        let (loan, installments) = new_loan.into_loan_and_installments();
        let mut store = self.installments.write().expect("installments lock");
        for installment in installments {
            store.insert(installment.id, installment);
        }
        self.loans
            .write()
            .expect("loans lock")
            .insert(loan.id, loan.clone());
        loan
    }

    pub fn find_by_id(&self, id: LoanId) -> Result<Loan, LoanError> {
        self.loans
            .read()
            .expect("loans lock")
            .get(&id)
            .cloned()
            .ok_or(LoanError::LoanNotFound(id))
    }

    pub fn list_active(&self) -> Vec<Loan> {
        let mut loans: Vec<_> = self
            .loans
            .read()
            .expect("loans lock")
            .values()
            .filter(|l| l.is_active())
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        loans
    }

    pub fn installments_for_loan(&self, loan_id: LoanId) -> Vec<Installment> {
        let mut installments: Vec<_> = self
            .installments
            .read()
            .expect("installments lock")
            .values()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect();
        installments.sort_by_key(|i| i.number);
        installments
    }

    /// Advances the accrual watermark. The watermark never moves backwards;
    /// re-running an accrual pass for an earlier date is an error, not a
    /// reversal.
    pub fn record_accrual_watermark(
        &self,
        loan_id: LoanId,
        through: NaiveDate,
    ) -> Result<(), LoanError> {
        let mut loans = self.loans.write().expect("loans lock");
        let loan = loans
            .get_mut(&loan_id)
            .ok_or(LoanError::LoanNotFound(loan_id))?;
        if let Some(current) = loan.accrued_through {
            if current > through {
                return Err(LoanError::AccrualWatermarkMovedBackwards {
                    current,
                    requested: through,
                });
            }
        }
        loan.accrued_through = Some(through);
        Ok(())
    }

    /// Adds accrued interest and fee amounts onto an installment's
    /// outstanding balances.
    pub fn add_accrued_amounts(
        &self,
        installment_id: InstallmentId,
        interest: UsdCents,
        fees: UsdCents,
    ) -> Result<(), LoanError> {
        let mut installments = self.installments.write().expect("installments lock");
        let installment = installments
            .get_mut(&installment_id)
            .ok_or(LoanError::InstallmentNotFound(installment_id))?;
        installment.interest_outstanding += interest;
        installment.fee_outstanding += fees;
        Ok(())
    }

    /// Allocates a repayment across the schedule, oldest installment first,
    /// penalty before fee before interest before principal within each.
    /// Returns any unallocated remainder (overpayment).
    pub fn record_repayment(
        &self,
        loan_id: LoanId,
        amount: UsdCents,
    ) -> Result<UsdCents, LoanError> {
        self.find_by_id(loan_id)?;
        let schedule = self.installments_for_loan(loan_id);
        let mut installments = self.installments.write().expect("installments lock");
        let mut remaining = amount;
        for row in &schedule {
            if remaining.is_zero() {
                break;
            }
            if let Some(installment) = installments.get_mut(&row.id) {
                remaining = installment.apply_repayment(remaining);
            }
        }
        Ok(remaining)
    }

    pub fn close(&self, loan_id: LoanId) -> Result<Loan, LoanError> {
        let mut loans = self.loans.write().expect("loans lock");
        let loan = loans
            .get_mut(&loan_id)
            .ok_or(LoanError::LoanNotFound(loan_id))?;
        loan.status = LoanStatus::Closed;
        Ok(loan.clone())
    }
}
