mod entity;
pub mod error;
mod repo;

use chrono::NaiveDate;
use tracing::instrument;

use crate::primitives::{InstallmentId, LoanId, UsdCents};

pub use entity::*;
use error::LoanError;
pub use repo::LoanRepo;

/// Loan portfolio surface consumed by the classification and accounting
/// engines.
#[derive(Clone)]
pub struct Loans {
    repo: LoanRepo,
}

impl Loans {
    pub fn new() -> Self {
        Self {
            repo: LoanRepo::new(),
        }
    }

    #[instrument(name = "lending.loan.create", skip(self, new_loan))]
    pub fn create_loan(&self, new_loan: NewLoan) -> Loan {
        self.repo.create(new_loan)
    }

    pub fn find_loan(&self, id: LoanId) -> Result<Loan, LoanError> {
        self.repo.find_by_id(id)
    }

    pub fn list_active_loans(&self) -> Vec<Loan> {
        self.repo.list_active()
    }

    pub fn installments_for_loan(&self, loan_id: LoanId) -> Vec<Installment> {
        self.repo.installments_for_loan(loan_id)
    }

    #[instrument(name = "lending.loan.record_repayment", skip(self), fields(loan_id = %loan_id, amount = %amount))]
    pub fn record_repayment(
        &self,
        loan_id: LoanId,
        amount: UsdCents,
    ) -> Result<UsdCents, LoanError> {
        self.repo.record_repayment(loan_id, amount)
    }

    pub fn record_accrual(
        &self,
        loan_id: LoanId,
        installment_id: InstallmentId,
        interest: UsdCents,
        fees: UsdCents,
        through: NaiveDate,
    ) -> Result<(), LoanError> {
        self.repo.add_accrued_amounts(installment_id, interest, fees)?;
        self.repo.record_accrual_watermark(loan_id, through)
    }

    /// Advances the watermark without touching balances; used when an
    /// accrual pass computes a zero amount for the period.
    pub fn record_accrual_watermark(
        &self,
        loan_id: LoanId,
        through: NaiveDate,
    ) -> Result<(), LoanError> {
        self.repo.record_accrual_watermark(loan_id, through)
    }

    #[instrument(name = "lending.loan.close", skip(self), fields(loan_id = %loan_id))]
    pub fn close_loan(&self, loan_id: LoanId) -> Result<Loan, LoanError> {
        self.repo.close(loan_id)
    }
}

impl Default for Loans {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{LoanProductId, OfficeId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_installment_loan(loans: &Loans) -> Loan {
        let new_loan = NewLoan::builder()
            .id(LoanId::new())
            .office_id(OfficeId::new())
            .product_id(LoanProductId::new())
            .disbursed_on(date(2026, 1, 1))
            .schedule(vec![
                NewInstallment::builder()
                    .number(2)
                    .due_date(date(2026, 2, 28))
                    .principal(UsdCents::from(50_000))
                    .build()
                    .unwrap(),
                NewInstallment::builder()
                    .number(1)
                    .due_date(date(2026, 1, 31))
                    .principal(UsdCents::from(50_000))
                    .interest(UsdCents::from(1_000))
                    .build()
                    .unwrap(),
            ])
            .build()
            .unwrap();
        loans.create_loan(new_loan)
    }

    #[test]
    fn schedule_is_ordered_by_installment_number() {
        let loans = Loans::new();
        let loan = two_installment_loan(&loans);
        let schedule = loans.installments_for_loan(loan.id);
        assert_eq!(
            schedule.iter().map(|i| i.number).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn repayment_settles_oldest_installment_first() {
        let loans = Loans::new();
        let loan = two_installment_loan(&loans);

        let remaining = loans
            .record_repayment(loan.id, UsdCents::from(51_000))
            .unwrap();
        assert_eq!(remaining, UsdCents::ZERO);

        let schedule = loans.installments_for_loan(loan.id);
        assert!(schedule[0].is_fully_paid());
        assert_eq!(schedule[1].total_outstanding(), UsdCents::from(50_000));
    }

    #[test]
    fn watermark_never_moves_backwards() {
        let loans = Loans::new();
        let loan = two_installment_loan(&loans);

        loans
            .record_accrual_watermark(loan.id, date(2026, 1, 15))
            .unwrap();
        let err = loans
            .record_accrual_watermark(loan.id, date(2026, 1, 10))
            .unwrap_err();
        assert!(matches!(
            err,
            LoanError::AccrualWatermarkMovedBackwards { .. }
        ));

        // same date is a no-op, not an error
        loans
            .record_accrual_watermark(loan.id, date(2026, 1, 15))
            .unwrap();
        assert_eq!(
            loans.find_loan(loan.id).unwrap().accrued_through,
            Some(date(2026, 1, 15))
        );
    }

    #[test]
    fn closed_loans_are_excluded_from_active_listing() {
        let loans = Loans::new();
        let open = two_installment_loan(&loans);
        let closed = two_installment_loan(&loans);
        loans.close_loan(closed.id).unwrap();

        let active = loans.list_active_loans();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);
    }
}
