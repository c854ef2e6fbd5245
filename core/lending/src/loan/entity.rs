use chrono::NaiveDate;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone)]
pub struct Loan {
    pub id: LoanId,
    pub office_id: OfficeId,
    pub product_id: LoanProductId,
    pub disbursed_on: NaiveDate,
    pub status: LoanStatus,
    /// Accrual watermark: interest/fees are recognized through this date.
    pub accrued_through: Option<NaiveDate>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// The date periodic accrual resumes from.
    pub fn accrual_start(&self) -> NaiveDate {
        self.accrued_through.unwrap_or(self.disbursed_on)
    }
}

/// One row of a loan's repayment schedule, fully materialized. Outstanding
/// amounts shrink as repayments are allocated.
#[derive(Debug, Clone)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub number: u32,
    pub due_date: NaiveDate,
    pub principal_outstanding: UsdCents,
    pub interest_outstanding: UsdCents,
    pub fee_outstanding: UsdCents,
    pub penalty_outstanding: UsdCents,
}

impl Installment {
    pub fn total_outstanding(&self) -> UsdCents {
        self.principal_outstanding
            + self.interest_outstanding
            + self.fee_outstanding
            + self.penalty_outstanding
    }

    pub fn is_fully_paid(&self) -> bool {
        self.total_outstanding().is_zero()
    }

    /// Allocates a repayment in penalty, fee, interest, principal order.
    /// Returns whatever could not be absorbed by this installment.
    pub(crate) fn apply_repayment(&mut self, amount: UsdCents) -> UsdCents {
        let mut remaining = amount;
        for component in [
            &mut self.penalty_outstanding,
            &mut self.fee_outstanding,
            &mut self.interest_outstanding,
            &mut self.principal_outstanding,
        ] {
            let applied = std::cmp::min(*component, remaining);
            *component = component.saturating_sub(applied);
            remaining = remaining.saturating_sub(applied);
        }
        remaining
    }
}

#[derive(Debug, Clone, Builder)]
pub struct NewInstallment {
    pub(super) number: u32,
    pub(super) due_date: NaiveDate,
    #[builder(default)]
    pub(super) principal: UsdCents,
    #[builder(default)]
    pub(super) interest: UsdCents,
    #[builder(default)]
    pub(super) fee: UsdCents,
    #[builder(default)]
    pub(super) penalty: UsdCents,
}

impl NewInstallment {
    pub fn builder() -> NewInstallmentBuilder {
        NewInstallmentBuilder::default()
    }
}

#[derive(Debug, Builder)]
pub struct NewLoan {
    #[builder(setter(into))]
    pub(super) id: LoanId,
    #[builder(setter(into))]
    pub(super) office_id: OfficeId,
    #[builder(setter(into))]
    pub(super) product_id: LoanProductId,
    pub(super) disbursed_on: NaiveDate,
    pub(super) schedule: Vec<NewInstallment>,
}

impl NewLoan {
    pub fn builder() -> NewLoanBuilder {
        NewLoanBuilder::default()
    }

    pub(super) fn into_loan_and_installments(self) -> (Loan, Vec<Installment>) {
        let loan = Loan {
            id: self.id,
            office_id: self.office_id,
            product_id: self.product_id,
            disbursed_on: self.disbursed_on,
            status: LoanStatus::Active,
            accrued_through: None,
        };
        let mut installments: Vec<_> = self
            .schedule
            .into_iter()
            .map(|i| Installment {
                id: InstallmentId::new(),
                loan_id: loan.id,
                number: i.number,
                due_date: i.due_date,
                principal_outstanding: i.principal,
                interest_outstanding: i.interest,
                fee_outstanding: i.fee,
                penalty_outstanding: i.penalty,
            })
            .collect();
        installments.sort_by_key(|i| i.number);
        (loan, installments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installment(outstanding: [u64; 4]) -> Installment {
        Installment {
            id: InstallmentId::new(),
            loan_id: LoanId::new(),
            number: 1,
            due_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            principal_outstanding: UsdCents::from(outstanding[0]),
            interest_outstanding: UsdCents::from(outstanding[1]),
            fee_outstanding: UsdCents::from(outstanding[2]),
            penalty_outstanding: UsdCents::from(outstanding[3]),
        }
    }

    #[test]
    fn repayment_allocates_penalty_first_principal_last() {
        let mut installment = installment([10_000, 1_000, 500, 200]);
        let remaining = installment.apply_repayment(UsdCents::from(1_800));
        assert_eq!(remaining, UsdCents::ZERO);
        assert_eq!(installment.penalty_outstanding, UsdCents::ZERO);
        assert_eq!(installment.fee_outstanding, UsdCents::ZERO);
        assert_eq!(installment.interest_outstanding, UsdCents::ZERO);
        assert_eq!(installment.principal_outstanding, UsdCents::from(9_900));
    }

    #[test]
    fn overpayment_spills_over() {
        let mut installment = installment([100, 0, 0, 0]);
        let remaining = installment.apply_repayment(UsdCents::from(250));
        assert_eq!(remaining, UsdCents::from(150));
        assert!(installment.is_fully_paid());
    }
}
