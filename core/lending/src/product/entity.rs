use derive_builder::Builder;
use rust_decimal::Decimal;

use crate::primitives::*;

/// GL accounts a product posts accruals to. Products without a mapping
/// cannot be accrued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductGlMapping {
    pub interest_receivable: GlAccountId,
    pub interest_income: GlAccountId,
    pub fee_receivable: GlAccountId,
    pub fee_income: GlAccountId,
}

#[derive(Debug, Clone)]
pub struct LoanProduct {
    pub id: LoanProductId,
    pub name: String,
    /// Whether interest is recognized as it accrues rather than on receipt.
    pub accrual_basis: bool,
    pub delinquency_bucket_id: Option<DelinquencyBucketId>,
    pub gl_mapping: Option<ProductGlMapping>,
    pub annual_interest_rate: Decimal,
    pub annual_fee_rate: Decimal,
}

#[derive(Debug, Builder)]
pub struct NewLoanProduct {
    #[builder(setter(into))]
    pub(super) id: LoanProductId,
    #[builder(setter(into))]
    pub(super) name: String,
    #[builder(default)]
    pub(super) accrual_basis: bool,
    #[builder(default, setter(strip_option, into))]
    pub(super) delinquency_bucket_id: Option<DelinquencyBucketId>,
    #[builder(default, setter(strip_option))]
    pub(super) gl_mapping: Option<ProductGlMapping>,
    #[builder(default)]
    pub(super) annual_interest_rate: Decimal,
    #[builder(default)]
    pub(super) annual_fee_rate: Decimal,
}

impl NewLoanProduct {
    pub fn builder() -> NewLoanProductBuilder {
        NewLoanProductBuilder::default()
    }

    pub(super) fn into_product(self) -> LoanProduct {
        LoanProduct {
            id: self.id,
            name: self.name,
            accrual_basis: self.accrual_basis,
            delinquency_bucket_id: self.delinquency_bucket_id,
            gl_mapping: self.gl_mapping,
            annual_interest_rate: self.annual_interest_rate,
            annual_fee_rate: self.annual_fee_rate,
        }
    }
}
