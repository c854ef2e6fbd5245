#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod business_date;
pub mod error;
mod jobs;
pub mod loan;
pub mod primitives;
pub mod product;

use job::{JobInitializer, JobSchedule, Jobs};

pub use business_date::{BusinessDateConfig, BusinessDates};
use error::CoreLendingError;
pub use jobs::*;
pub use loan::{Installment, Loan, LoanStatus, Loans, NewInstallment, NewLoan};
pub use product::{LoanProduct, LoanProducts, NewLoanProduct, ProductGlMapping};

/// Portfolio core: loans, products and the logical business date, plus the
/// end-of-day rollover job.
#[derive(Clone)]
pub struct CoreLending {
    loans: Loans,
    products: LoanProducts,
    business_dates: BusinessDates,
}

impl CoreLending {
    pub async fn init(
        jobs: &Jobs,
        config: BusinessDateConfig,
    ) -> Result<Self, CoreLendingError> {
        let business_dates = BusinessDates::new(config);
        jobs.add_initializer(BusinessDateRolloverInit::new(&business_dates));
        if jobs.find_by_type(BusinessDateRolloverInit::job_type()).is_none() {
            jobs.create_and_spawn_with_schedule(
                BusinessDateRolloverJobConfig,
                JobSchedule::cron("0 0 0 * * *")?,
            )?;
        }
        Ok(Self {
            loans: Loans::new(),
            products: LoanProducts::new(),
            business_dates,
        })
    }

    pub fn loans(&self) -> &Loans {
        &self.loans
    }

    pub fn products(&self) -> &LoanProducts {
        &self.products
    }

    pub fn business_dates(&self) -> &BusinessDates {
        &self.business_dates
    }
}
