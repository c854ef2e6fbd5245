#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod criteria;
mod entry;
pub mod error;
mod event;
mod jobs;
pub mod ledger;
pub mod primitives;
mod publisher;

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use chrono::NaiveDate;
use tracing::instrument;

use core_delinquency::{Delinquencies, DelinquencyEvent};
use core_lending::{BusinessDates, Loans, LoanProducts};
use job::{JobSchedule, Jobs};
use outbox::{Outbox, OutboxEventMarker};

pub use criteria::{NewProvisioningCriteria, ProvisioningCategory, ProvisioningCriteria};
use criteria::ProvisioningCriteriaRepo;
pub use entry::{ProvisioningEntry, ProvisioningEntryRepo, ProvisioningRow};
use error::{AccrualSweepError, CoreProvisioningError, ProvisioningPostingError};
pub use event::ProvisioningEvent;
pub use jobs::*;
pub use ledger::{
    Direction, JournalEntry, JournalEntryLine, JournalPoster, LedgerError, RecordingLedger,
};
use publisher::ProvisioningPublisher;

use primitives::*;

/// Accrual accounting and loan-loss reserves: sweeps interest/fee accruals
/// into the GL and materializes per-criteria provisioning snapshots.
pub struct CoreProvisioning<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    criteria: ProvisioningCriteriaRepo,
    entries: ProvisioningEntryRepo,
    ledger: Arc<dyn JournalPoster>,
    loans: Loans,
    products: LoanProducts,
    delinquencies: Delinquencies<E>,
    publisher: ProvisioningPublisher<E>,
}

impl<E> Clone for CoreProvisioning<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            entries: self.entries.clone(),
            ledger: self.ledger.clone(),
            loans: self.loans.clone(),
            products: self.products.clone(),
            delinquencies: self.delinquencies.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

impl<E> CoreProvisioning<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    pub fn new(
        loans: &Loans,
        products: &LoanProducts,
        delinquencies: &Delinquencies<E>,
        ledger: Arc<dyn JournalPoster>,
        outbox: &Outbox<E>,
    ) -> Self {
        Self {
            criteria: ProvisioningCriteriaRepo::new(),
            entries: ProvisioningEntryRepo::new(),
            ledger,
            loans: loans.clone(),
            products: products.clone(),
            delinquencies: delinquencies.clone(),
            publisher: ProvisioningPublisher::new(outbox),
        }
    }

    /// Registers the nightly accrual and provisioning jobs alongside the
    /// service.
    #[allow(clippy::too_many_arguments)]
    pub async fn init(
        jobs: &Jobs,
        loans: &Loans,
        products: &LoanProducts,
        delinquencies: &Delinquencies<E>,
        ledger: Arc<dyn JournalPoster>,
        business_dates: &BusinessDates,
        outbox: &Outbox<E>,
    ) -> Result<Self, CoreProvisioningError> {
        let provisioning = Self::new(loans, products, delinquencies, ledger, outbox);
        jobs.add_initializer(PeriodicAccrualInit::new(&provisioning, business_dates));
        if jobs
            .find_by_type(<PeriodicAccrualInit<E> as job::JobInitializer>::job_type())
            .is_none()
        {
            jobs.create_and_spawn_with_schedule(
                PeriodicAccrualJobConfig::<E>::new(),
                JobSchedule::cron("0 0 1 * * *")?,
            )?;
        }
        jobs.add_initializer(LoanLossProvisioningInit::new(&provisioning, business_dates));
        if jobs
            .find_by_type(<LoanLossProvisioningInit<E> as job::JobInitializer>::job_type())
            .is_none()
        {
            jobs.create_and_spawn_with_schedule(
                LoanLossProvisioningJobConfig::<E>::default(),
                JobSchedule::cron("0 0 2 * * *")?,
            )?;
        }
        Ok(provisioning)
    }

    #[instrument(name = "provisioning.criteria.create", skip(self, new_criteria))]
    pub fn create_criteria(
        &self,
        new_criteria: NewProvisioningCriteria,
    ) -> Result<ProvisioningCriteria, CoreProvisioningError> {
        Ok(self.criteria.create(new_criteria)?)
    }

    pub fn find_criteria(
        &self,
        id: ProvisioningCriteriaId,
    ) -> Result<ProvisioningCriteria, CoreProvisioningError> {
        Ok(self.criteria.find_by_id(id)?)
    }

    pub fn list_criteria(&self) -> Vec<ProvisioningCriteria> {
        self.criteria.list()
    }

    pub fn latest_entry(&self, criteria_id: ProvisioningCriteriaId) -> Option<ProvisioningEntry> {
        self.entries.latest_for_criteria(criteria_id)
    }

    pub fn entries_for_criteria(
        &self,
        criteria_id: ProvisioningCriteriaId,
    ) -> Vec<ProvisioningEntry> {
        self.entries.list_for_criteria(criteria_id)
    }

    /// Recognizes interest and fees earned up to `till` on every active
    /// accrual-basis loan, posting against the product's GL mapping and
    /// advancing each loan's watermark. Failed loans are isolated; clean
    /// ones stay committed.
    #[instrument(name = "provisioning.add_periodic_accruals", skip(self))]
    pub async fn add_periodic_accruals(
        &self,
        till: NaiveDate,
    ) -> Result<Vec<LoanId>, AccrualSweepError> {
        let mut accrued = Vec::new();
        let mut failures = Vec::new();
        for loan in self.loans.list_active_loans() {
            match self.accrue_loan(&loan, till).await {
                Ok(true) => accrued.push(loan.id),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(loan_id = %loan.id, error = %e, "accrual failed");
                    failures.push((loan.id, e));
                }
            }
        }
        if !accrued.is_empty() {
            if let Err(e) = self
                .publisher
                .publish(ProvisioningEvent::PeriodicAccrualsPosted {
                    till,
                    loans_accrued: accrued.len(),
                })
                .await
            {
                tracing::warn!(error = %e, "accrual event publish failed");
            }
        }
        if failures.is_empty() {
            Ok(accrued)
        } else {
            Err(AccrualSweepError { failures })
        }
    }

    async fn accrue_loan(
        &self,
        loan: &core_lending::Loan,
        till: NaiveDate,
    ) -> Result<bool, CoreProvisioningError> {
        let product = self.products.find_by_id(loan.product_id)?;
        if !product.accrual_basis {
            return Ok(false);
        }
        if loan.accrued_through.is_some_and(|through| through >= till) {
            return Ok(false);
        }
        let start = loan.accrual_start();
        let days = (till - start).num_days();
        if days <= 0 {
            return Ok(false);
        }

        let installments = self.loans.installments_for_loan(loan.id);
        let principal: UsdCents = installments.iter().map(|i| i.principal_outstanding).sum();
        let interest = principal.accrue_for_days(product.annual_interest_rate, days);
        let fees = principal.accrue_for_days(product.annual_fee_rate, days);

        if interest.is_zero() && fees.is_zero() {
            self.loans.record_accrual_watermark(loan.id, till)?;
            return Ok(false);
        }

        let mapping = product
            .gl_mapping
            .ok_or(CoreProvisioningError::MissingGlMapping(loan.id))?;
        let mut journal_entry = JournalEntry::new(
            till,
            format!("periodic accrual for loan {} through {till}", loan.id),
        );
        if !interest.is_zero() {
            journal_entry = journal_entry
                .debit(mapping.interest_receivable, interest)
                .credit(mapping.interest_income, interest);
        }
        if !fees.is_zero() {
            journal_entry = journal_entry
                .debit(mapping.fee_receivable, fees)
                .credit(mapping.fee_income, fees);
        }
        self.ledger.post(journal_entry).await?;

        match installments.iter().find(|i| !i.is_fully_paid()) {
            Some(installment) => {
                self.loans
                    .record_accrual(loan.id, installment.id, interest, fees, till)?
            }
            None => self.loans.record_accrual_watermark(loan.id, till)?,
        }
        Ok(true)
    }

    /// Snapshots the required reserve for one criteria and, when asked,
    /// posts the net change versus the previous snapshot. First run posts
    /// the full amount (debit expense / credit liability); a decrease posts
    /// the swapped-direction reversal with positive magnitude.
    #[instrument(
        name = "provisioning.compute_entries",
        skip(self),
        fields(criteria_id = %criteria_id)
    )]
    pub async fn compute_provisioning_entries(
        &self,
        criteria_id: ProvisioningCriteriaId,
        as_of: NaiveDate,
        create_journal_entries: bool,
    ) -> Result<ProvisioningEntry, CoreProvisioningError> {
        let criteria = self.criteria.find_by_id(criteria_id)?;

        let mut outstanding_by_key: BTreeMap<(OfficeId, LoanProductId, String), UsdCents> =
            BTreeMap::new();
        for product_id in &criteria.product_ids {
            let product = self.products.find_by_id(*product_id)?;
            for loan in self
                .loans
                .list_active_loans()
                .into_iter()
                .filter(|l| l.product_id == product.id)
            {
                let installments = self.loans.installments_for_loan(loan.id);
                let outstanding: UsdCents =
                    installments.iter().map(|i| i.total_outstanding()).sum();
                if outstanding.is_zero() {
                    continue;
                }
                let age = self.loan_age_days(&loan, product.delinquency_bucket_id.is_some(), &installments, as_of)?;
                let category = criteria
                    .category_for_age(age)
                    .ok_or(CoreProvisioningError::UncoveredAge(age))?;
                *outstanding_by_key
                    .entry((loan.office_id, product.id, category.name.clone()))
                    .or_default() += outstanding;
            }
        }

        let rows: Vec<ProvisioningRow> = outstanding_by_key
            .into_iter()
            .map(|((office_id, product_id, category), outstanding)| {
                let pct = criteria
                    .category_by_name(&category)
                    .expect("category came from this criteria")
                    .provisioning_pct;
                ProvisioningRow {
                    office_id,
                    product_id,
                    category,
                    outstanding,
                    provisioned: outstanding.apply_pct(pct),
                }
            })
            .collect();

        let prior = self.entries.latest_for_criteria(criteria_id);
        let entry = ProvisioningEntry {
            id: ProvisioningEntryId::new(),
            criteria_id,
            as_of,
            rows,
            journal_entries_created: create_journal_entries,
        };

        let mut posting_failures = Vec::new();
        if create_journal_entries {
            posting_failures = self
                .post_net_changes(&criteria, &entry, prior.as_ref(), as_of)
                .await;
        }

        let entry = self.entries.create(entry);
        if let Err(e) = self
            .publisher
            .publish(ProvisioningEvent::ProvisioningEntryCreated {
                entry_id: entry.id,
                criteria_id,
                as_of,
                total_provisioned: entry.total_provisioned(),
            })
            .await
        {
            tracing::warn!(error = %e, "provisioning event publish failed");
        }

        if posting_failures.is_empty() {
            Ok(entry)
        } else {
            Err(ProvisioningPostingError {
                failures: posting_failures,
            }
            .into())
        }
    }

    async fn post_net_changes(
        &self,
        criteria: &ProvisioningCriteria,
        entry: &ProvisioningEntry,
        prior: Option<&ProvisioningEntry>,
        as_of: NaiveDate,
    ) -> Vec<(String, CoreProvisioningError)> {
        let mut keys: BTreeSet<(OfficeId, LoanProductId, String)> = BTreeSet::new();
        for row in &entry.rows {
            keys.insert((row.office_id, row.product_id, row.category.clone()));
        }
        if let Some(prior) = prior {
            for row in &prior.rows {
                keys.insert((row.office_id, row.product_id, row.category.clone()));
            }
        }

        let mut failures = Vec::new();
        let mut failed_categories: HashSet<String> = HashSet::new();
        for (office_id, product_id, category_name) in keys {
            if failed_categories.contains(&category_name) {
                continue;
            }
            let current = entry.provisioned_for(office_id, product_id, &category_name);
            let previous = prior
                .map(|p| p.provisioned_for(office_id, product_id, &category_name))
                .unwrap_or(UsdCents::ZERO);
            let delta = SignedUsdCents::difference(current, previous);
            if delta.is_zero() {
                continue;
            }

            let result = self
                .post_category_delta(criteria, &category_name, delta, as_of)
                .await;
            if let Err(e) = result {
                tracing::error!(category = %category_name, error = %e, "provisioning posting failed");
                failed_categories.insert(category_name.clone());
                failures.push((category_name, e));
            }
        }
        failures
    }

    async fn post_category_delta(
        &self,
        criteria: &ProvisioningCriteria,
        category_name: &str,
        delta: SignedUsdCents,
        as_of: NaiveDate,
    ) -> Result<(), CoreProvisioningError> {
        let category = criteria.category_by_name(category_name).ok_or_else(|| {
            CoreProvisioningError::MissingCategoryAccount {
                category: category_name.to_string(),
                side: "any",
            }
        })?;
        let liability = category.liability_account.ok_or_else(|| {
            CoreProvisioningError::MissingCategoryAccount {
                category: category_name.to_string(),
                side: "liability",
            }
        })?;
        let expense = category.expense_account.ok_or_else(|| {
            CoreProvisioningError::MissingCategoryAccount {
                category: category_name.to_string(),
                side: "expense",
            }
        })?;

        let amount = delta.abs();
        let narrative = format!(
            "loan loss provisioning {} / {category_name} as of {as_of}",
            criteria.name
        );
        let journal_entry = if delta.is_negative() {
            // reserve shrank: release by swapping the debit/credit sides
            JournalEntry::new(as_of, narrative)
                .debit(liability, amount)
                .credit(expense, amount)
        } else {
            JournalEntry::new(as_of, narrative)
                .debit(expense, amount)
                .credit(liability, amount)
        };
        self.ledger.post(journal_entry).await?;
        Ok(())
    }

    fn loan_age_days(
        &self,
        loan: &core_lending::Loan,
        product_has_bucket: bool,
        installments: &[core_lending::Installment],
        as_of: NaiveDate,
    ) -> Result<u32, CoreProvisioningError> {
        if product_has_bucket {
            if let Some(age) = self.delinquencies.oldest_tagged_age(loan.id)? {
                return Ok(age);
            }
        }
        // fall back to the raw age of the oldest unpaid installment
        Ok(installments
            .iter()
            .filter(|i| !i.is_fully_paid())
            .map(|i| (as_of - i.due_date).num_days().max(0) as u32)
            .max()
            .unwrap_or(0))
    }
}
