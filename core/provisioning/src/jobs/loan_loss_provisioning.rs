use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_delinquency::DelinquencyEvent;
use core_lending::BusinessDates;
use job::*;
use outbox::OutboxEventMarker;

use crate::{event::ProvisioningEvent, CoreProvisioning};

#[derive(Serialize, Deserialize)]
pub struct LoanLossProvisioningJobConfig<E> {
    #[serde(default = "default_create_journal_entries")]
    pub create_journal_entries: bool,
    #[serde(skip)]
    _phantom: PhantomData<E>,
}

fn default_create_journal_entries() -> bool {
    true
}

impl<E> Default for LoanLossProvisioningJobConfig<E> {
    fn default() -> Self {
        Self {
            create_journal_entries: default_create_journal_entries(),
            _phantom: PhantomData,
        }
    }
}

impl<E> JobConfig for LoanLossProvisioningJobConfig<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    type Initializer = LoanLossProvisioningInit<E>;
}

pub struct LoanLossProvisioningInit<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    provisioning: CoreProvisioning<E>,
    business_dates: BusinessDates,
}

impl<E> LoanLossProvisioningInit<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    pub fn new(provisioning: &CoreProvisioning<E>, business_dates: &BusinessDates) -> Self {
        Self {
            provisioning: provisioning.clone(),
            business_dates: business_dates.clone(),
        }
    }
}

const LOAN_LOSS_PROVISIONING_JOB: JobType = JobType::new("loan-loss-provisioning");
impl<E> JobInitializer for LoanLossProvisioningInit<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    fn job_type() -> JobType
    where
        Self: Sized,
    {
        LOAN_LOSS_PROVISIONING_JOB
    }

    fn init(
        &self,
        job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(LoanLossProvisioningJobRunner {
            config: job.config()?,
            provisioning: self.provisioning.clone(),
            business_dates: self.business_dates.clone(),
        }))
    }
}

pub struct LoanLossProvisioningJobRunner<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    config: LoanLossProvisioningJobConfig<E>,
    provisioning: CoreProvisioning<E>,
    business_dates: BusinessDates,
}

#[async_trait]
impl<E> JobRunner for LoanLossProvisioningJobRunner<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    #[instrument(name = "provisioning.job.loan_loss", skip(self, _current_job))]
    async fn run(
        &self,
        _current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>> {
        let as_of = self.business_dates.current();
        let criteria = self.provisioning.list_criteria();
        if criteria.is_empty() {
            return Ok(JobCompletion::Noop);
        }
        let mut errors = Vec::new();
        for criteria in criteria {
            if let Err(e) = self
                .provisioning
                .compute_provisioning_entries(
                    criteria.id,
                    as_of,
                    self.config.create_journal_entries,
                )
                .await
            {
                errors.push(format!("{}: {e}", criteria.name));
            }
        }
        if !errors.is_empty() {
            return Err(errors.join("; ").into());
        }
        tracing::info!(%as_of, "loan loss provisioning entries created");
        Ok(JobCompletion::Complete)
    }
}
