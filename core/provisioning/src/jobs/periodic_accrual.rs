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
pub struct PeriodicAccrualJobConfig<E> {
    #[serde(skip)]
    _phantom: PhantomData<E>,
}

impl<E> PeriodicAccrualJobConfig<E> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E> Default for PeriodicAccrualJobConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> JobConfig for PeriodicAccrualJobConfig<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    type Initializer = PeriodicAccrualInit<E>;
}

pub struct PeriodicAccrualInit<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    provisioning: CoreProvisioning<E>,
    business_dates: BusinessDates,
}

impl<E> PeriodicAccrualInit<E>
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

const PERIODIC_ACCRUAL_JOB: JobType = JobType::new("periodic-accrual");
impl<E> JobInitializer for PeriodicAccrualInit<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    fn job_type() -> JobType
    where
        Self: Sized,
    {
        PERIODIC_ACCRUAL_JOB
    }

    fn init(
        &self,
        _job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(PeriodicAccrualJobRunner {
            provisioning: self.provisioning.clone(),
            business_dates: self.business_dates.clone(),
        }))
    }
}

pub struct PeriodicAccrualJobRunner<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    provisioning: CoreProvisioning<E>,
    business_dates: BusinessDates,
}

#[async_trait]
impl<E> JobRunner for PeriodicAccrualJobRunner<E>
where
    E: OutboxEventMarker<ProvisioningEvent> + OutboxEventMarker<DelinquencyEvent>,
{
    #[instrument(name = "provisioning.job.periodic_accrual", skip(self, _current_job))]
    async fn run(
        &self,
        _current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>> {
        let till = self.business_dates.current();
        let accrued = self.provisioning.add_periodic_accruals(till).await?;
        if accrued.is_empty() {
            return Ok(JobCompletion::Noop);
        }
        tracing::info!(loans = accrued.len(), %till, "periodic accruals posted");
        Ok(JobCompletion::Complete)
    }
}
