use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_lending::BusinessDates;
use job::*;
use outbox::OutboxEventMarker;

use crate::{event::DelinquencyEvent, Delinquencies};

#[derive(Serialize, Deserialize)]
pub struct DelinquencyRefreshJobConfig<E> {
    #[serde(skip)]
    _phantom: PhantomData<E>,
}

impl<E> DelinquencyRefreshJobConfig<E> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<E> Default for DelinquencyRefreshJobConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> JobConfig for DelinquencyRefreshJobConfig<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    type Initializer = DelinquencyRefreshInit<E>;
}

pub struct DelinquencyRefreshInit<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    delinquencies: Delinquencies<E>,
    business_dates: BusinessDates,
}

impl<E> DelinquencyRefreshInit<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    pub fn new(delinquencies: &Delinquencies<E>, business_dates: &BusinessDates) -> Self {
        Self {
            delinquencies: delinquencies.clone(),
            business_dates: business_dates.clone(),
        }
    }
}

const DELINQUENCY_REFRESH_JOB: JobType = JobType::new("delinquency-refresh");
impl<E> JobInitializer for DelinquencyRefreshInit<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    fn job_type() -> JobType
    where
        Self: Sized,
    {
        DELINQUENCY_REFRESH_JOB
    }

    fn init(
        &self,
        _job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(DelinquencyRefreshJobRunner {
            delinquencies: self.delinquencies.clone(),
            business_dates: self.business_dates.clone(),
        }))
    }
}

pub struct DelinquencyRefreshJobRunner<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    delinquencies: Delinquencies<E>,
    business_dates: BusinessDates,
}

#[async_trait]
impl<E> JobRunner for DelinquencyRefreshJobRunner<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    #[instrument(name = "delinquency.job.refresh", skip(self, _current_job))]
    async fn run(
        &self,
        _current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>> {
        // one consistent date for the whole sweep, even across midnight
        let as_of = self.business_dates.current();
        let refreshed = self.delinquencies.sweep(as_of).await?;
        if refreshed.is_empty() {
            return Ok(JobCompletion::Noop);
        }
        tracing::info!(loans = refreshed.len(), %as_of, "delinquency tags refreshed");
        Ok(JobCompletion::Complete)
    }
}
