use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use job::*;

use crate::business_date::BusinessDates;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BusinessDateRolloverJobConfig;

impl JobConfig for BusinessDateRolloverJobConfig {
    type Initializer = BusinessDateRolloverInit;
}

pub struct BusinessDateRolloverInit {
    business_dates: BusinessDates,
}

impl BusinessDateRolloverInit {
    pub fn new(business_dates: &BusinessDates) -> Self {
        Self {
            business_dates: business_dates.clone(),
        }
    }
}

const BUSINESS_DATE_ROLLOVER_JOB: JobType = JobType::new("business-date-rollover");
impl JobInitializer for BusinessDateRolloverInit {
    fn job_type() -> JobType
    where
        Self: Sized,
    {
        BUSINESS_DATE_ROLLOVER_JOB
    }

    fn init(
        &self,
        _job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(BusinessDateRolloverJobRunner {
            business_dates: self.business_dates.clone(),
        }))
    }
}

pub struct BusinessDateRolloverJobRunner {
    business_dates: BusinessDates,
}

#[async_trait]
impl JobRunner for BusinessDateRolloverJobRunner {
    #[instrument(name = "lending.job.business_date_rollover", skip(self, _current_job))]
    async fn run(
        &self,
        _current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>> {
        match self.business_dates.increment() {
            Some(new_date) => {
                tracing::info!(%new_date, "business date rolled over");
                Ok(JobCompletion::Complete)
            }
            None => Ok(JobCompletion::Noop),
        }
    }
}
