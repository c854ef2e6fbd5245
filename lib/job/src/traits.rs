use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{current::CurrentJob, entity::*};

pub trait JobConfig: serde::Serialize {
    type Initializer: JobInitializer;
}

pub trait JobInitializer: Send + Sync + 'static {
    fn job_type() -> JobType
    where
        Self: Sized;

    fn init(
        &self,
        job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>>;

    fn retry_on_error_settings() -> RetrySettings
    where
        Self: Sized,
    {
        RetrySettings::default()
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(
        &self,
        current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCompletion {
    Complete,
    /// Nothing applicable to do this run (e.g. feature flag off).
    Noop,
    RescheduleNow,
    RescheduleIn(std::time::Duration),
    RescheduleAt(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub backoff: std::time::Duration,
}

impl RetrySettings {
    pub fn repeat_indefinitely() -> Self {
        Self {
            max_attempts: None,
            ..Default::default()
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: Some(3),
            backoff: std::time::Duration::from_secs(10),
        }
    }
}
