use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobType(&'static str);

impl JobType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// When a job should run again after it completes. Jobs may also reschedule
/// themselves explicitly via `JobCompletion`.
#[derive(Debug, Clone)]
pub enum JobSchedule {
    /// Run once when due; terminal afterwards.
    Once,
    /// Cron expression, evaluated in UTC.
    Cron(String),
    /// Fixed interval from the end of the previous run.
    Interval(std::time::Duration),
}

impl JobSchedule {
    pub fn cron(expression: impl Into<String>) -> Result<Self, JobError> {
        let expression = expression.into();
        cron::Schedule::from_str(&expression)
            .map_err(|e| JobError::InvalidCronExpression(format!("{expression}: {e}")))?;
        Ok(JobSchedule::Cron(expression))
    }

    pub(crate) fn next_run_after(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, JobError> {
        match self {
            JobSchedule::Once => Ok(None),
            JobSchedule::Cron(expression) => {
                let schedule = cron::Schedule::from_str(expression)
                    .map_err(|e| JobError::InvalidCronExpression(format!("{expression}: {e}")))?;
                Ok(schedule.after(&now).next())
            }
            JobSchedule::Interval(interval) => Ok(Some(
                now + chrono::Duration::from_std(*interval).expect("interval out of range"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub schedule: JobSchedule,
    /// Pinned cluster node; `None` runs on any node.
    pub node_affinity: Option<String>,
    config: serde_json::Value,
}

impl Job {
    pub(crate) fn new(
        id: JobId,
        job_type: JobType,
        schedule: JobSchedule,
        node_affinity: Option<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            id,
            job_type,
            schedule,
            node_affinity,
            config,
        }
    }

    pub fn config<C: serde::de::DeserializeOwned>(&self) -> Result<C, JobError> {
        Ok(serde_json::from_value(self.config.clone())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobRunState {
    Scheduled,
    Running,
    Completed,
    Failed,
    /// Ran, decided there was nothing applicable to do. Distinct from
    /// `Failed` for monitoring.
    Noop,
}

/// One finished (or skipped) execution, kept for operational monitoring.
#[derive(Debug, Clone)]
pub struct JobRunRecord {
    pub job_id: JobId,
    pub job_type: JobType,
    pub state: JobRunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}
