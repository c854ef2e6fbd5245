use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use job::*;

use crate::AuditLog;

#[derive(Clone, Serialize, Deserialize)]
pub struct AuditPurgeJobConfig {
    pub retention_days: u32,
}

impl JobConfig for AuditPurgeJobConfig {
    type Initializer = AuditPurgeInit;
}

pub struct AuditPurgeInit {
    audit: AuditLog,
}

impl AuditPurgeInit {
    pub fn new(audit: &AuditLog) -> Self {
        Self {
            audit: audit.clone(),
        }
    }
}

const AUDIT_PURGE_JOB: JobType = JobType::new("audit-purge");
impl JobInitializer for AuditPurgeInit {
    fn job_type() -> JobType
    where
        Self: Sized,
    {
        AUDIT_PURGE_JOB
    }

    fn init(
        &self,
        job: &Job,
    ) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Box::new(AuditPurgeJobRunner {
            config: job.config()?,
            audit: self.audit.clone(),
        }))
    }
}

pub struct AuditPurgeJobRunner {
    config: AuditPurgeJobConfig,
    audit: AuditLog,
}

#[async_trait]
impl JobRunner for AuditPurgeJobRunner {
    #[instrument(name = "audit.job.purge", skip(self, _current_job))]
    async fn run(
        &self,
        _current_job: CurrentJob,
    ) -> Result<JobCompletion, Box<dyn std::error::Error + Send + Sync>> {
        let deleted = self
            .audit
            .purge(self.config.retention_days, chrono::Utc::now());
        if deleted == 0 {
            return Ok(JobCompletion::Noop);
        }
        tracing::info!(deleted, "purged terminal audit entries");
        Ok(JobCompletion::Complete)
    }
}
