use thiserror::Error;

use crate::entity::{JobId, JobType};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("JobError - NoInitializerPresent: {0}")]
    NoInitializerPresent(JobType),
    #[error("JobError - JobNotFound: {0}")]
    JobNotFound(JobId),
    #[error("JobError - InvalidCronExpression: {0}")]
    InvalidCronExpression(String),
    #[error("JobError - Serde: {0}")]
    Serde(#[from] serde_json::Error),
}
