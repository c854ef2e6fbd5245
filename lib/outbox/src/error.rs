use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("OutboxError - Serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("OutboxError - Transport: {0}")]
    Transport(String),
}
