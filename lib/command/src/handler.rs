use async_trait::async_trait;
use thiserror::Error;

use crate::{
    constraint::{ConstraintTranslations, ConstraintViolation},
    primitives::CommandResult,
};

#[derive(Error, Debug)]
pub enum CommandHandlerError {
    #[error("CommandHandlerError - Constraint: {0}")]
    Constraint(ConstraintViolation),
    #[error("CommandHandlerError - InvalidPayload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("CommandHandlerError - Domain: {0}")]
    Domain(String),
}

/// One registered (entity, action) implementation. Handlers run inside the
/// store's transaction scope; a constraint failure rolls back only this
/// command and is translated via the handler's own table.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, payload: &serde_json::Value) -> Result<CommandResult, CommandHandlerError>;

    fn constraint_translations(&self) -> ConstraintTranslations {
        ConstraintTranslations::new()
    }
}
