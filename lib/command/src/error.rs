use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("CommandError - UnsupportedCommand: {0}")]
    UnsupportedCommand(String),
    #[error("CommandError - DuplicateHandler: {0}")]
    DuplicateHandler(String),
    #[error("CommandError - Integrity: {error} ({constraint})")]
    Integrity {
        error: String,
        constraint: String,
        field: Option<String>,
        value: Option<String>,
    },
    #[error("CommandError - UntranslatedConstraint: {0}")]
    UntranslatedConstraint(String),
    #[error("CommandError - Handler: {0}")]
    Handler(crate::handler::CommandHandlerError),
}
