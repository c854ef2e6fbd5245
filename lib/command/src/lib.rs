#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

mod constraint;
pub mod error;
mod handler;
mod primitives;

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use audit::{AuditLog, AuditSubject, NewAuditEntry};
use outbox::{Outbox, OutboxEventMarker};

pub use constraint::{ConstraintTranslations, ConstraintViolation};
use error::CommandError;
pub use handler::{CommandHandler, CommandHandlerError};
pub use primitives::{CommandKey, CommandResult};

/// Published after every successfully dispatched command.
#[derive(Debug, Clone, Serialize, Deserialize, strum::AsRefStr)]
#[serde(tag = "type")]
pub enum CommandEvent {
    CommandExecuted {
        entity: String,
        action: String,
        resource_id: Option<String>,
    },
}

/// Startup-time registration pass; sealed into an immutable dispatcher
/// before the first request.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<CommandKey, Arc<dyn CommandHandler>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        entity: impl Into<String>,
        action: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<&mut Self, CommandError> {
        let key = CommandKey::new(entity, action);
        if self.handlers.contains_key(&key) {
            return Err(CommandError::DuplicateHandler(key.to_string()));
        }
        self.handlers.insert(key, handler);
        Ok(self)
    }

    pub fn seal<E>(self, audit: &AuditLog, outbox: &Outbox<E>) -> CommandDispatcher<E>
    where
        E: OutboxEventMarker<CommandEvent>,
    {
        CommandDispatcher {
            handlers: Arc::new(self.handlers),
            audit: audit.clone(),
            outbox: outbox.clone(),
        }
    }
}

/// Read-only handler map shared across request tasks; dispatch itself is
/// stateless per call.
pub struct CommandDispatcher<E> {
    handlers: Arc<HashMap<CommandKey, Arc<dyn CommandHandler>>>,
    audit: AuditLog,
    outbox: Outbox<E>,
}

impl<E> Clone for CommandDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            audit: self.audit.clone(),
            outbox: self.outbox.clone(),
        }
    }
}

impl<E> CommandDispatcher<E>
where
    E: OutboxEventMarker<CommandEvent>,
{
    #[instrument(name = "command.dispatch", skip(self, payload, maker), fields(entity = %entity, action = %action))]
    pub async fn dispatch(
        &self,
        entity: &str,
        action: &str,
        maker: impl Into<AuditSubject>,
        payload: serde_json::Value,
    ) -> Result<CommandResult, CommandError> {
        let key = CommandKey::new(entity, action);
        let handler = self
            .handlers
            .get(&key)
            .ok_or_else(|| CommandError::UnsupportedCommand(key.to_string()))?;

        let result = match handler.handle(&payload).await {
            Ok(result) => result,
            Err(CommandHandlerError::Constraint(violation)) => {
                return Err(handler.constraint_translations().translate(violation));
            }
            Err(e) => return Err(CommandError::Handler(e)),
        };

        // the audit record is part of the command; losing it would fail the
        // command, while the event below is post-commit and best-effort
        let mut audit_entry = NewAuditEntry::builder();
        audit_entry
            .entity(entity)
            .action(action)
            .payload(payload)
            .changes(result.changes.clone())
            .maker(maker.into());
        if let Some(resource_id) = &result.resource_id {
            audit_entry.resource_id(resource_id.clone());
        }
        self.audit
            .record(audit_entry.build().expect("all audit fields set"));

        if let Err(e) = self
            .outbox
            .publish(CommandEvent::CommandExecuted {
                entity: entity.to_string(),
                action: action.to_string(),
                resource_id: result.resource_id.clone(),
            })
            .await
        {
            tracing::warn!(entity, action, error = %e, "command event publish failed");
        }

        Ok(result)
    }

    pub fn supports(&self, entity: &str, action: &str) -> bool {
        self.handlers.contains_key(&CommandKey::new(entity, action))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use outbox::{JsonEventSerializer, NullTransport};

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    enum TestEvent {
        Command(CommandEvent),
    }

    impl From<CommandEvent> for TestEvent {
        fn from(event: CommandEvent) -> Self {
            TestEvent::Command(event)
        }
    }

    impl OutboxEventMarker<CommandEvent> for TestEvent {
        fn as_event(&self) -> Option<&CommandEvent> {
            let TestEvent::Command(event) = self;
            Some(event)
        }
    }

    struct CreateTokenHandler;

    #[async_trait]
    impl CommandHandler for CreateTokenHandler {
        async fn handle(
            &self,
            payload: &serde_json::Value,
        ) -> Result<CommandResult, CommandHandlerError> {
            if payload.get("duplicate").is_some() {
                return Err(CommandHandlerError::Constraint(
                    ConstraintViolation::new("uq_token_external_id")
                        .on_field("externalId", "token-1"),
                ));
            }
            if payload.get("unknown_constraint").is_some() {
                return Err(CommandHandlerError::Constraint(ConstraintViolation::new(
                    "fk_token_owner",
                )));
            }
            Ok(CommandResult::new("token-1")
                .with_change("externalId", serde_json::json!("token-1")))
        }

        fn constraint_translations(&self) -> ConstraintTranslations {
            ConstraintTranslations::new().with("uq_token_external_id", "duplicate.external.id")
        }
    }

    fn dispatcher() -> (CommandDispatcher<TestEvent>, AuditLog, Outbox<TestEvent>) {
        let audit = AuditLog::new();
        let outbox: Outbox<TestEvent> = Outbox::init(
            vec![Box::new(JsonEventSerializer)],
            Box::new(NullTransport),
        );
        let mut registry = CommandRegistry::new();
        registry
            .register("TWOFACTOR_ACCESSTOKEN", "CREATE", Arc::new(CreateTokenHandler))
            .unwrap();
        (registry.seal(&audit, &outbox), audit, outbox)
    }

    #[tokio::test]
    async fn missing_handler_is_unsupported_command() {
        let (dispatcher, _, _) = dispatcher();
        let err = dispatcher
            .dispatch(
                "TWOFACTOR_ACCESSTOKEN",
                "INVALIDATE",
                "maker",
                serde_json::json!({}),
            )
            .await
            .unwrap_err();
        match err {
            CommandError::UnsupportedCommand(key) => {
                assert_eq!(key, "TWOFACTOR_ACCESSTOKEN|INVALIDATE")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn successful_dispatch_records_audit_and_publishes_event() {
        let (dispatcher, audit, outbox) = dispatcher();
        let result = dispatcher
            .dispatch(
                "TWOFACTOR_ACCESSTOKEN",
                "CREATE",
                "maker",
                serde_json::json!({ "externalId": "token-1" }),
            )
            .await
            .unwrap();
        assert_eq!(result.resource_id.as_deref(), Some("token-1"));

        let entries = audit.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity, "TWOFACTOR_ACCESSTOKEN");
        assert_eq!(entries[0].action, "CREATE");
        assert_eq!(entries[0].resource_id.as_deref(), Some("token-1"));
        assert_eq!(
            entries[0].changes.get("externalId"),
            Some(&serde_json::json!("token-1"))
        );

        let events = outbox.events_after(outbox::EventSequence::BEGIN);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].as_event::<CommandEvent>(),
            Some(CommandEvent::CommandExecuted { resource_id: Some(id), .. }) if id == "token-1"
        ));
    }

    #[tokio::test]
    async fn constraint_violation_translates_to_domain_error() {
        let (dispatcher, audit, _) = dispatcher();
        let err = dispatcher
            .dispatch(
                "TWOFACTOR_ACCESSTOKEN",
                "CREATE",
                "maker",
                serde_json::json!({ "duplicate": true }),
            )
            .await
            .unwrap_err();
        match err {
            CommandError::Integrity {
                error,
                constraint,
                field,
                value,
            } => {
                assert_eq!(error, "duplicate.external.id");
                assert_eq!(constraint, "uq_token_external_id");
                assert_eq!(field.as_deref(), Some("externalId"));
                assert_eq!(value.as_deref(), Some("token-1"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // failed command leaves no audit entry
        assert!(audit.list().is_empty());
    }

    #[tokio::test]
    async fn unknown_constraint_is_surfaced_untranslated() {
        let (dispatcher, _, _) = dispatcher();
        let err = dispatcher
            .dispatch(
                "TWOFACTOR_ACCESSTOKEN",
                "CREATE",
                "maker",
                serde_json::json!({ "unknown_constraint": true }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::UntranslatedConstraint(constraint) if constraint == "fk_token_owner"
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register("LOAN", "CREATE", Arc::new(CreateTokenHandler))
            .unwrap();
        let err = registry
            .register("LOAN", "CREATE", Arc::new(CreateTokenHandler))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::DuplicateHandler(key) if key == "LOAN|CREATE"
        ));
    }
}
