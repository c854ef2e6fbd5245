use async_trait::async_trait;
use serde::Deserialize;

use command::{
    CommandHandler, CommandHandlerError, CommandRegistry, CommandResult, ConstraintTranslations,
    ConstraintViolation,
};
use outbox::OutboxEventMarker;

use crate::{
    bucket::error::DelinquencyBucketError, error::CoreDelinquencyError, event::DelinquencyEvent,
    primitives::DelinquencyBucketId, Delinquencies,
};

pub const DELINQUENCY_BUCKET_ENTITY: &str = "DELINQUENCY_BUCKET";

/// Wires the bucket lifecycle into the command registry.
pub fn register_commands<E>(
    registry: &mut CommandRegistry,
    delinquencies: &Delinquencies<E>,
) -> Result<(), command::error::CommandError>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    registry.register(
        DELINQUENCY_BUCKET_ENTITY,
        "CREATE",
        std::sync::Arc::new(CreateBucketHandler {
            delinquencies: delinquencies.clone(),
        }),
    )?;
    registry.register(
        DELINQUENCY_BUCKET_ENTITY,
        "DELETE",
        std::sync::Arc::new(DeleteBucketHandler {
            delinquencies: delinquencies.clone(),
        }),
    )?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketPayload {
    name: String,
    ranges: Vec<CreateRangePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRangePayload {
    classification: String,
    min_age_days: u32,
    max_age_days: Option<u32>,
}

struct CreateBucketHandler<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    delinquencies: Delinquencies<E>,
}

#[async_trait]
impl<E> CommandHandler for CreateBucketHandler<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    async fn handle(
        &self,
        payload: &serde_json::Value,
    ) -> Result<CommandResult, CommandHandlerError> {
        let payload: CreateBucketPayload = serde_json::from_value(payload.clone())?;
        let range_ids = payload
            .ranges
            .into_iter()
            .map(|r| {
                self.delinquencies
                    .create_range(r.classification, r.min_age_days, r.max_age_days)
                    .id
            })
            .collect();
        let bucket = self
            .delinquencies
            .create_bucket(payload.name, range_ids)
            .map_err(|e| match e {
                CoreDelinquencyError::Bucket(DelinquencyBucketError::DuplicateBucketName(
                    name,
                )) => CommandHandlerError::Constraint(
                    ConstraintViolation::new("uq_delinquency_bucket_name")
                        .on_field("name", name),
                ),
                other => CommandHandlerError::Domain(other.to_string()),
            })?;
        Ok(CommandResult::new(bucket.id.to_string())
            .with_change("name", serde_json::json!(bucket.name)))
    }

    fn constraint_translations(&self) -> ConstraintTranslations {
        ConstraintTranslations::new()
            .with("uq_delinquency_bucket_name", "duplicate.delinquency.bucket.name")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBucketPayload {
    bucket_id: DelinquencyBucketId,
}

struct DeleteBucketHandler<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    delinquencies: Delinquencies<E>,
}

#[async_trait]
impl<E> CommandHandler for DeleteBucketHandler<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    async fn handle(
        &self,
        payload: &serde_json::Value,
    ) -> Result<CommandResult, CommandHandlerError> {
        let payload: DeleteBucketPayload = serde_json::from_value(payload.clone())?;
        self.delinquencies
            .delete_bucket(payload.bucket_id)
            .map_err(|e| match e {
                CoreDelinquencyError::Bucket(
                    DelinquencyBucketError::BucketReferencedByProducts(_),
                ) => CommandHandlerError::Constraint(
                    ConstraintViolation::new("fk_product_delinquency_bucket")
                        .on_field("bucketId", payload.bucket_id.to_string()),
                ),
                other => CommandHandlerError::Domain(other.to_string()),
            })?;
        Ok(CommandResult::new(payload.bucket_id.to_string()))
    }

    fn constraint_translations(&self) -> ConstraintTranslations {
        ConstraintTranslations::new()
            .with("fk_product_delinquency_bucket", "delinquency.bucket.in.use")
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use audit::AuditLog;
    use command::{error::CommandError, CommandDispatcher, CommandEvent};
    use core_lending::{Loans, LoanProducts, NewLoanProduct};
    use outbox::{JsonEventSerializer, NullTransport, Outbox};

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    enum TestEvent {
        Command(CommandEvent),
        Delinquency(DelinquencyEvent),
    }

    impl From<CommandEvent> for TestEvent {
        fn from(event: CommandEvent) -> Self {
            TestEvent::Command(event)
        }
    }

    impl From<DelinquencyEvent> for TestEvent {
        fn from(event: DelinquencyEvent) -> Self {
            TestEvent::Delinquency(event)
        }
    }

    impl OutboxEventMarker<CommandEvent> for TestEvent {
        fn as_event(&self) -> Option<&CommandEvent> {
            match self {
                TestEvent::Command(event) => Some(event),
                _ => None,
            }
        }
    }

    impl OutboxEventMarker<DelinquencyEvent> for TestEvent {
        fn as_event(&self) -> Option<&DelinquencyEvent> {
            match self {
                TestEvent::Delinquency(event) => Some(event),
                _ => None,
            }
        }
    }

    fn setup() -> (CommandDispatcher<TestEvent>, Delinquencies<TestEvent>, LoanProducts) {
        let loans = Loans::new();
        let products = LoanProducts::new();
        let outbox: Outbox<TestEvent> =
            Outbox::init(vec![Box::new(JsonEventSerializer)], Box::new(NullTransport));
        let delinquencies = Delinquencies::new(&loans, &products, &outbox);
        let audit = AuditLog::new();
        let mut registry = CommandRegistry::new();
        register_commands(&mut registry, &delinquencies).unwrap();
        (registry.seal(&audit, &outbox), delinquencies, products)
    }

    fn bucket_payload(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "ranges": [
                { "classification": "current", "minAgeDays": 0, "maxAgeDays": 30 },
                { "classification": "late", "minAgeDays": 31, "maxAgeDays": null },
            ],
        })
    }

    #[tokio::test]
    async fn create_bucket_command_round_trips() {
        let (dispatcher, delinquencies, _) = setup();
        let result = dispatcher
            .dispatch(
                DELINQUENCY_BUCKET_ENTITY,
                "CREATE",
                "operator",
                bucket_payload("standard-ageing"),
            )
            .await
            .unwrap();

        let bucket_id: DelinquencyBucketId = result
            .resource_id
            .unwrap()
            .parse::<uuid::Uuid>()
            .unwrap()
            .into();
        let bucket = delinquencies.find_bucket(bucket_id).unwrap();
        assert_eq!(bucket.name, "standard-ageing");
        assert_eq!(bucket.range_ids.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_bucket_name_translates_to_domain_error() {
        let (dispatcher, _, _) = setup();
        dispatcher
            .dispatch(
                DELINQUENCY_BUCKET_ENTITY,
                "CREATE",
                "operator",
                bucket_payload("standard-ageing"),
            )
            .await
            .unwrap();

        let err = dispatcher
            .dispatch(
                DELINQUENCY_BUCKET_ENTITY,
                "CREATE",
                "operator",
                bucket_payload("standard-ageing"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Integrity { error, .. } if error == "duplicate.delinquency.bucket.name"
        ));
    }

    #[tokio::test]
    async fn delete_of_referenced_bucket_translates_to_domain_error() {
        let (dispatcher, delinquencies, products) = setup();
        let result = dispatcher
            .dispatch(
                DELINQUENCY_BUCKET_ENTITY,
                "CREATE",
                "operator",
                bucket_payload("standard-ageing"),
            )
            .await
            .unwrap();
        let bucket_id: DelinquencyBucketId = result
            .resource_id
            .unwrap()
            .parse::<uuid::Uuid>()
            .unwrap()
            .into();

        products.create_product(
            NewLoanProduct::builder()
                .id(core_lending::primitives::LoanProductId::new())
                .name("standard-term")
                .delinquency_bucket_id(bucket_id)
                .build()
                .unwrap(),
        );

        let err = dispatcher
            .dispatch(
                DELINQUENCY_BUCKET_ENTITY,
                "DELETE",
                "operator",
                serde_json::json!({ "bucketId": bucket_id }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Integrity { error, .. } if error == "delinquency.bucket.in.use"
        ));
        delinquencies.find_bucket(bucket_id).unwrap();
    }
}

