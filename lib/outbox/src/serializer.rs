use serde::Serialize;

use crate::{error::OutboxError, event::PersistentOutboxEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEvent {
    pub content_type: &'static str,
    pub payload: Vec<u8>,
}

/// One step of the serializer chain. The chain runs highest priority first;
/// the default priority of 0 runs last.
pub trait EventSerializer<E>: Send + Sync
where
    E: Serialize,
{
    fn priority(&self) -> i32 {
        0
    }

    fn serialize(&self, event: &PersistentOutboxEvent<E>) -> Result<SerializedEvent, OutboxError>;
}

pub struct JsonEventSerializer;

impl<E> EventSerializer<E> for JsonEventSerializer
where
    E: Serialize,
{
    fn serialize(&self, event: &PersistentOutboxEvent<E>) -> Result<SerializedEvent, OutboxError> {
        Ok(SerializedEvent {
            content_type: "application/json",
            payload: serde_json::to_vec(event)?,
        })
    }
}
