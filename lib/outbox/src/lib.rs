#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

mod error;
mod event;
mod serializer;
mod transport;

use std::sync::{Arc, Mutex};

use serde::Serialize;

pub use error::OutboxError;
pub use event::{EventSequence, OutboxEventMarker, PersistentOutboxEvent};
pub use serializer::{EventSerializer, JsonEventSerializer, SerializedEvent};
pub use transport::{EventTransport, InProcessTransport, NullTransport};

pub struct Outbox<E> {
    inner: Arc<OutboxInner<E>>,
}

impl<E> Clone for Outbox<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct OutboxInner<E> {
    log: Mutex<EventLog<E>>,
    serializers: Vec<Box<dyn EventSerializer<E>>>,
    transport: Box<dyn EventTransport>,
}

struct EventLog<E> {
    sequence: EventSequence,
    events: Vec<Arc<PersistentOutboxEvent<E>>>,
}

impl<E> Outbox<E>
where
    E: Serialize + Send + Sync + 'static,
{
    pub fn init(
        mut serializers: Vec<Box<dyn EventSerializer<E>>>,
        transport: Box<dyn EventTransport>,
    ) -> Self {
        // highest priority first, ties keep registration order
        serializers.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        Self {
            inner: Arc::new(OutboxInner {
                log: Mutex::new(EventLog {
                    sequence: EventSequence::BEGIN,
                    events: Vec::new(),
                }),
                serializers,
                transport,
            }),
        }
    }

    #[tracing::instrument(name = "outbox.publish", skip_all)]
    pub async fn publish<T>(&self, event: T) -> Result<EventSequence, OutboxError>
    where
        T: Send,
        E: OutboxEventMarker<T>,
    {
        let persisted = {
            let mut log = self.inner.log.lock().expect("poisoned");
            log.sequence = log.sequence.next();
            let persisted = Arc::new(PersistentOutboxEvent {
                sequence: log.sequence,
                recorded_at: chrono::Utc::now(),
                payload: Some(E::from(event)),
            });
            log.events.push(persisted.clone());
            persisted
        };

        self.fan_out(&persisted).await;

        Ok(persisted.sequence)
    }

    pub async fn publish_all<T>(
        &self,
        events: impl IntoIterator<Item = T> + Send,
    ) -> Result<Option<EventSequence>, OutboxError>
    where
        T: Send,
        E: OutboxEventMarker<T>,
    {
        let mut last = None;
        for event in events {
            last = Some(self.publish(event).await?);
        }
        Ok(last)
    }

    /// Replay for catch-up consumers; events with a sequence strictly greater
    /// than `after` in publish order.
    pub fn events_after(&self, after: EventSequence) -> Vec<Arc<PersistentOutboxEvent<E>>> {
        let log = self.inner.log.lock().expect("poisoned");
        log.events
            .iter()
            .filter(|e| e.sequence > after)
            .cloned()
            .collect()
    }

    pub fn highest_known_sequence(&self) -> EventSequence {
        self.inner.log.lock().expect("poisoned").sequence
    }

    async fn fan_out(&self, event: &PersistentOutboxEvent<E>) {
        for serializer in &self.inner.serializers {
            match serializer.serialize(event) {
                Ok(serialized) => {
                    if let Err(e) = self.inner.transport.deliver(serialized).await {
                        tracing::warn!(sequence = %event.sequence, error = %e, "event delivery failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(sequence = %event.sequence, error = %e, "event serialization failed");
                }
            }
        }
    }
}
