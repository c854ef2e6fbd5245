use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{error::OutboxError, serializer::SerializedEvent};

/// Hand-off point to the external pub/sub channel. Delivery is best-effort;
/// the outbox never rolls anything back on a transport failure.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn deliver(&self, event: SerializedEvent) -> Result<(), OutboxError>;
}

pub struct NullTransport;

#[async_trait]
impl EventTransport for NullTransport {
    async fn deliver(&self, _event: SerializedEvent) -> Result<(), OutboxError> {
        Ok(())
    }
}

/// Captures delivered payloads in process, for consumers that poll locally
/// and for tests.
#[derive(Clone, Default)]
pub struct InProcessTransport {
    delivered: Arc<Mutex<Vec<SerializedEvent>>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<SerializedEvent> {
        self.delivered.lock().expect("poisoned").clone()
    }
}

#[async_trait]
impl EventTransport for InProcessTransport {
    async fn deliver(&self, event: SerializedEvent) -> Result<(), OutboxError> {
        self.delivered.lock().expect("poisoned").push(event);
        Ok(())
    }
}
