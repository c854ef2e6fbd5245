use outbox::{Outbox, OutboxEventMarker};

use crate::event::ProvisioningEvent;

pub struct ProvisioningPublisher<E>
where
    E: OutboxEventMarker<ProvisioningEvent>,
{
    outbox: Outbox<E>,
}

impl<E> Clone for ProvisioningPublisher<E>
where
    E: OutboxEventMarker<ProvisioningEvent>,
{
    fn clone(&self) -> Self {
        Self {
            outbox: self.outbox.clone(),
        }
    }
}

impl<E> ProvisioningPublisher<E>
where
    E: OutboxEventMarker<ProvisioningEvent>,
{
    pub fn new(outbox: &Outbox<E>) -> Self {
        Self {
            outbox: outbox.clone(),
        }
    }

    pub async fn publish(&self, event: ProvisioningEvent) -> Result<(), outbox::OutboxError> {
        self.outbox.publish(event).await.map(|_| ())
    }
}
