use outbox::{Outbox, OutboxEventMarker};

use crate::event::DelinquencyEvent;

pub struct DelinquencyPublisher<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    outbox: Outbox<E>,
}

impl<E> Clone for DelinquencyPublisher<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    fn clone(&self) -> Self {
        Self {
            outbox: self.outbox.clone(),
        }
    }
}

impl<E> DelinquencyPublisher<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    pub fn new(outbox: &Outbox<E>) -> Self {
        Self {
            outbox: outbox.clone(),
        }
    }

    pub async fn publish(&self, event: DelinquencyEvent) -> Result<(), outbox::OutboxError> {
        self.outbox.publish(event).await.map(|_| ())
    }
}
