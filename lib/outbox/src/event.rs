use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventSequence(u64);

impl EventSequence {
    pub const BEGIN: Self = Self(0);

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for EventSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Marker lifting a per-crate event enum into the application-wide event type.
pub trait OutboxEventMarker<T>:
    serde::de::DeserializeOwned + Serialize + Send + Sync + From<T> + 'static
{
    fn as_event(&self) -> Option<&T>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentOutboxEvent<E> {
    pub sequence: EventSequence,
    pub recorded_at: DateTime<Utc>,
    pub payload: Option<E>,
}

impl<E> PersistentOutboxEvent<E> {
    pub fn as_event<T>(&self) -> Option<&T>
    where
        E: OutboxEventMarker<T>,
    {
        self.payload.as_ref().and_then(|p| p.as_event())
    }
}
