use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{entity::JobId, error::JobError};

/// Handle passed into a running job. Execution state survives across runs so
/// consumers (e.g. outbox listeners) can resume from where they left off.
pub struct CurrentJob {
    id: JobId,
    attempt: u32,
    state: Arc<Mutex<HashMap<JobId, serde_json::Value>>>,
}

impl CurrentJob {
    pub(crate) fn new(
        id: JobId,
        attempt: u32,
        state: Arc<Mutex<HashMap<JobId, serde_json::Value>>>,
    ) -> Self {
        Self { id, attempt, state }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn execution_state<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, JobError> {
        self.state
            .lock()
            .expect("poisoned")
            .get(&self.id)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(JobError::from)
    }

    pub fn update_execution_state<T: serde::Serialize>(
        &mut self,
        state: &T,
    ) -> Result<(), JobError> {
        let value = serde_json::to_value(state)?;
        self.state.lock().expect("poisoned").insert(self.id, value);
        Ok(())
    }
}
