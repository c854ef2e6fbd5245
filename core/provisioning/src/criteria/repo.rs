use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::primitives::ProvisioningCriteriaId;

use super::{entity::*, error::ProvisioningCriteriaError};

#[derive(Clone, Default)]
pub struct ProvisioningCriteriaRepo {
    criteria: Arc<RwLock<HashMap<ProvisioningCriteriaId, ProvisioningCriteria>>>,
}

impl ProvisioningCriteriaRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        new_criteria: NewProvisioningCriteria,
    ) -> Result<ProvisioningCriteria, ProvisioningCriteriaError> {
        let criteria = new_criteria.into_criteria()?;
        let mut store = self.criteria.write().expect("criteria lock");
        if store.values().any(|c| c.name == criteria.name) {
            return Err(ProvisioningCriteriaError::DuplicateCriteriaName(
                criteria.name,
            ));
        }
        store.insert(criteria.id, criteria.clone());
        Ok(criteria)
    }

    pub fn find_by_id(
        &self,
        id: ProvisioningCriteriaId,
    ) -> Result<ProvisioningCriteria, ProvisioningCriteriaError> {
        self.criteria
            .read()
            .expect("criteria lock")
            .get(&id)
            .cloned()
            .ok_or(ProvisioningCriteriaError::CriteriaNotFound(id))
    }

    pub fn list(&self) -> Vec<ProvisioningCriteria> {
        let mut criteria: Vec<_> = self
            .criteria
            .read()
            .expect("criteria lock")
            .values()
            .cloned()
            .collect();
        criteria.sort_by_key(|c| c.id);
        criteria
    }
}
