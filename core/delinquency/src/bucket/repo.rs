use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::primitives::{DelinquencyBucketId, DelinquencyRangeId};

use super::{entity::*, error::DelinquencyBucketError};

#[derive(Clone, Default)]
pub struct DelinquencyBucketRepo {
    ranges: Arc<RwLock<HashMap<DelinquencyRangeId, DelinquencyRange>>>,
    buckets: Arc<RwLock<HashMap<DelinquencyBucketId, DelinquencyBucket>>>,
}

impl DelinquencyBucketRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_range(&self, range: DelinquencyRange) -> DelinquencyRange {
        self.ranges
            .write()
            .expect("ranges lock")
            .insert(range.id, range.clone());
        range
    }

    pub fn find_range(
        &self,
        id: DelinquencyRangeId,
    ) -> Result<DelinquencyRange, DelinquencyBucketError> {
        self.ranges
            .read()
            .expect("ranges lock")
            .get(&id)
            .cloned()
            .ok_or(DelinquencyBucketError::RangeNotFound(id))
    }

    pub fn update_range_classification(
        &self,
        id: DelinquencyRangeId,
        classification: String,
    ) -> Result<DelinquencyRange, DelinquencyBucketError> {
        let mut ranges = self.ranges.write().expect("ranges lock");
        let range = ranges
            .get_mut(&id)
            .ok_or(DelinquencyBucketError::RangeNotFound(id))?;
        range.classification = classification;
        Ok(range.clone())
    }

    pub fn create_bucket(
        &self,
        bucket: DelinquencyBucket,
    ) -> Result<DelinquencyBucket, DelinquencyBucketError> {
        let mut buckets = self.buckets.write().expect("buckets lock");
        if buckets.values().any(|b| b.name == bucket.name) {
            return Err(DelinquencyBucketError::DuplicateBucketName(bucket.name));
        }
        buckets.insert(bucket.id, bucket.clone());
        Ok(bucket)
    }

    pub fn find_bucket(
        &self,
        id: DelinquencyBucketId,
    ) -> Result<DelinquencyBucket, DelinquencyBucketError> {
        self.buckets
            .read()
            .expect("buckets lock")
            .get(&id)
            .cloned()
            .ok_or(DelinquencyBucketError::BucketNotFound(id))
    }

    pub fn delete_bucket(&self, id: DelinquencyBucketId) -> Result<(), DelinquencyBucketError> {
        self.buckets
            .write()
            .expect("buckets lock")
            .remove(&id)
            .map(|_| ())
            .ok_or(DelinquencyBucketError::BucketNotFound(id))
    }

    /// The bucket's ranges, resolved and ordered by ascending `min_age_days`.
    pub fn ranges_of_bucket(
        &self,
        id: DelinquencyBucketId,
    ) -> Result<Vec<DelinquencyRange>, DelinquencyBucketError> {
        let bucket = self.find_bucket(id)?;
        let mut resolved = Vec::with_capacity(bucket.range_ids.len());
        for range_id in bucket.range_ids {
            resolved.push(self.find_range(range_id)?);
        }
        resolved.sort_by_key(|r| r.min_age_days);
        Ok(resolved)
    }
}
