mod entity;
pub mod error;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::instrument;

use crate::primitives::{DelinquencyBucketId, LoanProductId};

pub use entity::*;
use error::LoanProductError;

#[derive(Clone, Default)]
pub struct LoanProducts {
    products: Arc<RwLock<HashMap<LoanProductId, LoanProduct>>>,
}

impl LoanProducts {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(name = "lending.product.create", skip(self, new_product))]
    pub fn create_product(&self, new_product: NewLoanProduct) -> LoanProduct {
        let product = new_product.into_product();
        self.products
            .write()
            .expect("products lock")
            .insert(product.id, product.clone());
        product
    }

    pub fn find_by_id(&self, id: LoanProductId) -> Result<LoanProduct, LoanProductError> {
        self.products
            .read()
            .expect("products lock")
            .get(&id)
            .cloned()
            .ok_or(LoanProductError::ProductNotFound(id))
    }

    pub fn list(&self) -> Vec<LoanProduct> {
        let mut products: Vec<_> = self
            .products
            .read()
            .expect("products lock")
            .values()
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }

    /// Products still pointing at the given bucket; a bucket with referents
    /// cannot be deleted.
    pub fn referencing_bucket(&self, bucket_id: DelinquencyBucketId) -> Vec<LoanProductId> {
        self.products
            .read()
            .expect("products lock")
            .values()
            .filter(|p| p.delinquency_bucket_id == Some(bucket_id))
            .map(|p| p.id)
            .collect()
    }

    pub fn assign_delinquency_bucket(
        &self,
        product_id: LoanProductId,
        bucket_id: Option<DelinquencyBucketId>,
    ) -> Result<LoanProduct, LoanProductError> {
        let mut products = self.products.write().expect("products lock");
        let product = products
            .get_mut(&product_id)
            .ok_or(LoanProductError::ProductNotFound(product_id))?;
        product.delinquency_bucket_id = bucket_id;
        Ok(product.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_references_track_assignment() {
        let products = LoanProducts::new();
        let bucket_id = DelinquencyBucketId::new();
        let product = products.create_product(
            NewLoanProduct::builder()
                .id(LoanProductId::new())
                .name("standard-term")
                .build()
                .unwrap(),
        );
        assert!(products.referencing_bucket(bucket_id).is_empty());

        products
            .assign_delinquency_bucket(product.id, Some(bucket_id))
            .unwrap();
        assert_eq!(products.referencing_bucket(bucket_id), vec![product.id]);

        products
            .assign_delinquency_bucket(product.id, None)
            .unwrap();
        assert!(products.referencing_bucket(bucket_id).is_empty());
    }
}
