mod entity;
pub mod error;
mod repo;

pub use entity::{NewProvisioningCriteria, ProvisioningCategory, ProvisioningCriteria};
pub use repo::ProvisioningCriteriaRepo;
