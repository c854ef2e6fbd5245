mod entity;
pub mod error;
mod repo;

pub use entity::{DelinquencyBucket, DelinquencyRange};
pub(crate) use entity::validate_cover;
pub use repo::DelinquencyBucketRepo;
