mod business_date_rollover;

pub use business_date_rollover::*;
