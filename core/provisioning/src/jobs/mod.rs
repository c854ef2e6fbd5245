mod loan_loss_provisioning;
mod periodic_accrual;

pub use loan_loss_provisioning::*;
pub use periodic_accrual::*;
