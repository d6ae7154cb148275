//! Borrowing eligibility policy
//!
//! The decision whether a user may borrow belongs to the deployment; the
//! lending core only supplies the user's unpaid fine total and raises
//! `UserIneligible` when the policy refuses.

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
pub trait EligibilityPolicy: Send + Sync {
    fn check(&self, user_id: i32, unpaid_total: Decimal) -> AppResult<()>;
}

/// Refuses users whose unpaid fines exceed a threshold.
/// Without a threshold every user is eligible.
#[derive(Debug, Clone, Default)]
pub struct UnpaidFinesThreshold {
    pub max_unpaid: Option<Decimal>,
}

impl UnpaidFinesThreshold {
    pub fn new(max_unpaid: Option<Decimal>) -> Self {
        Self { max_unpaid }
    }
}

impl EligibilityPolicy for UnpaidFinesThreshold {
    fn check(&self, user_id: i32, unpaid_total: Decimal) -> AppResult<()> {
        match self.max_unpaid {
            Some(max) if unpaid_total > max => Err(AppError::UserIneligible(format!(
                "user {} has {} in unpaid fines (limit {})",
                user_id, unpaid_total, max
            ))),
            _ => Ok(()),
        }
    }
}
