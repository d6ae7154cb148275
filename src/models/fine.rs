//! Fine model and the fine schedule

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{FineReason, FineStatus, ReturnCondition};
use crate::config::LendingConfig;

/// Fine model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: i32,
    pub borrowing_id: i32,
    pub amount: Decimal,
    #[sqlx(try_from = "i16")]
    pub reason: FineReason,
    pub description: String,
    #[sqlx(try_from = "i16")]
    pub status: FineStatus,
    pub days_overdue: i32,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub settled_by: Option<i32>,
}

/// Fine about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFine {
    pub borrowing_id: i32,
    pub amount: Decimal,
    pub reason: FineReason,
    pub description: String,
    pub days_overdue: i32,
}

/// Amounts charged for late, damaged and lost copies
#[derive(Debug, Clone)]
pub struct FineSchedule {
    pub daily_rate: Decimal,
    pub damaged_fee: Decimal,
    pub lost_fee: Decimal,
}

impl From<&LendingConfig> for FineSchedule {
    fn from(config: &LendingConfig) -> Self {
        Self {
            daily_rate: config.daily_rate,
            damaged_fee: config.damaged_fee,
            lost_fee: config.lost_fee,
        }
    }
}

fn money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

impl FineSchedule {
    /// Overdue fine for `days_overdue` days, `None` when not late
    pub fn overdue_fine(&self, borrowing_id: i32, days_overdue: i64) -> Option<NewFine> {
        if days_overdue <= 0 {
            return None;
        }
        let amount = money(self.daily_rate * Decimal::from(days_overdue));
        Some(NewFine {
            borrowing_id,
            amount,
            reason: FineReason::Overdue,
            description: format!(
                "Returned {} day(s) late at {} per day",
                days_overdue,
                money(self.daily_rate)
            ),
            days_overdue: days_overdue.try_into().unwrap_or(i32::MAX),
        })
    }

    /// Fine for a copy returned damaged or lost, `None` for a good return.
    ///
    /// A lost copy is charged the title's replacement cost when one is set.
    pub fn damage_fine(
        &self,
        borrowing_id: i32,
        condition: ReturnCondition,
        replacement_cost: Option<Decimal>,
    ) -> Option<NewFine> {
        let reason = condition.fine_reason()?;
        let (amount, description) = match reason {
            FineReason::Damaged => (self.damaged_fee, "Copy returned damaged".to_string()),
            FineReason::Lost => match replacement_cost {
                Some(cost) if !cost.is_sign_negative() => {
                    (cost, "Copy lost, replacement cost charged".to_string())
                }
                _ => (self.lost_fee, "Copy lost".to_string()),
            },
            FineReason::Overdue => return None,
        };
        Some(NewFine {
            borrowing_id,
            amount: money(amount),
            reason,
            description,
            days_overdue: 0,
        })
    }
}
