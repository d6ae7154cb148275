//! Borrowing (loan) model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{BorrowingStatus, CopyStatus};
use super::fine::Fine;

/// Borrowing model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub user_id: i32,
    pub copy_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub extension_count: i16,
    #[sqlx(try_from = "i16")]
    pub status: BorrowingStatus,
}

impl Borrowing {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Status as seen at `now`: an open loan is overdue from the first
    /// calendar day after its due date
    pub fn effective_status(&self, now: DateTime<Utc>) -> BorrowingStatus {
        match self.status {
            BorrowingStatus::Returned => BorrowingStatus::Returned,
            _ if self.days_overdue(now) > 0 => BorrowingStatus::Overdue,
            _ => BorrowingStatus::Active,
        }
    }

    /// Whole calendar days (UTC) between the due date and `at`, zero or
    /// negative when `at` falls on or before the due date.
    pub fn days_overdue(&self, at: DateTime<Utc>) -> i64 {
        (at.date_naive() - self.due_date.date_naive()).num_days()
    }

    /// Due date after an extension. Always computed from the current due
    /// date so an overdue loan keeps its original schedule. `None` when
    /// the result is outside the representable date range.
    pub fn extended_due_date(&self, extension_days: i64) -> Option<DateTime<Utc>> {
        Duration::try_days(extension_days).and_then(|days| self.due_date.checked_add_signed(days))
    }
}

/// Borrowing with its derived status for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingDetails {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub effective_status: BorrowingStatus,
    pub days_overdue: i64,
}

impl BorrowingDetails {
    pub fn at(borrowing: Borrowing, now: DateTime<Utc>) -> Self {
        let effective_status = borrowing.effective_status(now);
        let days_overdue = match effective_status {
            BorrowingStatus::Overdue => borrowing.days_overdue(now).max(0),
            _ => 0,
        };
        Self {
            borrowing,
            effective_status,
            days_overdue,
        }
    }
}

/// Result of closing a borrowing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub borrowing: Borrowing,
    pub copy_status: CopyStatus,
    pub fines: Vec<Fine>,
}

impl ReturnOutcome {
    /// First fine created by the return, if any
    pub fn fine_created(&self) -> Option<i32> {
        self.fines.first().map(|f| f.id)
    }
}
