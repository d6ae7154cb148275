//! Lifecycle status enums shared by the lending models
//!
//! Statuses are persisted as SMALLINT codes. Unlike free-form strings, an
//! unknown code is rejected on read (`UnknownStatus`) and an unknown name is
//! rejected on input (`AppError::InvalidStatus`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::AppError;

/// A stored status code that does not belong to its enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub code: i16,
}

impl From<UnknownStatus> for AppError {
    fn from(e: UnknownStatus) -> Self {
        AppError::InvalidStatus(e.to_string())
    }
}

fn invalid_name(kind: &str, value: &str) -> AppError {
    AppError::InvalidStatus(format!("'{}' is not a valid {}", value, kind))
}

// ---------------------------------------------------------------------------
// CopyStatus
// ---------------------------------------------------------------------------

/// Status of one physical or e-book copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum CopyStatus {
    Available = 0,
    Borrowed = 1,
    Damaged = 2,
    Lost = 3,
    Reserved = 4,
}

impl CopyStatus {
    pub const ALL: [CopyStatus; 5] = [
        CopyStatus::Available,
        CopyStatus::Borrowed,
        CopyStatus::Damaged,
        CopyStatus::Lost,
        CopyStatus::Reserved,
    ];

    pub fn is_available(self) -> bool {
        self == CopyStatus::Available
    }

    /// Signed change to the title's available-copies counter when a copy
    /// moves from `from` to `to`.
    pub fn availability_delta(from: CopyStatus, to: CopyStatus) -> i32 {
        i32::from(to.is_available()) - i32::from(from.is_available())
    }

    /// Transition check for staff inventory actions.
    ///
    /// Entering or leaving `Borrowed` is reserved to the borrowing state
    /// machine, which keeps one open borrowing per borrowed copy.
    pub fn check_staff_transition(from: CopyStatus, to: CopyStatus) -> Result<(), AppError> {
        match (from, to) {
            (CopyStatus::Borrowed, _) if to != from => Err(AppError::Conflict(
                "copy is on loan; return it through its borrowing".to_string(),
            )),
            (_, CopyStatus::Borrowed) if to != from => Err(AppError::Conflict(
                "copies are marked borrowed only by issuing a borrowing".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl TryFrom<i16> for CopyStatus {
    type Error = UnknownStatus;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(CopyStatus::Available),
            1 => Ok(CopyStatus::Borrowed),
            2 => Ok(CopyStatus::Damaged),
            3 => Ok(CopyStatus::Lost),
            4 => Ok(CopyStatus::Reserved),
            code => Err(UnknownStatus { kind: "copy status", code }),
        }
    }
}

impl From<CopyStatus> for i16 {
    fn from(s: CopyStatus) -> Self {
        s as i16
    }
}

impl FromStr for CopyStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(CopyStatus::Available),
            "borrowed" => Ok(CopyStatus::Borrowed),
            "damaged" => Ok(CopyStatus::Damaged),
            "lost" => Ok(CopyStatus::Lost),
            "reserved" => Ok(CopyStatus::Reserved),
            _ => Err(invalid_name("copy status", s)),
        }
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Damaged => "damaged",
            CopyStatus::Lost => "lost",
            CopyStatus::Reserved => "reserved",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BorrowingStatus
// ---------------------------------------------------------------------------

/// Borrowing status. `Overdue` is derived from `Active` and the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum BorrowingStatus {
    Active = 0,
    Overdue = 1,
    Returned = 2,
}

impl BorrowingStatus {
    pub fn is_open(self) -> bool {
        self != BorrowingStatus::Returned
    }
}

impl TryFrom<i16> for BorrowingStatus {
    type Error = UnknownStatus;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(BorrowingStatus::Active),
            1 => Ok(BorrowingStatus::Overdue),
            2 => Ok(BorrowingStatus::Returned),
            code => Err(UnknownStatus { kind: "borrowing status", code }),
        }
    }
}

impl From<BorrowingStatus> for i16 {
    fn from(s: BorrowingStatus) -> Self {
        s as i16
    }
}

// ---------------------------------------------------------------------------
// ReturnCondition
// ---------------------------------------------------------------------------

/// Condition of a copy when it comes back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReturnCondition {
    #[default]
    Good,
    Damaged,
    Lost,
}

impl ReturnCondition {
    /// Copy status written when the borrowing is closed
    pub fn copy_status(self) -> CopyStatus {
        match self {
            ReturnCondition::Good => CopyStatus::Available,
            ReturnCondition::Damaged => CopyStatus::Damaged,
            ReturnCondition::Lost => CopyStatus::Lost,
        }
    }

    /// Fine reason charged for the condition, if any
    pub fn fine_reason(self) -> Option<FineReason> {
        match self {
            ReturnCondition::Good => None,
            ReturnCondition::Damaged => Some(FineReason::Damaged),
            ReturnCondition::Lost => Some(FineReason::Lost),
        }
    }
}

impl FromStr for ReturnCondition {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(ReturnCondition::Good),
            "damaged" => Ok(ReturnCondition::Damaged),
            "lost" => Ok(ReturnCondition::Lost),
            _ => Err(invalid_name("return condition", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// FineStatus / FineReason
// ---------------------------------------------------------------------------

/// Fine settlement status. `Paid` and `Waived` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum FineStatus {
    Accrued = 0,
    Paid = 1,
    Waived = 2,
}

impl FineStatus {
    pub fn is_settled(self) -> bool {
        self != FineStatus::Accrued
    }

    /// Allowed transitions: Accrued -> Paid, Accrued -> Waived
    pub fn can_transition_to(self, to: FineStatus) -> bool {
        matches!(
            (self, to),
            (FineStatus::Accrued, FineStatus::Paid) | (FineStatus::Accrued, FineStatus::Waived)
        )
    }
}

impl TryFrom<i16> for FineStatus {
    type Error = UnknownStatus;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(FineStatus::Accrued),
            1 => Ok(FineStatus::Paid),
            2 => Ok(FineStatus::Waived),
            code => Err(UnknownStatus { kind: "fine status", code }),
        }
    }
}

impl From<FineStatus> for i16 {
    fn from(s: FineStatus) -> Self {
        s as i16
    }
}

impl FromStr for FineStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accrued" => Ok(FineStatus::Accrued),
            "paid" => Ok(FineStatus::Paid),
            "waived" => Ok(FineStatus::Waived),
            _ => Err(invalid_name("fine status", s)),
        }
    }
}

/// Why a fine was charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum FineReason {
    Overdue = 0,
    Damaged = 1,
    Lost = 2,
}

impl TryFrom<i16> for FineReason {
    type Error = UnknownStatus;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(FineReason::Overdue),
            1 => Ok(FineReason::Damaged),
            2 => Ok(FineReason::Lost),
            code => Err(UnknownStatus { kind: "fine reason", code }),
        }
    }
}

impl From<FineReason> for i16 {
    fn from(r: FineReason) -> Self {
        r as i16
    }
}

impl std::fmt::Display for FineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FineReason::Overdue => "overdue",
            FineReason::Damaged => "damaged",
            FineReason::Lost => "lost",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ReviewStatus
// ---------------------------------------------------------------------------

/// Moderation status of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ReviewStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
}

impl ReviewStatus {
    /// Staff moderation table. Going back to `Pending` only happens when the
    /// owner edits the review.
    pub fn moderate(self, to: ReviewStatus) -> Result<ReviewStatus, AppError> {
        match (self, to) {
            (ReviewStatus::Pending, ReviewStatus::Approved)
            | (ReviewStatus::Pending, ReviewStatus::Rejected)
            | (ReviewStatus::Approved, ReviewStatus::Rejected)
            | (ReviewStatus::Rejected, ReviewStatus::Approved) => Ok(to),
            (from, to) => Err(AppError::Conflict(format!(
                "cannot moderate a review from {:?} to {:?}",
                from, to
            ))),
        }
    }
}

impl TryFrom<i16> for ReviewStatus {
    type Error = UnknownStatus;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ReviewStatus::Pending),
            1 => Ok(ReviewStatus::Approved),
            2 => Ok(ReviewStatus::Rejected),
            code => Err(UnknownStatus { kind: "review status", code }),
        }
    }
}

impl From<ReviewStatus> for i16 {
    fn from(s: ReviewStatus) -> Self {
        s as i16
    }
}

impl FromStr for ReviewStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(invalid_name("review status", s)),
        }
    }
}
