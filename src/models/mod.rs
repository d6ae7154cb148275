//! Data models for the lending core

pub mod audit;
pub mod borrowing;
pub mod enums;
pub mod fine;
pub mod inventory;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use audit::{AuditLogEntry, AuditQuery, NewAuditEntry};
pub use borrowing::{Borrowing, BorrowingDetails, ReturnOutcome};
pub use enums::{BorrowingStatus, CopyStatus, FineReason, FineStatus, ReturnCondition, ReviewStatus};
pub use fine::{Fine, FineSchedule, NewFine};
pub use inventory::{BookCopy, Title};
pub use review::Review;
pub use user::{Role, UserClaims};
