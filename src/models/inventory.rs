//! Title and copy models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::CopyStatus;

/// Catalog title with its copy counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Title {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// Charged instead of the flat lost fee when a copy is lost
    pub replacement_cost: Option<Decimal>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
}

impl Title {
    /// Counters `(total, available)` after shifting both by `delta`, or
    /// `None` if either would overflow or go negative
    pub fn counters_after(&self, delta: i32) -> Option<(i32, i32)> {
        let total = self.total_copies.checked_add(delta)?;
        let available = self.available_copies.checked_add(delta)?;
        (total >= 0 && available >= 0).then_some((total, available))
    }
}

/// One physical or e-book copy of a title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    pub title_id: i32,
    #[sqlx(try_from = "i16")]
    pub status: CopyStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Create title request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTitle {
    #[validate(length(min = 1, max = 500, message = "Title must not be empty"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    pub replacement_cost: Option<Decimal>,
}

impl CreateTitle {
    pub fn check_replacement_cost(&self) -> Result<(), crate::error::AppError> {
        match self.replacement_cost {
            Some(cost) if cost.is_sign_negative() => Err(crate::error::AppError::Validation(
                "replacement_cost must not be negative".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
