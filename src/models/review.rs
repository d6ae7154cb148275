//! Review model, moderation and reporting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::ReviewStatus;
use crate::error::AppError;

pub const MIN_REVIEW_TEXT_LEN: usize = 10;
pub const MAX_REVIEW_TEXT_LEN: usize = 5000;

/// Review model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub title_id: i32,
    pub user_id: i32,
    pub rating: i16,
    pub text: String,
    #[sqlx(try_from = "i16")]
    pub status: ReviewStatus,
    pub reported: bool,
    pub report_reason: Option<String>,
    pub reported_by: Option<i32>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create review request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(custom(function = "validate_review_text"))]
    pub text: String,
}

/// Edit review request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,
    #[validate(custom(function = "validate_review_text"))]
    pub text: Option<String>,
}

/// Report review request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReportReview {
    #[validate(length(min = 1, max = 1000, message = "A report reason is required"))]
    pub reason: String,
}

/// Approved reviews of a title with their average rating
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TitleReviews {
    pub title_id: i32,
    pub average_rating: Option<Decimal>,
    pub count: i64,
    pub reviews: Vec<Review>,
}

fn validate_review_text(text: &str) -> Result<(), validator::ValidationError> {
    let len = text.trim().chars().count();
    if !(MIN_REVIEW_TEXT_LEN..=MAX_REVIEW_TEXT_LEN).contains(&len) {
        let mut err = validator::ValidationError::new("review_text_length");
        err.message = Some(
            format!(
                "Review text must be between {} and {} characters",
                MIN_REVIEW_TEXT_LEN, MAX_REVIEW_TEXT_LEN
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

impl UpdateReview {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.text.is_none()
    }
}

impl Review {
    pub fn ensure_owner(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id != user_id {
            return Err(AppError::Authorization(
                "Only the author may change this review".to_string(),
            ));
        }
        Ok(())
    }
}
