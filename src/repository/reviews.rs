//! Reviews repository for database operations

use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{enums::ReviewStatus, review::Review},
};

const COLUMNS: &str = "\
    id, title_id, user_id, rating, text, status, reported, report_reason, \
    reported_by, is_deleted, created_at, updated_at";

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a live review by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    pub async fn user_has_reviewed(&self, user_id: i32, title_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = $1 AND title_id = $2 AND NOT is_deleted)",
        )
        .bind(user_id)
        .bind(title_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Approved reviews of a title, newest first
    pub async fn list_approved(&self, title_id: i32) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {COLUMNS} FROM reviews
            WHERE title_id = $1 AND status = $2 AND NOT is_deleted
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(title_id)
        .bind(i16::from(ReviewStatus::Approved))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    /// Average rating of the approved reviews of a title
    pub async fn average_rating(&self, title_id: i32) -> AppResult<Option<Decimal>> {
        let avg: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT ROUND(AVG(rating)::numeric, 2)
            FROM reviews
            WHERE title_id = $1 AND status = $2 AND NOT is_deleted
            "#,
        )
        .bind(title_id)
        .bind(i16::from(ReviewStatus::Approved))
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }

    /// Moderation queue
    pub async fn list_by_status(&self, status: ReviewStatus) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE status = $1 AND NOT is_deleted ORDER BY created_at"
        ))
        .bind(i16::from(status))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn list_reported(&self) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE reported AND NOT is_deleted ORDER BY updated_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    // -----------------------------------------------------------------------
    // Transaction steps
    // -----------------------------------------------------------------------

    pub async fn insert(
        conn: &mut PgConnection,
        title_id: i32,
        user_id: i32,
        rating: i16,
        text: &str,
    ) -> AppResult<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (title_id, user_id, rating, text, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(title_id)
        .bind(user_id)
        .bind(rating)
        .bind(text)
        .bind(i16::from(ReviewStatus::Pending))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            // idx_reviews_user_title: a concurrent create got there first
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
                "User {} has already reviewed title {}",
                user_id, title_id
            )),
            other => AppError::Database(other),
        })?;
        Ok(row)
    }

    pub async fn get_locked(conn: &mut PgConnection, id: i32) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {COLUMNS} FROM reviews WHERE id = $1 AND NOT is_deleted FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// Replace rating and text; an edit always goes back to moderation
    pub async fn write_content(
        conn: &mut PgConnection,
        id: i32,
        rating: i16,
        text: &str,
    ) -> AppResult<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET rating = $2, text = $3, status = $4,
                reported = FALSE, report_reason = NULL, reported_by = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(rating)
        .bind(text)
        .bind(i16::from(ReviewStatus::Pending))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn write_status(
        conn: &mut PgConnection,
        id: i32,
        status: ReviewStatus,
    ) -> AppResult<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(i16::from(status))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn write_report(
        conn: &mut PgConnection,
        id: i32,
        reason: Option<&str>,
        reported_by: Option<i32>,
    ) -> AppResult<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE reviews
            SET reported = $2, report_reason = $3, reported_by = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reason.is_some())
        .bind(reason)
        .bind(reported_by)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn mark_deleted(conn: &mut PgConnection, id: i32) -> AppResult<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            "UPDATE reviews SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
