//! Borrowings repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{borrowing::Borrowing, enums::BorrowingStatus},
};

const COLUMNS: &str = "\
    id, user_id, copy_id, borrow_date, due_date, return_date, extension_count, status";

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!("SELECT {COLUMNS} FROM borrowings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get borrowings for a user, newest first
    pub async fn list_for_user(&self, user_id: i32, open_only: bool) -> AppResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            SELECT {COLUMNS} FROM borrowings
            WHERE user_id = $1 AND ($2 = FALSE OR status <> $3)
            ORDER BY borrow_date DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(open_only)
        .bind(i16::from(BorrowingStatus::Returned))
        .fetch_all(&self.pool)
        .await?;
        Ok(borrowings)
    }

    /// Open borrowings past their due date at `now`
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            SELECT {COLUMNS} FROM borrowings
            WHERE status <> $1
              AND (due_date AT TIME ZONE 'UTC')::date < ($2 AT TIME ZONE 'UTC')::date
            ORDER BY due_date
            "#
        ))
        .bind(i16::from(BorrowingStatus::Returned))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(borrowings)
    }

    /// Count open borrowings referencing a copy
    pub async fn count_open_for_copy(&self, copy_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE copy_id = $1 AND status <> $2",
        )
        .bind(copy_id)
        .bind(i16::from(BorrowingStatus::Returned))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Transaction steps
    // -----------------------------------------------------------------------

    pub async fn insert(
        conn: &mut PgConnection,
        user_id: i32,
        copy_id: i32,
        borrow_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        let row = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            INSERT INTO borrowings (user_id, copy_id, borrow_date, due_date, extension_count, status)
            VALUES ($1, $2, $3, $4, 0, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(copy_id)
        .bind(borrow_date)
        .bind(due_date)
        .bind(i16::from(BorrowingStatus::Active))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock the borrowing row for the rest of the transaction
    pub async fn get_locked(conn: &mut PgConnection, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            "SELECT {COLUMNS} FROM borrowings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    pub async fn write_extension(
        conn: &mut PgConnection,
        id: i32,
        new_due_date: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            UPDATE borrowings
            SET due_date = $2, extension_count = extension_count + 1
            WHERE id = $1 AND status <> $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_due_date)
        .bind(i16::from(BorrowingStatus::Returned))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::AlreadyReturned(id))
    }

    /// Close the borrowing. The status guard makes this a compare-and-set.
    pub async fn mark_returned(
        conn: &mut PgConnection,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            UPDATE borrowings
            SET status = $2, return_date = $3
            WHERE id = $1 AND status <> $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(i16::from(BorrowingStatus::Returned))
        .bind(returned_at)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::AlreadyReturned(id))
    }
}
