//! Fines repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::FineStatus,
        fine::{Fine, NewFine},
    },
};

const COLUMNS: &str = "\
    id, borrowing_id, amount, reason, description, status, days_overdue, \
    created_at, paid_at, settled_by";

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>(&format!("SELECT {COLUMNS} FROM fines WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// Fines charged on one borrowing
    pub async fn list_for_borrowing(&self, borrowing_id: i32) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(&format!(
            "SELECT {COLUMNS} FROM fines WHERE borrowing_id = $1 ORDER BY id"
        ))
        .bind(borrowing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fines)
    }

    /// All fines of a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT f.id, f.borrowing_id, f.amount, f.reason, f.description, f.status,
                   f.days_overdue, f.created_at, f.paid_at, f.settled_by
            FROM fines f
            JOIN borrowings b ON b.id = f.borrowing_id
            WHERE b.user_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fines)
    }

    /// Sum of accrued (unsettled) fines of a user
    pub async fn total_unpaid(&self, user_id: i32) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(f.amount), 0)
            FROM fines f
            JOIN borrowings b ON b.id = f.borrowing_id
            WHERE b.user_id = $1 AND f.status = $2
            "#,
        )
        .bind(user_id)
        .bind(i16::from(FineStatus::Accrued))
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Transaction steps
    // -----------------------------------------------------------------------

    pub async fn insert(conn: &mut PgConnection, fine: &NewFine) -> AppResult<Fine> {
        let row = sqlx::query_as::<_, Fine>(&format!(
            r#"
            INSERT INTO fines (borrowing_id, amount, reason, description, status, days_overdue)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(fine.borrowing_id)
        .bind(fine.amount)
        .bind(i16::from(fine.reason))
        .bind(&fine.description)
        .bind(i16::from(FineStatus::Accrued))
        .bind(fine.days_overdue)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn get_locked(conn: &mut PgConnection, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>(&format!("SELECT {COLUMNS} FROM fines WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// Move an accrued fine to a terminal status
    pub async fn write_settlement(
        conn: &mut PgConnection,
        id: i32,
        status: FineStatus,
        paid_at: Option<DateTime<Utc>>,
        settled_by: i32,
    ) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>(&format!(
            r#"
            UPDATE fines
            SET status = $2, paid_at = $3, settled_by = $4
            WHERE id = $1 AND status = $5
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(i16::from(status))
        .bind(paid_at)
        .bind(settled_by)
        .bind(i16::from(FineStatus::Accrued))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::AlreadySettled(id))
    }
}
