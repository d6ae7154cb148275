//! Titles and copies repository
//!
//! Functions taking a `&mut PgConnection` run inside the caller's
//! transaction; the `*_locked` readers take a row lock (`FOR UPDATE`).

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::CopyStatus,
        inventory::{BookCopy, CreateTitle, Title},
    },
};

const TITLE_COLUMNS: &str = "\
    id, title, author, isbn, replacement_cost, total_copies, available_copies, created_at";

const COPY_COLUMNS: &str = "id, title_id, status, is_deleted, created_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: Pool<Postgres>,
}

impl InventoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get title by ID
    pub async fn get_title(&self, id: i32) -> AppResult<Title> {
        sqlx::query_as::<_, Title>(&format!("SELECT {TITLE_COLUMNS} FROM titles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Title with id {} not found", id)))
    }

    /// Get a live (not soft-deleted) copy by ID
    pub async fn get_copy(&self, id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {COPY_COLUMNS} FROM copies WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    /// List live copies of a title
    pub async fn list_copies(&self, title_id: i32) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {COPY_COLUMNS} FROM copies WHERE title_id = $1 AND NOT is_deleted ORDER BY id"
        ))
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Count live copies of a title in the given status
    pub async fn count_copies_with_status(&self, title_id: i32, status: CopyStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM copies WHERE title_id = $1 AND status = $2 AND NOT is_deleted",
        )
        .bind(title_id)
        .bind(i16::from(status))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Transaction steps
    // -----------------------------------------------------------------------

    pub async fn insert_title(conn: &mut PgConnection, title: &CreateTitle) -> AppResult<Title> {
        let row = sqlx::query_as::<_, Title>(&format!(
            r#"
            INSERT INTO titles (title, author, isbn, replacement_cost)
            VALUES ($1, $2, $3, $4)
            RETURNING {TITLE_COLUMNS}
            "#
        ))
        .bind(title.title.trim())
        .bind(&title.author)
        .bind(&title.isbn)
        .bind(title.replacement_cost)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn insert_copy(conn: &mut PgConnection, title_id: i32) -> AppResult<BookCopy> {
        let row = sqlx::query_as::<_, BookCopy>(&format!(
            "INSERT INTO copies (title_id, status) VALUES ($1, $2) RETURNING {COPY_COLUMNS}"
        ))
        .bind(title_id)
        .bind(i16::from(CopyStatus::Available))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn get_title_locked(conn: &mut PgConnection, id: i32) -> AppResult<Title> {
        sqlx::query_as::<_, Title>(&format!(
            "SELECT {TITLE_COLUMNS} FROM titles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Title with id {} not found", id)))
    }

    /// Lock a live copy row; soft-deleted copies read as missing
    pub async fn get_copy_locked(conn: &mut PgConnection, id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {COPY_COLUMNS} FROM copies WHERE id = $1 AND NOT is_deleted FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    pub async fn write_copy_status(
        conn: &mut PgConnection,
        id: i32,
        status: CopyStatus,
    ) -> AppResult<BookCopy> {
        let row = sqlx::query_as::<_, BookCopy>(&format!(
            "UPDATE copies SET status = $2 WHERE id = $1 RETURNING {COPY_COLUMNS}"
        ))
        .bind(id)
        .bind(i16::from(status))
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn mark_copy_deleted(conn: &mut PgConnection, id: i32) -> AppResult<BookCopy> {
        let row = sqlx::query_as::<_, BookCopy>(&format!(
            "UPDATE copies SET is_deleted = TRUE WHERE id = $1 RETURNING {COPY_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Apply signed deltas to a title's counters.
    ///
    /// Counters are only ever written relative to their current value.
    pub async fn adjust_title_counters(
        conn: &mut PgConnection,
        title_id: i32,
        total_delta: i32,
        available_delta: i32,
    ) -> AppResult<Title> {
        sqlx::query_as::<_, Title>(&format!(
            r#"
            UPDATE titles
            SET total_copies = total_copies + $2,
                available_copies = available_copies + $3
            WHERE id = $1
            RETURNING {TITLE_COLUMNS}
            "#
        ))
        .bind(title_id)
        .bind(total_delta)
        .bind(available_delta)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Title with id {} not found", title_id)))
    }
}
