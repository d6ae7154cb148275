//! Repository layer for database operations

pub mod audit;
pub mod borrowings;
pub mod fines;
pub mod inventory;
pub mod reviews;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub inventory: inventory::InventoryRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub fines: fines::FinesRepository,
    pub reviews: reviews::ReviewsRepository,
    pub audit: audit::AuditRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            inventory: inventory::InventoryRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            pool,
        }
    }

    /// Start a transaction; dropping it without `commit` rolls back
    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
