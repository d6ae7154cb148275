//! Inventory ledger: copy status and per-title availability counters

use sqlx::PgConnection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{action_types, entity_types, NewAuditEntry},
        enums::CopyStatus,
        inventory::{BookCopy, CreateTitle, Title},
    },
    repository::{audit::AuditRepository, inventory::InventoryRepository, Repository},
};

/// Move a locked copy to `to` and shift its title's available counter by the
/// matching delta, auditing both rows. Runs on the caller's transaction.
pub(crate) async fn move_copy(
    conn: &mut PgConnection,
    copy: &BookCopy,
    to: CopyStatus,
    actor: Option<i32>,
) -> AppResult<BookCopy> {
    let updated = InventoryRepository::write_copy_status(conn, copy.id, to).await?;

    AuditRepository::record(
        conn,
        &NewAuditEntry::new(
            actor,
            action_types::COPY_STATUS_CHANGE,
            entity_types::COPIES,
            copy.id,
            format!("Copy {} status {} -> {}", copy.id, copy.status, to),
        )
        .before(copy)?
        .after(&updated)?,
    )
    .await?;

    let delta = CopyStatus::availability_delta(copy.status, to);
    if delta != 0 {
        let before = InventoryRepository::get_title_locked(conn, copy.title_id).await?;
        let after = InventoryRepository::adjust_title_counters(conn, copy.title_id, 0, delta).await?;
        AuditRepository::record(
            conn,
            &NewAuditEntry::new(
                actor,
                action_types::TITLE_COUNTER_CHANGE,
                entity_types::TITLES,
                copy.title_id,
                format!("Available copies {:+} after copy {} became {}", delta, copy.id, to),
            )
            .before(&before)?
            .after(&after)?,
        )
        .await?;
    }

    Ok(updated)
}

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_title(&self, id: i32) -> AppResult<Title> {
        self.repository.inventory.get_title(id).await
    }

    pub async fn get_copy(&self, id: i32) -> AppResult<BookCopy> {
        self.repository.inventory.get_copy(id).await
    }

    pub async fn list_copies(&self, title_id: i32) -> AppResult<Vec<BookCopy>> {
        self.repository.inventory.get_title(title_id).await?;
        self.repository.inventory.list_copies(title_id).await
    }

    /// Create a catalog title with no copies
    pub async fn create_title(&self, title: CreateTitle, actor: Option<i32>) -> AppResult<Title> {
        title.validate()?;
        title.check_replacement_cost()?;

        let mut tx = self.repository.begin().await?;
        let created = InventoryRepository::insert_title(&mut tx, &title).await?;
        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::TITLE_CREATE,
                entity_types::TITLES,
                created.id,
                format!("Title '{}' created", created.title),
            )
            .after(&created)?,
        )
        .await?;
        tx.commit().await?;

        tracing::info!("Title {} created", created.id);
        Ok(created)
    }

    /// Add one Available copy to a title
    pub async fn add_copy(&self, title_id: i32, actor: Option<i32>) -> AppResult<BookCopy> {
        let mut tx = self.repository.begin().await?;

        let before = InventoryRepository::get_title_locked(&mut tx, title_id).await?;
        let copy = InventoryRepository::insert_copy(&mut tx, title_id).await?;
        let after = InventoryRepository::adjust_title_counters(&mut tx, title_id, 1, 1).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::COPY_CREATE,
                entity_types::COPIES,
                copy.id,
                format!("Copy {} added to title {}", copy.id, title_id),
            )
            .after(&copy)?,
        )
        .await?;
        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::TITLE_COUNTER_CHANGE,
                entity_types::TITLES,
                title_id,
                format!("Copy {} added", copy.id),
            )
            .before(&before)?
            .after(&after)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Copy {} added to title {}", copy.id, title_id);
        Ok(copy)
    }

    /// Staff status change on a copy.
    ///
    /// Borrowed is entered and left only through borrowings. Setting the
    /// current status again returns the copy unchanged.
    pub async fn set_copy_status(
        &self,
        copy_id: i32,
        status: CopyStatus,
        actor: Option<i32>,
    ) -> AppResult<BookCopy> {
        let mut tx = self.repository.begin().await?;

        let copy = InventoryRepository::get_copy_locked(&mut tx, copy_id).await?;
        CopyStatus::check_staff_transition(copy.status, status)?;
        if copy.status == status {
            return Ok(copy);
        }

        let updated = move_copy(&mut tx, &copy, status, actor).await?;
        tx.commit().await?;

        tracing::info!("Copy {} status {} -> {}", copy_id, copy.status, status);
        Ok(updated)
    }

    /// Soft delete a copy that is not on loan
    pub async fn soft_delete_copy(&self, copy_id: i32, actor: Option<i32>) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;

        let copy = InventoryRepository::get_copy_locked(&mut tx, copy_id).await?;
        if copy.status == CopyStatus::Borrowed {
            tracing::warn!("Refusing to delete borrowed copy {}", copy_id);
            return Err(AppError::Conflict(format!(
                "Copy {} is currently borrowed and cannot be deleted",
                copy_id
            )));
        }

        let deleted = InventoryRepository::mark_copy_deleted(&mut tx, copy_id).await?;
        let available_delta = if copy.status.is_available() { -1 } else { 0 };
        let before = InventoryRepository::get_title_locked(&mut tx, copy.title_id).await?;
        let after =
            InventoryRepository::adjust_title_counters(&mut tx, copy.title_id, -1, available_delta)
                .await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::COPY_SOFT_DELETE,
                entity_types::COPIES,
                copy_id,
                format!("Copy {} soft-deleted", copy_id),
            )
            .before(&copy)?
            .after(&deleted)?,
        )
        .await?;
        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::TITLE_COUNTER_CHANGE,
                entity_types::TITLES,
                copy.title_id,
                format!("Copy {} removed from stock", copy_id),
            )
            .before(&before)?
            .after(&after)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Copy {} soft-deleted", copy_id);
        Ok(())
    }

    /// Bulk stock correction on the title counters, independent of copy rows
    pub async fn adjust_stock(&self, title_id: i32, delta: i32, actor: Option<i32>) -> AppResult<Title> {
        if delta == 0 {
            return Err(AppError::Validation("Stock delta must not be zero".to_string()));
        }

        let mut tx = self.repository.begin().await?;

        let before = InventoryRepository::get_title_locked(&mut tx, title_id).await?;
        if before.counters_after(delta).is_none() {
            tracing::warn!(
                "Stock adjustment {:+} on title {} is out of range ({} available)",
                delta, title_id, before.available_copies
            );
            return Err(AppError::Conflict(format!(
                "Adjusting stock by {} would leave title {} with out-of-range copy counters",
                delta, title_id
            )));
        }

        let after = InventoryRepository::adjust_title_counters(&mut tx, title_id, delta, delta).await?;
        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::STOCK_ADJUST,
                entity_types::TITLES,
                title_id,
                format!("Stock adjusted by {:+}", delta),
            )
            .before(&before)?
            .after(&after)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Title {} stock adjusted by {:+}", title_id, delta);
        Ok(after)
    }
}
