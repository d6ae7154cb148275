//! Fine accrual and settlement

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{action_types, entity_types, NewAuditEntry},
        enums::{FineStatus, ReturnCondition},
        fine::{Fine, FineSchedule, NewFine},
    },
    repository::{audit::AuditRepository, fines::FinesRepository, Repository},
};

async fn insert_fine(conn: &mut PgConnection, fine: &NewFine, actor: Option<i32>) -> AppResult<Fine> {
    let created = FinesRepository::insert(conn, fine).await?;
    AuditRepository::record(
        conn,
        &NewAuditEntry::new(
            actor,
            action_types::FINE_ACCRUE,
            entity_types::FINES,
            created.id,
            format!(
                "Fine of {} ({}) on borrowing {}",
                created.amount, created.reason, created.borrowing_id
            ),
        )
        .after(&created)?,
    )
    .await?;
    tracing::info!(
        "Fine {} accrued on borrowing {}: {} ({})",
        created.id, created.borrowing_id, created.amount, created.reason
    );
    Ok(created)
}

/// Charge `days_overdue` days at the daily rate. No fine when not late.
pub(crate) async fn accrue_overdue_fine(
    conn: &mut PgConnection,
    schedule: &FineSchedule,
    borrowing_id: i32,
    days_overdue: i64,
    actor: Option<i32>,
) -> AppResult<Option<Fine>> {
    match schedule.overdue_fine(borrowing_id, days_overdue) {
        Some(fine) => Ok(Some(insert_fine(conn, &fine, actor).await?)),
        None => Ok(None),
    }
}

/// Charge the damage or loss fee for a non-good return
pub(crate) async fn accrue_damage_fine(
    conn: &mut PgConnection,
    schedule: &FineSchedule,
    borrowing_id: i32,
    condition: ReturnCondition,
    replacement_cost: Option<Decimal>,
    actor: Option<i32>,
) -> AppResult<Option<Fine>> {
    match schedule.damage_fine(borrowing_id, condition, replacement_cost) {
        Some(fine) => Ok(Some(insert_fine(conn, &fine, actor).await?)),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
}

impl FinesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_fine(&self, id: i32) -> AppResult<Fine> {
        self.repository.fines.get_by_id(id).await
    }

    pub async fn list_user_fines(&self, user_id: i32) -> AppResult<Vec<Fine>> {
        self.repository.fines.list_for_user(user_id).await
    }

    pub async fn list_borrowing_fines(&self, borrowing_id: i32) -> AppResult<Vec<Fine>> {
        self.repository.fines.list_for_borrowing(borrowing_id).await
    }

    /// Sum of the user's accrued fines
    pub async fn total_unpaid(&self, user_id: i32) -> AppResult<Decimal> {
        self.repository.fines.total_unpaid(user_id).await
    }

    /// Settle an accrued fine as paid or waived
    pub async fn settle_fine(&self, fine_id: i32, status: FineStatus, staff_user_id: i32) -> AppResult<Fine> {
        self.settle_fine_at(fine_id, status, staff_user_id, Utc::now()).await
    }

    pub async fn settle_fine_at(
        &self,
        fine_id: i32,
        status: FineStatus,
        staff_user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Fine> {
        if status == FineStatus::Accrued {
            return Err(AppError::InvalidStatus(
                "a fine can only be settled as paid or waived".to_string(),
            ));
        }

        let mut tx = self.repository.begin().await?;

        let fine = FinesRepository::get_locked(&mut tx, fine_id).await?;
        if !fine.status.can_transition_to(status) {
            tracing::warn!("Fine {} already settled as {:?}", fine_id, fine.status);
            return Err(AppError::AlreadySettled(fine_id));
        }

        let paid_at = (status == FineStatus::Paid).then_some(now);
        let settled =
            FinesRepository::write_settlement(&mut tx, fine_id, status, paid_at, staff_user_id).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                Some(staff_user_id),
                action_types::FINE_SETTLE,
                entity_types::FINES,
                fine_id,
                format!("Fine {} settled as {:?}", fine_id, status),
            )
            .before(&fine)?
            .after(&settled)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Fine {} settled as {:?} by user {}", fine_id, status, staff_user_id);
        Ok(settled)
    }
}
