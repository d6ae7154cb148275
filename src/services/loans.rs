//! Borrowing state machine: issue, extend, return, force return

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        audit::{action_types, entity_types, NewAuditEntry},
        borrowing::{Borrowing, BorrowingDetails, ReturnOutcome},
        enums::{CopyStatus, ReturnCondition},
        fine::FineSchedule,
    },
    repository::{
        audit::AuditRepository, borrowings::BorrowingsRepository, inventory::InventoryRepository,
        Repository,
    },
};

use super::{
    eligibility::EligibilityPolicy,
    fines::{accrue_damage_fine, accrue_overdue_fine},
    inventory::move_copy,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    lending: LendingConfig,
    schedule: FineSchedule,
    policy: Arc<dyn EligibilityPolicy>,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        lending: LendingConfig,
        policy: Arc<dyn EligibilityPolicy>,
    ) -> Self {
        let schedule = FineSchedule::from(&lending);
        Self {
            repository,
            lending,
            schedule,
            policy,
        }
    }

    pub async fn get_borrowing(&self, id: i32) -> AppResult<BorrowingDetails> {
        let borrowing = self.repository.borrowings.get_by_id(id).await?;
        Ok(BorrowingDetails::at(borrowing, Utc::now()))
    }

    /// Get borrowings for a user
    pub async fn list_user_borrowings(&self, user_id: i32, open_only: bool) -> AppResult<Vec<BorrowingDetails>> {
        let now = Utc::now();
        let borrowings = self.repository.borrowings.list_for_user(user_id, open_only).await?;
        Ok(borrowings.into_iter().map(|b| BorrowingDetails::at(b, now)).collect())
    }

    /// Open borrowings past due
    pub async fn list_overdue(&self) -> AppResult<Vec<BorrowingDetails>> {
        let now = Utc::now();
        let borrowings = self.repository.borrowings.list_overdue(now).await?;
        Ok(borrowings.into_iter().map(|b| BorrowingDetails::at(b, now)).collect())
    }

    /// Issue a loan of an Available copy
    pub async fn issue_borrowing(
        &self,
        user_id: i32,
        copy_id: i32,
        due_date: Option<DateTime<Utc>>,
        actor: Option<i32>,
    ) -> AppResult<Borrowing> {
        self.issue_borrowing_at(user_id, copy_id, due_date, actor, Utc::now()).await
    }

    pub async fn issue_borrowing_at(
        &self,
        user_id: i32,
        copy_id: i32,
        due_date: Option<DateTime<Utc>>,
        actor: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        let due_date = due_date.unwrap_or_else(|| now + Duration::days(self.lending.default_loan_days));
        if due_date < now {
            return Err(AppError::Validation("Due date must not be in the past".to_string()));
        }

        let unpaid = self.repository.fines.total_unpaid(user_id).await?;
        if let Err(e) = self.policy.check(user_id, unpaid) {
            tracing::warn!("User {} refused a loan: {}", user_id, e);
            return Err(e);
        }

        let mut tx = self.repository.begin().await?;

        let copy = InventoryRepository::get_copy_locked(&mut tx, copy_id).await?;
        if copy.status != CopyStatus::Available {
            tracing::warn!("Copy {} is {} and cannot be issued", copy_id, copy.status);
            return Err(AppError::CopyUnavailable(format!(
                "Copy {} is {}",
                copy_id, copy.status
            )));
        }

        let borrowing = BorrowingsRepository::insert(&mut tx, user_id, copy_id, now, due_date).await?;
        move_copy(&mut tx, &copy, CopyStatus::Borrowed, actor).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::BORROWING_ISSUE,
                entity_types::BORROWINGS,
                borrowing.id,
                format!("Copy {} issued to user {}", copy_id, user_id),
            )
            .after(&borrowing)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!(
            "Borrowing {} issued: copy {} to user {}, due {}",
            borrowing.id, copy_id, user_id, borrowing.due_date
        );
        Ok(borrowing)
    }

    /// Push the due date back by `extension_days` (default from config)
    pub async fn extend_borrowing(
        &self,
        borrowing_id: i32,
        extension_days: Option<i64>,
        actor: Option<i32>,
    ) -> AppResult<Borrowing> {
        let days = extension_days.unwrap_or(self.lending.default_extension_days);
        if days <= 0 {
            return Err(AppError::Validation("Extension days must be positive".to_string()));
        }

        let mut tx = self.repository.begin().await?;

        let borrowing = BorrowingsRepository::get_locked(&mut tx, borrowing_id).await?;
        if !borrowing.is_open() {
            return Err(AppError::AlreadyReturned(borrowing_id));
        }
        if let Some(max) = self.lending.max_extensions {
            if borrowing.extension_count >= max {
                tracing::warn!("Borrowing {} reached {} extensions", borrowing_id, max);
                return Err(AppError::Conflict(format!(
                    "Maximum extensions reached ({}/{})",
                    borrowing.extension_count, max
                )));
            }
        }

        let new_due = borrowing
            .extended_due_date(days)
            .ok_or_else(|| AppError::Validation(format!("Extension of {} days is out of range", days)))?;
        let extended = BorrowingsRepository::write_extension(&mut tx, borrowing_id, new_due).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action_types::BORROWING_EXTEND,
                entity_types::BORROWINGS,
                borrowing_id,
                format!("Borrowing {} extended by {} day(s)", borrowing_id, days),
            )
            .before(&borrowing)?
            .after(&extended)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Borrowing {} extended to {}", borrowing_id, extended.due_date);
        Ok(extended)
    }

    /// Close a borrowing and charge any overdue or damage fines
    pub async fn return_borrowing(
        &self,
        borrowing_id: i32,
        condition: ReturnCondition,
        actor: Option<i32>,
    ) -> AppResult<ReturnOutcome> {
        self.close_borrowing(borrowing_id, condition, actor, action_types::BORROWING_RETURN, Utc::now())
            .await
    }

    pub async fn return_borrowing_at(
        &self,
        borrowing_id: i32,
        condition: ReturnCondition,
        actor: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome> {
        self.close_borrowing(borrowing_id, condition, actor, action_types::BORROWING_RETURN, now)
            .await
    }

    /// Staff override for unrecoverable copies: a return with condition Lost
    pub async fn force_return(&self, borrowing_id: i32, staff_user_id: i32) -> AppResult<ReturnOutcome> {
        self.force_return_at(borrowing_id, staff_user_id, Utc::now()).await
    }

    pub async fn force_return_at(
        &self,
        borrowing_id: i32,
        staff_user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome> {
        self.close_borrowing(
            borrowing_id,
            ReturnCondition::Lost,
            Some(staff_user_id),
            action_types::BORROWING_FORCE_RETURN,
            now,
        )
        .await
    }

    async fn close_borrowing(
        &self,
        borrowing_id: i32,
        condition: ReturnCondition,
        actor: Option<i32>,
        action: &'static str,
        now: DateTime<Utc>,
    ) -> AppResult<ReturnOutcome> {
        let mut tx = self.repository.begin().await?;

        // The row lock serializes concurrent returns and extensions
        let borrowing = BorrowingsRepository::get_locked(&mut tx, borrowing_id).await?;
        if !borrowing.is_open() {
            tracing::warn!("Borrowing {} already returned", borrowing_id);
            return Err(AppError::AlreadyReturned(borrowing_id));
        }

        let returned = BorrowingsRepository::mark_returned(&mut tx, borrowing_id, now).await?;

        let copy = InventoryRepository::get_copy_locked(&mut tx, borrowing.copy_id).await?;
        let copy = move_copy(&mut tx, &copy, condition.copy_status(), actor).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                actor,
                action,
                entity_types::BORROWINGS,
                borrowing_id,
                format!("Borrowing {} returned ({:?})", borrowing_id, condition),
            )
            .before(&borrowing)?
            .after(&returned)?,
        )
        .await?;

        let mut fines = Vec::new();
        let days_overdue = borrowing.days_overdue(now);
        if let Some(fine) =
            accrue_overdue_fine(&mut tx, &self.schedule, borrowing_id, days_overdue, actor).await?
        {
            fines.push(fine);
        }
        if condition != ReturnCondition::Good {
            let title = InventoryRepository::get_title_locked(&mut tx, copy.title_id).await?;
            if let Some(fine) = accrue_damage_fine(
                &mut tx,
                &self.schedule,
                borrowing_id,
                condition,
                title.replacement_cost,
                actor,
            )
            .await?
            {
                fines.push(fine);
            }
        }

        tx.commit().await?;
        tracing::info!(
            "Borrowing {} closed ({:?}), copy {} now {}, {} fine(s)",
            borrowing_id, condition, copy.id, copy.status, fines.len()
        );

        Ok(ReturnOutcome {
            borrowing: returned,
            copy_status: copy.status,
            fines,
        })
    }
}
