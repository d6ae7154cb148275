//! Borrowing lifecycle against a real database

use chrono::Duration;
use rust_decimal_macros::dec;
use sqlx::PgPool;

use biblioteq_server::{
    config::LendingConfig,
    error::AppError,
    models::{
        audit::{action_types, entity_types, AuditQuery},
        enums::{BorrowingStatus, CopyStatus, FineReason, ReturnCondition},
    },
};

use crate::common::{day, seed_title, services, services_with, STAFF};

const READER: i32 = 42;

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn late_return_charges_five_days_and_restores_availability(pool: PgPool) {
    let services = services(pool);
    let (title, copies) = seed_title(&services, 3).await;
    assert_eq!(title.available_copies, 3);

    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 15)), Some(STAFF), day(2024, 1, 1))
        .await
        .unwrap();
    assert_eq!(borrowing.status, BorrowingStatus::Active);

    let title_on_loan = services.inventory.get_title(title.id).await.unwrap();
    assert_eq!(title_on_loan.available_copies, 2);
    assert_eq!(
        services.inventory.get_copy(copies[0].id).await.unwrap().status,
        CopyStatus::Borrowed
    );

    let outcome = services
        .loans
        .return_borrowing_at(borrowing.id, ReturnCondition::Good, Some(STAFF), day(2024, 1, 20))
        .await
        .unwrap();

    assert_eq!(outcome.borrowing.status, BorrowingStatus::Returned);
    assert_eq!(outcome.borrowing.return_date, Some(day(2024, 1, 20)));
    assert_eq!(outcome.copy_status, CopyStatus::Available);
    assert_eq!(outcome.fines.len(), 1);
    assert_eq!(outcome.fines[0].amount, dec!(10.00));
    assert_eq!(outcome.fines[0].reason, FineReason::Overdue);
    assert_eq!(outcome.fines[0].days_overdue, 5);

    let title_after = services.inventory.get_title(title.id).await.unwrap();
    assert_eq!(title_after.available_copies, 3);
    assert_eq!(title_after.total_copies, 3);
    assert_eq!(services.fines.total_unpaid(READER).await.unwrap(), dec!(10.00));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn return_on_due_day_is_free_and_one_day_late_costs_one_rate(pool: PgPool) {
    let services = services(pool);
    let (_, copies) = seed_title(&services, 2).await;

    let on_time = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 3, 10)), None, day(2024, 3, 1))
        .await
        .unwrap();
    let outcome = services
        .loans
        .return_borrowing_at(on_time.id, ReturnCondition::Good, None, day(2024, 3, 10) + Duration::hours(18))
        .await
        .unwrap();
    assert!(outcome.fines.is_empty());

    let late = services
        .loans
        .issue_borrowing_at(READER, copies[1].id, Some(day(2024, 3, 10)), None, day(2024, 3, 1))
        .await
        .unwrap();
    let outcome = services
        .loans
        .return_borrowing_at(late.id, ReturnCondition::Good, None, day(2024, 3, 11))
        .await
        .unwrap();
    assert_eq!(outcome.fines.len(), 1);
    assert_eq!(outcome.fines[0].amount, dec!(2.00));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_returns_close_the_borrowing_once(pool: PgPool) {
    let services = services(pool);
    let (title, copies) = seed_title(&services, 1).await;

    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 15)), None, day(2024, 1, 1))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        services
            .loans
            .return_borrowing_at(borrowing.id, ReturnCondition::Good, None, day(2024, 1, 20)),
        services
            .loans
            .return_borrowing_at(borrowing.id, ReturnCondition::Good, None, day(2024, 1, 20)),
    );

    let results = [first, second];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let already_returned = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::AlreadyReturned(id)) if *id == borrowing.id))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(already_returned, 1);

    let fines = services.fines.list_borrowing_fines(borrowing.id).await.unwrap();
    assert_eq!(fines.len(), 1);
    assert_eq!(services.inventory.get_title(title.id).await.unwrap().available_copies, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn borrowed_copy_cannot_be_issued_again(pool: PgPool) {
    let services = services(pool);
    let (title, copies) = seed_title(&services, 1).await;

    services
        .loans
        .issue_borrowing(READER, copies[0].id, None, None)
        .await
        .unwrap();
    let second = services.loans.issue_borrowing(READER + 1, copies[0].id, None, None).await;

    assert!(matches!(second, Err(AppError::CopyUnavailable(_))));
    assert_eq!(
        services.repository.borrowings.count_open_for_copy(copies[0].id).await.unwrap(),
        1
    );
    assert_eq!(services.inventory.get_title(title.id).await.unwrap().available_copies, 0);
    assert_eq!(
        services.loans.list_user_borrowings(READER + 1, true).await.unwrap().len(),
        0
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn due_date_in_the_past_is_rejected(pool: PgPool) {
    let services = services(pool);
    let (_, copies) = seed_title(&services, 1).await;

    let result = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 1)), None, day(2024, 2, 1))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(
        services.inventory.get_copy(copies[0].id).await.unwrap().status,
        CopyStatus::Available
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn extension_moves_the_current_due_date_up_to_the_cap(pool: PgPool) {
    let lending = LendingConfig {
        max_extensions: Some(1),
        ..LendingConfig::default()
    };
    let services = services_with(pool, lending);
    let (_, copies) = seed_title(&services, 1).await;

    let now = chrono::Utc::now();
    let due = now + Duration::days(10);
    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(due), None, now)
        .await
        .unwrap();

    let extended = services
        .loans
        .extend_borrowing(borrowing.id, Some(7), Some(READER))
        .await
        .unwrap();
    assert_eq!(extended.due_date, borrowing.due_date + Duration::days(7));
    assert_eq!(extended.extension_count, 1);

    let capped = services.loans.extend_borrowing(borrowing.id, Some(7), Some(READER)).await;
    assert!(matches!(capped, Err(AppError::Conflict(_))));

    let invalid = services.loans.extend_borrowing(borrowing.id, Some(0), Some(READER)).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unrepresentable_extension_is_rejected_without_change(pool: PgPool) {
    let services = services(pool);
    let (_, copies) = seed_title(&services, 1).await;

    let borrowing = services
        .loans
        .issue_borrowing(READER, copies[0].id, None, None)
        .await
        .unwrap();

    for days in [i64::MAX, 100_000_000] {
        let result = services.loans.extend_borrowing(borrowing.id, Some(days), Some(READER)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    let stored = services.loans.get_borrowing(borrowing.id).await.unwrap();
    assert_eq!(stored.borrowing.due_date, borrowing.due_date);
    assert_eq!(stored.borrowing.extension_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn returned_borrowing_cannot_be_extended(pool: PgPool) {
    let services = services(pool);
    let (_, copies) = seed_title(&services, 1).await;

    let borrowing = services
        .loans
        .issue_borrowing(READER, copies[0].id, None, None)
        .await
        .unwrap();
    services
        .loans
        .return_borrowing(borrowing.id, ReturnCondition::Good, None)
        .await
        .unwrap();

    let result = services.loans.extend_borrowing(borrowing.id, None, None).await;
    assert!(matches!(result, Err(AppError::AlreadyReturned(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn damaged_return_charges_fee_and_keeps_copy_out_of_circulation(pool: PgPool) {
    let services = services(pool);
    let (title, copies) = seed_title(&services, 2).await;

    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 5, 20)), None, day(2024, 5, 1))
        .await
        .unwrap();
    let outcome = services
        .loans
        .return_borrowing_at(borrowing.id, ReturnCondition::Damaged, Some(STAFF), day(2024, 5, 10))
        .await
        .unwrap();

    assert_eq!(outcome.copy_status, CopyStatus::Damaged);
    assert_eq!(outcome.fines.len(), 1);
    assert_eq!(outcome.fines[0].reason, FineReason::Damaged);
    assert_eq!(outcome.fines[0].amount, dec!(15.00));

    let title = services.inventory.get_title(title.id).await.unwrap();
    assert_eq!(title.available_copies, 1);
    assert_eq!(title.total_copies, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn force_return_marks_copy_lost_with_overdue_and_loss_fines(pool: PgPool) {
    let services = services(pool);
    let (title, copies) = seed_title(&services, 1).await;

    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 15)), None, day(2024, 1, 1))
        .await
        .unwrap();
    let outcome = services
        .loans
        .force_return_at(borrowing.id, STAFF, day(2024, 1, 18))
        .await
        .unwrap();

    assert_eq!(outcome.copy_status, CopyStatus::Lost);
    let mut reasons: Vec<_> = outcome.fines.iter().map(|f| (f.reason, f.amount)).collect();
    reasons.sort_by_key(|(reason, _)| i16::from(*reason));
    assert_eq!(
        reasons,
        vec![(FineReason::Overdue, dec!(6.00)), (FineReason::Lost, dec!(50.00))]
    );
    assert_eq!(services.fines.total_unpaid(READER).await.unwrap(), dec!(56.00));
    assert_eq!(services.inventory.get_title(title.id).await.unwrap().available_copies, 0);

    let entries = services
        .audit
        .query_audit_log(&AuditQuery {
            entity_type: Some(entity_types::BORROWINGS.to_string()),
            entity_id: Some(borrowing.id),
            ..AuditQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(entries[0].action_type, action_types::BORROWING_FORCE_RETURN);
    assert_eq!(entries[0].actor_user_id, Some(STAFF));
    assert_eq!(entries.last().map(|e| e.action_type.as_str()), Some(action_types::BORROWING_ISSUE));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unpaid_fines_above_threshold_block_new_loans(pool: PgPool) {
    let lending = LendingConfig {
        max_unpaid_fines: Some(dec!(5.00)),
        ..LendingConfig::default()
    };
    let services = services_with(pool, lending);
    let (_, copies) = seed_title(&services, 2).await;

    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 15)), None, day(2024, 1, 1))
        .await
        .unwrap();
    services
        .loans
        .return_borrowing_at(borrowing.id, ReturnCondition::Good, None, day(2024, 1, 20))
        .await
        .unwrap();

    let refused = services.loans.issue_borrowing(READER, copies[1].id, None, None).await;
    assert!(matches!(refused, Err(AppError::UserIneligible(_))));
    assert_eq!(
        services.inventory.get_copy(copies[1].id).await.unwrap().status,
        CopyStatus::Available
    );

    // Another reader with no fines is unaffected
    services
        .loans
        .issue_borrowing(READER + 1, copies[1].id, None, None)
        .await
        .unwrap();
}
