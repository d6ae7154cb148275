//! Fine settlement against a real database

use rust_decimal_macros::dec;
use sqlx::PgPool;

use biblioteq_server::{
    error::AppError,
    models::{
        enums::{FineStatus, ReturnCondition},
        fine::Fine,
    },
    services::Services,
};

use crate::common::{day, seed_title, services, STAFF};

const READER: i32 = 11;

/// Borrow and return five days late, leaving one 10.00 fine
async fn late_fine(services: &Services) -> Fine {
    let (_, copies) = seed_title(services, 1).await;
    let borrowing = services
        .loans
        .issue_borrowing_at(READER, copies[0].id, Some(day(2024, 1, 15)), None, day(2024, 1, 1))
        .await
        .unwrap();
    let outcome = services
        .loans
        .return_borrowing_at(borrowing.id, ReturnCondition::Good, None, day(2024, 1, 20))
        .await
        .unwrap();
    outcome.fines.into_iter().next().unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn paying_twice_is_rejected_and_changes_nothing(pool: PgPool) {
    let services = services(pool);
    let fine = late_fine(&services).await;

    let paid = services
        .fines
        .settle_fine_at(fine.id, FineStatus::Paid, STAFF, day(2024, 2, 1))
        .await
        .unwrap();
    assert_eq!(paid.status, FineStatus::Paid);
    assert_eq!(paid.paid_at, Some(day(2024, 2, 1)));
    assert_eq!(paid.settled_by, Some(STAFF));

    let again = services
        .fines
        .settle_fine_at(fine.id, FineStatus::Waived, STAFF + 1, day(2024, 2, 2))
        .await;
    assert!(matches!(again, Err(AppError::AlreadySettled(id)) if id == fine.id));

    let stored = services.fines.get_fine(fine.id).await.unwrap();
    assert_eq!(stored.status, FineStatus::Paid);
    assert_eq!(stored.paid_at, Some(day(2024, 2, 1)));
    assert_eq!(stored.settled_by, Some(STAFF));
    assert_eq!(services.fines.total_unpaid(READER).await.unwrap(), dec!(0));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn waiving_clears_the_debt_without_payment_date(pool: PgPool) {
    let services = services(pool);
    let fine = late_fine(&services).await;
    assert_eq!(services.fines.total_unpaid(READER).await.unwrap(), dec!(10.00));

    let waived = services
        .fines
        .settle_fine(fine.id, FineStatus::Waived, STAFF)
        .await
        .unwrap();
    assert_eq!(waived.status, FineStatus::Waived);
    assert_eq!(waived.paid_at, None);
    assert_eq!(services.fines.total_unpaid(READER).await.unwrap(), dec!(0));
    assert_eq!(services.fines.list_user_fines(READER).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn settling_back_to_accrued_is_an_invalid_status(pool: PgPool) {
    let services = services(pool);
    let fine = late_fine(&services).await;

    let result = services.fines.settle_fine(fine.id, FineStatus::Accrued, STAFF).await;
    assert!(matches!(result, Err(AppError::InvalidStatus(_))));
    assert_eq!(
        services.fines.get_fine(fine.id).await.unwrap().status,
        FineStatus::Accrued
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unknown_fine_is_not_found(pool: PgPool) {
    let services = services(pool);
    let result = services.fines.settle_fine(12345, FineStatus::Paid, STAFF).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
