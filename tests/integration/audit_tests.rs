//! A failing audit write aborts the whole operation

use rust_decimal_macros::dec;
use sqlx::PgPool;

use biblioteq_server::{
    error::AppError,
    models::enums::{CopyStatus, FineStatus, ReturnCondition},
};

use crate::common::{day, seed_title, services, STAFF};

const FINED_READER: i32 = 31;
const READER: i32 = 32;

/// Every later insert into audit_logs raises
async fn break_audit_log(pool: &PgPool) {
    sqlx::query(
        r#"
        CREATE FUNCTION reject_audit_insert() RETURNS trigger AS $$
        BEGIN
            RAISE EXCEPTION 'audit log unavailable';
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER audit_logs_reject_insert BEFORE INSERT ON audit_logs \
         FOR EACH ROW EXECUTE FUNCTION reject_audit_insert()",
    )
    .execute(pool)
    .await
    .unwrap();
}

async fn borrowing_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM borrowings")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn audit_failure_rolls_back_issue_extend_and_settle(pool: PgPool) {
    let services = services(pool.clone());
    let (title, copies) = seed_title(&services, 3).await;

    let late = services
        .loans
        .issue_borrowing_at(FINED_READER, copies[0].id, Some(day(2024, 1, 15)), None, day(2024, 1, 1))
        .await
        .unwrap();
    let fine = services
        .loans
        .return_borrowing_at(late.id, ReturnCondition::Good, None, day(2024, 1, 20))
        .await
        .unwrap()
        .fines
        .into_iter()
        .next()
        .unwrap();
    let now = chrono::Utc::now();
    let open = services
        .loans
        .issue_borrowing_at(READER, copies[1].id, Some(now + chrono::Duration::days(10)), None, now)
        .await
        .unwrap();

    let before = services.inventory.get_title(title.id).await.unwrap();
    let rows_before = borrowing_rows(&pool).await;
    break_audit_log(&pool).await;

    let issued = services
        .loans
        .issue_borrowing(READER, copies[2].id, None, Some(STAFF))
        .await;
    assert!(matches!(issued, Err(AppError::Database(_))));

    let extended = services.loans.extend_borrowing(open.id, Some(7), Some(READER)).await;
    assert!(matches!(extended, Err(AppError::Database(_))));

    let settled = services
        .fines
        .settle_fine_at(fine.id, FineStatus::Paid, STAFF, day(2024, 2, 1))
        .await;
    assert!(matches!(settled, Err(AppError::Database(_))));

    assert_eq!(
        services.inventory.get_copy(copies[2].id).await.unwrap().status,
        CopyStatus::Available
    );
    let after = services.inventory.get_title(title.id).await.unwrap();
    assert_eq!(after.available_copies, before.available_copies);
    assert_eq!(after.total_copies, before.total_copies);
    assert_eq!(borrowing_rows(&pool).await, rows_before);
    assert_eq!(
        services.repository.borrowings.count_open_for_copy(copies[2].id).await.unwrap(),
        0
    );

    let unchanged = services.loans.get_borrowing(open.id).await.unwrap();
    assert_eq!(unchanged.borrowing.due_date, open.due_date);
    assert_eq!(unchanged.borrowing.extension_count, 0);

    let stored = services.fines.get_fine(fine.id).await.unwrap();
    assert_eq!(stored.status, FineStatus::Accrued);
    assert_eq!(stored.paid_at, None);
    assert_eq!(stored.settled_by, None);
    assert_eq!(services.fines.total_unpaid(FINED_READER).await.unwrap(), dec!(10.00));
}
