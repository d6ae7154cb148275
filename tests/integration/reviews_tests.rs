//! Review moderation against a real database

use rust_decimal_macros::dec;
use sqlx::PgPool;

use biblioteq_server::{
    error::AppError,
    models::{
        enums::ReviewStatus,
        review::{CreateReview, ReportReview, UpdateReview},
    },
    repository::reviews::ReviewsRepository,
};

use crate::common::{seed_title, services, STAFF};

const AUTHOR: i32 = 21;
const OTHER: i32 = 22;

fn review(rating: i16) -> CreateReview {
    CreateReview {
        rating,
        text: "  A slow start but a wonderful mystery.  ".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn only_approved_reviews_are_listed(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;

    let first = services.reviews.create_review(title.id, AUTHOR, review(4)).await.unwrap();
    assert_eq!(first.status, ReviewStatus::Pending);
    assert_eq!(first.text, "A slow start but a wonderful mystery.");
    let second = services.reviews.create_review(title.id, OTHER, review(2)).await.unwrap();

    assert_eq!(services.reviews.list_for_title(title.id).await.unwrap().count, 0);
    assert_eq!(services.reviews.list_pending().await.unwrap().len(), 2);

    services
        .reviews
        .moderate_review(first.id, ReviewStatus::Approved, STAFF)
        .await
        .unwrap();
    services
        .reviews
        .moderate_review(second.id, ReviewStatus::Rejected, STAFF)
        .await
        .unwrap();

    let listed = services.reviews.list_for_title(title.id).await.unwrap();
    assert_eq!(listed.count, 1);
    assert_eq!(listed.reviews[0].id, first.id);
    assert_eq!(listed.average_rating, Some(dec!(4)));

    let back_to_pending = services
        .reviews
        .moderate_review(first.id, ReviewStatus::Pending, STAFF)
        .await;
    assert!(matches!(back_to_pending, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn one_review_per_user_and_title(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;

    services.reviews.create_review(title.id, AUTHOR, review(5)).await.unwrap();
    let duplicate = services.reviews.create_review(title.id, AUTHOR, review(3)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let short = services
        .reviews
        .create_review(
            title.id,
            OTHER,
            CreateReview {
                rating: 3,
                text: "   meh    ".to_string(),
            },
        )
        .await;
    assert!(matches!(short, Err(AppError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_insert_past_the_precheck_is_a_conflict(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;

    let mut tx = services.repository.begin().await.unwrap();
    ReviewsRepository::insert(&mut tx, title.id, AUTHOR, 4, "First impressions were good.")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = services.repository.begin().await.unwrap();
    let second = ReviewsRepository::insert(&mut tx, title.id, AUTHOR, 2, "Changed my mind later on.").await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    drop(tx);

    assert!(services.repository.reviews.user_has_reviewed(AUTHOR, title.id).await.unwrap());
    assert_eq!(services.reviews.list_pending().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_creates_leave_one_review(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;

    let (first, second) = tokio::join!(
        services.reviews.create_review(title.id, AUTHOR, review(5)),
        services.reviews.create_review(title.id, AUTHOR, review(1)),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count(),
        1
    );
    assert_eq!(services.reviews.list_pending().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn owner_edit_sends_review_back_to_moderation(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;

    let created = services.reviews.create_review(title.id, AUTHOR, review(4)).await.unwrap();
    services
        .reviews
        .moderate_review(created.id, ReviewStatus::Approved, STAFF)
        .await
        .unwrap();

    let edit = UpdateReview {
        rating: Some(5),
        text: None,
    };
    let not_owner = services.reviews.edit_review(created.id, OTHER, edit.clone()).await;
    assert!(matches!(not_owner, Err(AppError::Authorization(_))));

    let edited = services.reviews.edit_review(created.id, AUTHOR, edit).await.unwrap();
    assert_eq!(edited.rating, 5);
    assert_eq!(edited.text, created.text);
    assert_eq!(edited.status, ReviewStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reports_are_raised_by_others_and_cleared_by_staff(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;
    let created = services.reviews.create_review(title.id, AUTHOR, review(1)).await.unwrap();

    let own = services
        .reviews
        .report_review(created.id, AUTHOR, ReportReview { reason: "spam".to_string() })
        .await;
    assert!(matches!(own, Err(AppError::Conflict(_))));

    let reported = services
        .reviews
        .report_review(created.id, OTHER, ReportReview { reason: "spoilers".to_string() })
        .await
        .unwrap();
    assert!(reported.reported);
    assert_eq!(reported.reported_by, Some(OTHER));
    assert_eq!(services.reviews.list_reported().await.unwrap().len(), 1);

    let cleared = services.reviews.clear_report(created.id, STAFF).await.unwrap();
    assert!(!cleared.reported);
    assert_eq!(cleared.report_reason, None);
    assert!(services.reviews.list_reported().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deleted_review_frees_the_slot(pool: PgPool) {
    let services = services(pool);
    let (title, _) = seed_title(&services, 1).await;
    let created = services.reviews.create_review(title.id, AUTHOR, review(3)).await.unwrap();

    let stranger = services.reviews.delete_review(created.id, OTHER, false).await;
    assert!(matches!(stranger, Err(AppError::Authorization(_))));

    services.reviews.delete_review(created.id, STAFF, true).await.unwrap();
    assert!(matches!(
        services.reviews.get_review(created.id).await,
        Err(AppError::NotFound(_))
    ));

    services.reviews.create_review(title.id, AUTHOR, review(4)).await.unwrap();
}
