//! Reviews with moderation and reporting

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{action_types, entity_types, NewAuditEntry},
        enums::ReviewStatus,
        review::{CreateReview, ReportReview, Review, TitleReviews, UpdateReview},
    },
    repository::{audit::AuditRepository, reviews::ReviewsRepository, Repository},
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_review(&self, id: i32) -> AppResult<Review> {
        self.repository.reviews.get_by_id(id).await
    }

    /// Approved reviews of a title with the average rating
    pub async fn list_for_title(&self, title_id: i32) -> AppResult<TitleReviews> {
        self.repository.inventory.get_title(title_id).await?;
        let reviews = self.repository.reviews.list_approved(title_id).await?;
        let average_rating = self.repository.reviews.average_rating(title_id).await?;
        Ok(TitleReviews {
            title_id,
            average_rating,
            count: reviews.len() as i64,
            reviews,
        })
    }

    pub async fn list_pending(&self) -> AppResult<Vec<Review>> {
        self.repository.reviews.list_by_status(ReviewStatus::Pending).await
    }

    pub async fn list_reported(&self) -> AppResult<Vec<Review>> {
        self.repository.reviews.list_reported().await
    }

    /// Create a Pending review; one live review per user and title
    pub async fn create_review(&self, title_id: i32, user_id: i32, review: CreateReview) -> AppResult<Review> {
        review.validate()?;
        self.repository.inventory.get_title(title_id).await?;

        if self.repository.reviews.user_has_reviewed(user_id, title_id).await? {
            return Err(AppError::Conflict(format!(
                "User {} has already reviewed title {}",
                user_id, title_id
            )));
        }

        let mut tx = self.repository.begin().await?;
        let created =
            ReviewsRepository::insert(&mut tx, title_id, user_id, review.rating, review.text.trim())
                .await?;
        tx.commit().await?;

        tracing::info!("Review {} created on title {} by user {}", created.id, title_id, user_id);
        Ok(created)
    }

    /// Owner edit; the review goes back to Pending
    pub async fn edit_review(&self, review_id: i32, user_id: i32, update: UpdateReview) -> AppResult<Review> {
        update.validate()?;
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }

        let mut tx = self.repository.begin().await?;
        let current = ReviewsRepository::get_locked(&mut tx, review_id).await?;
        current.ensure_owner(user_id)?;

        let rating = update.rating.unwrap_or(current.rating);
        let text = update
            .text
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.text.as_str())
            .to_string();
        let updated = ReviewsRepository::write_content(&mut tx, review_id, rating, &text).await?;
        tx.commit().await?;

        tracing::info!("Review {} edited, back to moderation", review_id);
        Ok(updated)
    }

    /// Staff moderation decision
    pub async fn moderate_review(
        &self,
        review_id: i32,
        status: ReviewStatus,
        staff_user_id: i32,
    ) -> AppResult<Review> {
        let mut tx = self.repository.begin().await?;

        let current = ReviewsRepository::get_locked(&mut tx, review_id).await?;
        let next = current.status.moderate(status)?;
        let updated = ReviewsRepository::write_status(&mut tx, review_id, next).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                Some(staff_user_id),
                action_types::REVIEW_MODERATE,
                entity_types::REVIEWS,
                review_id,
                format!("Review {} {:?} -> {:?}", review_id, current.status, next),
            )
            .before(&current)?
            .after(&updated)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Review {} moderated to {:?}", review_id, next);
        Ok(updated)
    }

    /// Flag a review as inappropriate; owners cannot report themselves
    pub async fn report_review(&self, review_id: i32, reporter_id: i32, report: ReportReview) -> AppResult<Review> {
        report.validate()?;

        let mut tx = self.repository.begin().await?;
        let current = ReviewsRepository::get_locked(&mut tx, review_id).await?;
        if current.user_id == reporter_id {
            return Err(AppError::Conflict("Cannot report your own review".to_string()));
        }

        let reported = ReviewsRepository::write_report(
            &mut tx,
            review_id,
            Some(report.reason.trim()),
            Some(reporter_id),
        )
        .await?;
        tx.commit().await?;

        tracing::info!("Review {} reported by user {}", review_id, reporter_id);
        Ok(reported)
    }

    pub async fn clear_report(&self, review_id: i32, staff_user_id: i32) -> AppResult<Review> {
        let mut tx = self.repository.begin().await?;

        let current = ReviewsRepository::get_locked(&mut tx, review_id).await?;
        let cleared = ReviewsRepository::write_report(&mut tx, review_id, None, None).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                Some(staff_user_id),
                action_types::REVIEW_REPORT_CLEAR,
                entity_types::REVIEWS,
                review_id,
                format!("Report on review {} cleared", review_id),
            )
            .before(&current)?
            .after(&cleared)?,
        )
        .await?;

        tx.commit().await?;
        Ok(cleared)
    }

    /// Soft delete by the owner or by staff
    pub async fn delete_review(&self, review_id: i32, user_id: i32, is_staff: bool) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;

        let current = ReviewsRepository::get_locked(&mut tx, review_id).await?;
        if !is_staff {
            current.ensure_owner(user_id)?;
        }
        let deleted = ReviewsRepository::mark_deleted(&mut tx, review_id).await?;

        AuditRepository::record(
            &mut tx,
            &NewAuditEntry::new(
                Some(user_id),
                action_types::REVIEW_DELETE,
                entity_types::REVIEWS,
                review_id,
                format!("Review {} deleted", review_id),
            )
            .before(&current)?
            .after(&deleted)?,
        )
        .await?;

        tx.commit().await?;
        tracing::info!("Review {} deleted by user {}", review_id, user_id);
        Ok(())
    }
}
