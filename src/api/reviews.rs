//! Review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        enums::ReviewStatus,
        review::{CreateReview, ReportReview, Review, TitleReviews, UpdateReview},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Moderation decision
#[derive(Deserialize, ToSchema)]
pub struct ModerateReviewRequest {
    /// approved or rejected
    pub status: String,
}

/// Approved reviews of a title
#[utoipa::path(
    get,
    path = "/titles/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Reviews and average rating", body = TitleReviews),
        (status = 404, description = "Title not found")
    )
)]
pub async fn list_title_reviews(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(title_id): Path<i32>,
) -> AppResult<Json<TitleReviews>> {
    let reviews = state.services.reviews.list_for_title(title_id).await?;
    Ok(Json(reviews))
}

/// Write a review
#[utoipa::path(
    post,
    path = "/titles/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review awaiting moderation", body = Review),
        (status = 400, description = "Invalid rating or text"),
        (status = 409, description = "Title already reviewed")
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(title_id): Path<i32>,
    Json(request): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state
        .services
        .reviews
        .create_review(title_id, claims.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit your own review
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not your review")
    )
)]
pub async fn edit_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateReview>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.edit_review(id, claims.user_id, request).await?;
    Ok(Json(review))
}

/// Delete a review (owner or staff)
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not your review"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .reviews
        .delete_review(id, claims.user_id, claims.is_staff())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report a review
#[utoipa::path(
    post,
    path = "/reviews/{id}/report",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = ReportReview,
    responses(
        (status = 200, description = "Review reported", body = Review),
        (status = 409, description = "Own review")
    )
)]
pub async fn report_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ReportReview>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.report_review(id, claims.user_id, request).await?;
    Ok(Json(review))
}

/// Clear the report flag
#[utoipa::path(
    delete,
    path = "/reviews/{id}/report",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Report cleared", body = Review),
        (status = 403, description = "Staff only")
    )
)]
pub async fn clear_report(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Review>> {
    claims.require_staff()?;

    let review = state.services.reviews.clear_report(id, claims.user_id).await?;
    Ok(Json(review))
}

/// Approve or reject a review
#[utoipa::path(
    put,
    path = "/reviews/{id}/moderation",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = ModerateReviewRequest,
    responses(
        (status = 200, description = "Review moderated", body = Review),
        (status = 409, description = "Transition not allowed"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn moderate_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ModerateReviewRequest>,
) -> AppResult<Json<Review>> {
    claims.require_staff()?;
    let status: ReviewStatus = request.status.parse()?;

    let review = state
        .services
        .reviews
        .moderate_review(id, status, claims.user_id)
        .await?;
    Ok(Json(review))
}

/// Reviews awaiting moderation
#[utoipa::path(
    get,
    path = "/moderation/pending",
    tag = "reviews",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending reviews", body = Vec<Review>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_pending(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Review>>> {
    claims.require_staff()?;

    let reviews = state.services.reviews.list_pending().await?;
    Ok(Json(reviews))
}

/// Reported reviews
#[utoipa::path(
    get,
    path = "/moderation/reported",
    tag = "reviews",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reported reviews", body = Vec<Review>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_reported(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Review>>> {
    claims.require_staff()?;

    let reviews = state.services.reviews.list_reported().await?;
    Ok(Json(reviews))
}
