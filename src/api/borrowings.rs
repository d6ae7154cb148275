//! Borrowing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        borrowing::{Borrowing, BorrowingDetails, ReturnOutcome},
        enums::ReturnCondition,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Issue request
#[derive(Deserialize, ToSchema)]
pub struct IssueBorrowingRequest {
    pub user_id: i32,
    pub copy_id: i32,
    /// Defaults to the configured loan length
    pub due_date: Option<DateTime<Utc>>,
}

/// Extension request
#[derive(Deserialize, Default, ToSchema)]
pub struct ExtendBorrowingRequest {
    /// Defaults to the configured extension length
    pub days: Option<i64>,
}

/// Return request
#[derive(Deserialize, Default, ToSchema)]
pub struct ReturnBorrowingRequest {
    /// good (default), damaged or lost
    pub condition: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserBorrowingsQuery {
    /// Only borrowings not yet returned
    #[serde(default)]
    pub open_only: bool,
}

/// Issue a borrowing of an available copy
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = IssueBorrowingRequest,
    responses(
        (status = 201, description = "Borrowing issued", body = Borrowing),
        (status = 403, description = "Staff only or user ineligible"),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy unavailable")
    )
)]
pub async fn issue_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<IssueBorrowingRequest>,
) -> AppResult<(StatusCode, Json<Borrowing>)> {
    claims.require_staff()?;

    let borrowing = state
        .services
        .loans
        .issue_borrowing(request.user_id, request.copy_id, request.due_date, Some(claims.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Get a borrowing with its derived status
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Borrowing", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let details = state.services.loans.get_borrowing(id).await?;
    claims.require_self_or_staff(details.borrowing.user_id)?;
    Ok(Json(details))
}

/// Extend the due date of an open borrowing
#[utoipa::path(
    post,
    path = "/borrowings/{id}/extend",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    request_body = ExtendBorrowingRequest,
    responses(
        (status = 200, description = "Borrowing extended", body = Borrowing),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned or extension limit reached")
    )
)]
pub async fn extend_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    request: Option<Json<ExtendBorrowingRequest>>,
) -> AppResult<Json<Borrowing>> {
    if !claims.is_staff() {
        let current = state.services.loans.get_borrowing(id).await?;
        claims.require_self_or_staff(current.borrowing.user_id)?;
    }
    let Json(request) = request.unwrap_or_default();

    let borrowing = state
        .services
        .loans
        .extend_borrowing(id, request.days, Some(claims.user_id))
        .await?;
    Ok(Json(borrowing))
}

/// Return a borrowed copy
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    request_body = ReturnBorrowingRequest,
    responses(
        (status = 200, description = "Copy returned", body = ReturnOutcome),
        (status = 400, description = "Unknown condition"),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    request: Option<Json<ReturnBorrowingRequest>>,
) -> AppResult<Json<ReturnOutcome>> {
    claims.require_staff()?;
    let Json(request) = request.unwrap_or_default();
    let condition = match request.condition.as_deref() {
        Some(value) => value.parse::<ReturnCondition>()?,
        None => ReturnCondition::default(),
    };

    let outcome = state
        .services
        .loans
        .return_borrowing(id, condition, Some(claims.user_id))
        .await?;
    Ok(Json(outcome))
}

/// Close a borrowing whose copy will not come back
#[utoipa::path(
    post,
    path = "/borrowings/{id}/force-return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Borrowing closed, copy lost", body = ReturnOutcome),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn force_return(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnOutcome>> {
    claims.require_staff()?;

    let outcome = state.services.loans.force_return(id, claims.user_id).await?;
    Ok(Json(outcome))
}

/// Open borrowings past their due date
#[utoipa::path(
    get,
    path = "/overdue-borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue borrowings", body = Vec<BorrowingDetails>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    claims.require_staff()?;

    let borrowings = state.services.loans.list_overdue().await?;
    Ok(Json(borrowings))
}

/// Borrowings of a user
#[utoipa::path(
    get,
    path = "/users/{id}/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        UserBorrowingsQuery
    ),
    responses(
        (status = 200, description = "User's borrowings", body = Vec<BorrowingDetails>),
        (status = 403, description = "Not your borrowings")
    )
)]
pub async fn list_user_borrowings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<UserBorrowingsQuery>,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    claims.require_self_or_staff(user_id)?;

    let borrowings = state
        .services
        .loans
        .list_user_borrowings(user_id, query.open_only)
        .await?;
    Ok(Json(borrowings))
}
