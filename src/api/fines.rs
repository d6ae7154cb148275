//! Fine endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{enums::FineStatus, fine::Fine},
    AppState,
};

use super::AuthenticatedUser;

/// Settlement request
#[derive(Deserialize, ToSchema)]
pub struct SettleFineRequest {
    /// paid or waived
    pub status: String,
}

/// Fines of a user with the outstanding total
#[derive(Serialize, ToSchema)]
pub struct UserFinesResponse {
    pub fines: Vec<Fine>,
    #[schema(value_type = String)]
    pub total_unpaid: Decimal,
}

/// Fines and unpaid total of a user
#[utoipa::path(
    get,
    path = "/users/{id}/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's fines", body = UserFinesResponse),
        (status = 403, description = "Not your fines")
    )
)]
pub async fn list_user_fines(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<UserFinesResponse>> {
    claims.require_self_or_staff(user_id)?;

    let fines = state.services.fines.list_user_fines(user_id).await?;
    let total_unpaid = state.services.fines.total_unpaid(user_id).await?;
    Ok(Json(UserFinesResponse { fines, total_unpaid }))
}

/// Fines charged on a borrowing
#[utoipa::path(
    get,
    path = "/borrowings/{id}/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Fines", body = Vec<Fine>),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn list_borrowing_fines(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<Vec<Fine>>> {
    let borrowing = state.services.loans.get_borrowing(borrowing_id).await?;
    claims.require_self_or_staff(borrowing.borrowing.user_id)?;

    let fines = state.services.fines.list_borrowing_fines(borrowing_id).await?;
    Ok(Json(fines))
}

/// Get a fine
#[utoipa::path(
    get,
    path = "/fines/{id}",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Fine ID")),
    responses(
        (status = 200, description = "Fine", body = Fine),
        (status = 404, description = "Fine not found")
    )
)]
pub async fn get_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Fine>> {
    let fine = state.services.fines.get_fine(id).await?;
    if !claims.is_staff() {
        let borrowing = state.services.loans.get_borrowing(fine.borrowing_id).await?;
        claims.require_self_or_staff(borrowing.borrowing.user_id)?;
    }
    Ok(Json(fine))
}

/// Settle an accrued fine
#[utoipa::path(
    post,
    path = "/fines/{id}/settle",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Fine ID")),
    request_body = SettleFineRequest,
    responses(
        (status = 200, description = "Fine settled", body = Fine),
        (status = 400, description = "Invalid target status"),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Already settled")
    )
)]
pub async fn settle_fine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<SettleFineRequest>,
) -> AppResult<Json<Fine>> {
    claims.require_staff()?;
    let status: FineStatus = request.status.parse()?;

    let fine = state.services.fines.settle_fine(id, status, claims.user_id).await?;
    Ok(Json(fine))
}
