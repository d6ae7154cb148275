//! Title and copy endpoints

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
        enums::CopyStatus,
        inventory::{BookCopy, CreateTitle, Title},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Copy status change request
#[derive(Deserialize, ToSchema)]
pub struct SetCopyStatusRequest {
    /// available, damaged, lost or reserved
    pub status: String,
}

/// Bulk stock correction
#[derive(Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed change applied to both total and available counters
    pub delta: i32,
}

/// Create a title
#[utoipa::path(
    post,
    path = "/titles",
    tag = "inventory",
    security(("bearer_auth" = [])),
    request_body = CreateTitle,
    responses(
        (status = 201, description = "Title created", body = Title),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_title(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateTitle>,
) -> AppResult<(StatusCode, Json<Title>)> {
    claims.require_staff()?;

    let title = state.services.inventory.create_title(request, Some(claims.user_id)).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

/// Get title details with counters
#[utoipa::path(
    get,
    path = "/titles/{id}",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title details", body = Title),
        (status = 404, description = "Title not found")
    )
)]
pub async fn get_title(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Title>> {
    let title = state.services.inventory.get_title(id).await?;
    Ok(Json(title))
}

/// List the live copies of a title
#[utoipa::path(
    get,
    path = "/titles/{id}/copies",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Copies", body = Vec<BookCopy>),
        (status = 404, description = "Title not found")
    )
)]
pub async fn list_copies(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(title_id): Path<i32>,
) -> AppResult<Json<Vec<BookCopy>>> {
    let copies = state.services.inventory.list_copies(title_id).await?;
    Ok(Json(copies))
}

/// Register a new Available copy
#[utoipa::path(
    post,
    path = "/titles/{id}/copies",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 201, description = "Copy created", body = BookCopy),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Title not found")
    )
)]
pub async fn add_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(title_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BookCopy>)> {
    claims.require_staff()?;

    let copy = state.services.inventory.add_copy(title_id, Some(claims.user_id)).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Adjust title stock counters
#[utoipa::path(
    post,
    path = "/titles/{id}/stock",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Counters adjusted", body = Title),
        (status = 400, description = "Zero delta"),
        (status = 409, description = "Counter would go negative")
    )
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(title_id): Path<i32>,
    Json(request): Json<AdjustStockRequest>,
) -> AppResult<Json<Title>> {
    claims.require_staff()?;

    let title = state
        .services
        .inventory
        .adjust_stock(title_id, request.delta, Some(claims.user_id))
        .await?;
    Ok(Json(title))
}

/// Get a copy
#[utoipa::path(
    get,
    path = "/copies/{id}",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy", body = BookCopy),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_copy(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookCopy>> {
    let copy = state.services.inventory.get_copy(id).await?;
    Ok(Json(copy))
}

/// Change the status of a copy
#[utoipa::path(
    put,
    path = "/copies/{id}/status",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    request_body = SetCopyStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = BookCopy),
        (status = 400, description = "Unknown status"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn set_copy_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(copy_id): Path<i32>,
    Json(request): Json<SetCopyStatusRequest>,
) -> AppResult<Json<BookCopy>> {
    claims.require_staff()?;
    let status: CopyStatus = request.status.parse()?;

    let copy = state
        .services
        .inventory
        .set_copy_status(copy_id, status, Some(claims.user_id))
        .await?;
    Ok(Json(copy))
}

/// Soft delete a copy
#[utoipa::path(
    delete,
    path = "/copies/{id}",
    tag = "inventory",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy is borrowed")
    )
)]
pub async fn delete_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(copy_id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.inventory.soft_delete_copy(copy_id, Some(claims.user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
