//! Audit log endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::audit::{AuditLogEntry, AuditQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Query the audit log, newest first
#[utoipa::path(
    get,
    path = "/audit-log",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditLogEntry>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn query_audit_log(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditLogEntry>>> {
    claims.require_staff()?;

    let entries = state.services.audit.query_audit_log(&query).await?;
    Ok(Json(entries))
}
