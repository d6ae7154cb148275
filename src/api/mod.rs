//! API handlers for the BiblioteQ REST endpoints

pub mod audit;
pub mod borrowings;
pub mod fines;
pub mod health;
pub mod inventory;
pub mod openapi;
pub mod reviews;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Inventory
        .route("/titles", post(inventory::create_title))
        .route("/titles/:id", get(inventory::get_title))
        .route("/titles/:id/copies", get(inventory::list_copies))
        .route("/titles/:id/copies", post(inventory::add_copy))
        .route("/titles/:id/stock", post(inventory::adjust_stock))
        .route("/copies/:id", get(inventory::get_copy))
        .route("/copies/:id", delete(inventory::delete_copy))
        .route("/copies/:id/status", put(inventory::set_copy_status))
        // Borrowings
        .route("/borrowings", post(borrowings::issue_borrowing))
        .route("/borrowings/:id", get(borrowings::get_borrowing))
        .route("/borrowings/:id/extend", post(borrowings::extend_borrowing))
        .route("/borrowings/:id/return", post(borrowings::return_borrowing))
        .route("/borrowings/:id/force-return", post(borrowings::force_return))
        .route("/borrowings/:id/fines", get(fines::list_borrowing_fines))
        .route("/overdue-borrowings", get(borrowings::list_overdue))
        .route("/users/:id/borrowings", get(borrowings::list_user_borrowings))
        // Fines
        .route("/users/:id/fines", get(fines::list_user_fines))
        .route("/fines/:id", get(fines::get_fine))
        .route("/fines/:id/settle", post(fines::settle_fine))
        // Reviews
        .route("/titles/:id/reviews", get(reviews::list_title_reviews))
        .route("/titles/:id/reviews", post(reviews::create_review))
        .route("/reviews/:id", put(reviews::edit_review))
        .route("/reviews/:id", delete(reviews::delete_review))
        .route("/reviews/:id/report", post(reviews::report_review))
        .route("/reviews/:id/report", delete(reviews::clear_report))
        .route("/reviews/:id/moderation", put(reviews::moderate_review))
        .route("/moderation/pending", get(reviews::list_pending))
        .route("/moderation/reported", get(reviews::list_reported))
        // Audit
        .route("/audit-log", get(audit::query_audit_log))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
