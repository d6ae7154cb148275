//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{audit, borrowings, fines, health, inventory, reviews};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BiblioteQ Lending API",
        version = "1.0.0",
        description = "Inventory, borrowing, fines and reviews REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Inventory
        inventory::create_title,
        inventory::get_title,
        inventory::list_copies,
        inventory::add_copy,
        inventory::adjust_stock,
        inventory::get_copy,
        inventory::set_copy_status,
        inventory::delete_copy,
        // Borrowings
        borrowings::issue_borrowing,
        borrowings::get_borrowing,
        borrowings::extend_borrowing,
        borrowings::return_borrowing,
        borrowings::force_return,
        borrowings::list_overdue,
        borrowings::list_user_borrowings,
        // Fines
        fines::list_user_fines,
        fines::list_borrowing_fines,
        fines::get_fine,
        fines::settle_fine,
        // Reviews
        reviews::list_title_reviews,
        reviews::create_review,
        reviews::edit_review,
        reviews::delete_review,
        reviews::report_review,
        reviews::clear_report,
        reviews::moderate_review,
        reviews::list_pending,
        reviews::list_reported,
        // Audit
        audit::query_audit_log,
    ),
    components(
        schemas(
            // Inventory
            crate::models::inventory::Title,
            crate::models::inventory::BookCopy,
            crate::models::inventory::CreateTitle,
            crate::models::enums::CopyStatus,
            inventory::SetCopyStatusRequest,
            inventory::AdjustStockRequest,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::ReturnOutcome,
            crate::models::enums::BorrowingStatus,
            crate::models::enums::ReturnCondition,
            borrowings::IssueBorrowingRequest,
            borrowings::ExtendBorrowingRequest,
            borrowings::ReturnBorrowingRequest,
            // Fines
            crate::models::fine::Fine,
            crate::models::enums::FineStatus,
            crate::models::enums::FineReason,
            fines::SettleFineRequest,
            fines::UserFinesResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            crate::models::review::ReportReview,
            crate::models::review::TitleReviews,
            crate::models::enums::ReviewStatus,
            reviews::ModerateReviewRequest,
            // Audit
            crate::models::audit::AuditLogEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "inventory", description = "Titles and copies"),
        (name = "borrowings", description = "Borrowing lifecycle"),
        (name = "fines", description = "Fines and settlement"),
        (name = "reviews", description = "Reviews and moderation"),
        (name = "audit", description = "Audit log")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
