//! HTTP surface tests that never reach the database

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use biblioteq_server::{
    api,
    config::{AppConfig, AuthConfig, DatabaseConfig, LendingConfig, LoggingConfig, ServerConfig},
    models::user::{Role, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

const SECRET: &str = "test-secret";

fn app() -> Router {
    let database = DatabaseConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&database.url)
        .unwrap();
    let config = AppConfig {
        server: ServerConfig::default(),
        database,
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
        },
        logging: LoggingConfig::default(),
        lending: LendingConfig::default(),
    };
    let services = Services::new(Repository::new(pool), config.lending.clone());
    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

fn token(user_id: i32, role: Role) -> String {
    let now = Utc::now();
    UserClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(SECRET)
    .unwrap()
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app()
        .oneshot(request(Method::GET, "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = app()
        .oneshot(request(Method::GET, "/api/v1/titles/1", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let forged = UserClaims {
        sub: "mallory".to_string(),
        user_id: 1,
        role: Role::Admin,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Utc::now().timestamp(),
    }
    .create_token("another-secret")
    .unwrap();

    let response = app()
        .oneshot(request(Method::GET, "/api/v1/overdue-borrowings", Some(&forged), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reader_cannot_create_titles() {
    let reader = token(5, Role::Reader);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/titles",
            Some(&reader),
            Some(json!({ "title": "Dune" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_cannot_settle_fines() {
    let reader = token(5, Role::Reader);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/fines/1/settle",
            Some(&reader),
            Some(json!({ "status": "waived" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reader_cannot_read_other_users_fines() {
    let reader = token(5, Role::Reader);
    let response = app()
        .oneshot(request(Method::GET, "/api/v1/users/6/fines", Some(&reader), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_copy_status_is_rejected() {
    let librarian = token(1, Role::Librarian);
    let response = app()
        .oneshot(request(
            Method::PUT,
            "/api/v1/copies/1/status",
            Some(&librarian),
            Some(json!({ "status": "shelved" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], 5);
    assert_eq!(body["error"], "InvalidStatus");
}

#[tokio::test]
async fn test_unknown_return_condition_is_rejected() {
    let librarian = token(1, Role::Librarian);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/v1/borrowings/1/return",
            Some(&librarian),
            Some(json!({ "condition": "soggy" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app()
        .oneshot(request(Method::GET, "/api-docs/openapi.json", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/borrowings/{id}/return"].is_object());
}
