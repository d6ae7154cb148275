//! Audit log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Known action types for audit log entries
pub mod action_types {
    pub const TITLE_CREATE: &str = "title_create";
    pub const STOCK_ADJUST: &str = "stock_adjust";
    pub const COPY_CREATE: &str = "copy_create";
    pub const COPY_STATUS_CHANGE: &str = "copy_status_change";
    pub const COPY_SOFT_DELETE: &str = "copy_soft_delete";
    pub const TITLE_COUNTER_CHANGE: &str = "title_counter_change";
    pub const BORROWING_ISSUE: &str = "borrowing_issue";
    pub const BORROWING_EXTEND: &str = "borrowing_extend";
    pub const BORROWING_RETURN: &str = "borrowing_return";
    pub const BORROWING_FORCE_RETURN: &str = "borrowing_force_return";
    pub const FINE_ACCRUE: &str = "fine_accrue";
    pub const FINE_SETTLE: &str = "fine_settle";
    pub const REVIEW_MODERATE: &str = "review_moderate";
    pub const REVIEW_REPORT_CLEAR: &str = "review_report_clear";
    pub const REVIEW_DELETE: &str = "review_delete";
}

/// Entity type names recorded with each entry
pub mod entity_types {
    pub const TITLES: &str = "Titles";
    pub const COPIES: &str = "Copies";
    pub const BORROWINGS: &str = "Borrowings";
    pub const FINES: &str = "Fines";
    pub const REVIEWS: &str = "Reviews";
}

/// Immutable audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action_type: String,
    pub actor_user_id: Option<i32>,
    pub description: String,
    pub entity_type: String,
    pub entity_id: i32,
    #[schema(value_type = Option<Object>)]
    pub before_state: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub after_state: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Entry about to be appended
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_user_id: Option<i32>,
    pub action_type: &'static str,
    pub description: String,
    pub entity_type: &'static str,
    pub entity_id: i32,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
}

impl NewAuditEntry {
    pub fn new(
        actor_user_id: Option<i32>,
        action_type: &'static str,
        entity_type: &'static str,
        entity_id: i32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor_user_id,
            action_type,
            description: description.into(),
            entity_type,
            entity_id,
            before_state: None,
            after_state: None,
        }
    }

    pub fn before<T: Serialize>(mut self, state: &T) -> AppResult<Self> {
        self.before_state = Some(snapshot(state)?);
        Ok(self)
    }

    pub fn after<T: Serialize>(mut self, state: &T) -> AppResult<Self> {
        self.after_state = Some(snapshot(state)?);
        Ok(self)
    }
}

/// Serialize a row for the before/after columns
pub fn snapshot<T: Serialize>(state: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(state)
        .map_err(|e| AppError::Internal(format!("audit snapshot failed: {}", e)))
}

/// Audit log filters
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub action_type: Option<String>,
    pub actor_user_id: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 500;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
