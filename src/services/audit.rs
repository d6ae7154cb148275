//! Audit log read side

use crate::{
    error::{AppError, AppResult},
    models::audit::{AuditLogEntry, AuditQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuditService {
    repository: Repository,
}

impl AuditService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Entries matching the filters, newest first
    pub async fn query_audit_log(&self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if from > to {
                return Err(AppError::Validation("date_from must not be after date_to".to_string()));
            }
        }
        self.repository.audit.query(query).await
    }
}
