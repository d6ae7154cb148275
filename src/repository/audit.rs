//! Repository for the append-only `audit_logs` table

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::audit::{AuditLogEntry, AuditQuery, NewAuditEntry},
};

const COLUMNS: &str = "\
    id, action_type, actor_user_id, description, entity_type, entity_id, \
    before_state, after_state, created_at";

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one entry on the caller's transaction.
    ///
    /// An insert failure is returned to the caller so the enclosing business
    /// transaction rolls back with it.
    pub async fn record(conn: &mut PgConnection, entry: &NewAuditEntry) -> AppResult<AuditLogEntry> {
        let row = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            INSERT INTO audit_logs
                (action_type, actor_user_id, description, entity_type, entity_id, before_state, after_state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(entry.action_type)
        .bind(entry.actor_user_id)
        .bind(&entry.description)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.before_state)
        .bind(&entry.after_state)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Query entries, newest first
    pub async fn query(&self, params: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM audit_logs WHERE TRUE"));

        if let Some(ref entity_type) = params.entity_type {
            builder.push(" AND entity_type = ").push_bind(entity_type.clone());
        }
        if let Some(entity_id) = params.entity_id {
            builder.push(" AND entity_id = ").push_bind(entity_id);
        }
        if let Some(ref action_type) = params.action_type {
            builder.push(" AND action_type = ").push_bind(action_type.clone());
        }
        if let Some(actor) = params.actor_user_id {
            builder.push(" AND actor_user_id = ").push_bind(actor);
        }
        if let Some(from) = params.date_from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = params.date_to {
            builder.push(" AND created_at <= ").push_bind(to);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let entries = builder
            .build_query_as::<AuditLogEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
