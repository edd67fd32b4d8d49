//! PostgreSQL implementation of AuditLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use verify_core::entities::{AuditEntry, NewAuditEntry};
use verify_core::traits::{AuditLogRepository, RepoResult};
use verify_core::value_objects::Snowflake;

use crate::models::AuditLogModel;

use super::error::map_db_error;

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    /// Create a new PgAuditLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    #[instrument(skip(self, entry), fields(server_id = %entry.server_id, status = %entry.status))]
    async fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditEntry> {
        let model = sqlx::query_as::<_, AuditLogModel>(
            r"
            INSERT INTO verification_logs
                (subject_id, display_name, external_username, server_id, status, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, subject_id, display_name, external_username, server_id,
                      status, message, created_at
            ",
        )
        .bind(entry.subject_id.into_inner())
        .bind(&entry.display_name)
        .bind(&entry.external_username)
        .bind(entry.server_id.into_inner())
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        AuditEntry::try_from(model)
    }

    #[instrument(skip(self))]
    async fn list_by_server(&self, server_id: Snowflake, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        let limit = limit.clamp(1, 100);

        let models = sqlx::query_as::<_, AuditLogModel>(
            r"
            SELECT id, subject_id, display_name, external_username, server_id,
                   status, message, created_at
            FROM verification_logs
            WHERE server_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(server_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        models.into_iter().map(AuditEntry::try_from).collect()
    }
}
