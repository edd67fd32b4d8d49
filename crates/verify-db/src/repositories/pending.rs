//! PostgreSQL implementation of PendingVerificationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use verify_core::entities::PendingVerification;
use verify_core::traits::{PendingVerificationRepository, RepoResult};
use verify_core::value_objects::{Snowflake, VerificationCode};

use crate::models::PendingVerificationModel;

use super::error::map_db_error;
use super::lock::begin_locked;

const TABLE: &str = "pending_verifications";

/// PostgreSQL implementation of PendingVerificationRepository
#[derive(Clone)]
pub struct PgPendingVerificationRepository {
    pool: PgPool,
}

impl PgPendingVerificationRepository {
    /// Create a new PgPendingVerificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingVerificationRepository for PgPendingVerificationRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
    ) -> RepoResult<Option<PendingVerification>> {
        let result = sqlx::query_as::<_, PendingVerificationModel>(
            r"
            SELECT subject_id, server_id, code, username_hint, created_at, expires_at
            FROM pending_verifications
            WHERE subject_id = $1 AND server_id = $2
            ",
        )
        .bind(subject_id.into_inner())
        .bind(server_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(PendingVerification::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_code(
        &self,
        server_id: Snowflake,
        code: &VerificationCode,
    ) -> RepoResult<Option<PendingVerification>> {
        let result = sqlx::query_as::<_, PendingVerificationModel>(
            r"
            SELECT subject_id, server_id, code, username_hint, created_at, expires_at
            FROM pending_verifications
            WHERE server_id = $1 AND code = $2
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(server_id.into_inner())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(PendingVerification::try_from).transpose()
    }

    #[instrument(skip(self, pending), fields(subject_id = %pending.subject_id, server_id = %pending.server_id))]
    async fn replace(
        &self,
        pending: &PendingVerification,
    ) -> RepoResult<Option<PendingVerification>> {
        let mut tx = begin_locked(&self.pool, TABLE, pending.subject_id, pending.server_id).await?;

        let previous = sqlx::query_as::<_, PendingVerificationModel>(
            r"
            DELETE FROM pending_verifications
            WHERE subject_id = $1 AND server_id = $2
            RETURNING subject_id, server_id, code, username_hint, created_at, expires_at
            ",
        )
        .bind(pending.subject_id.into_inner())
        .bind(pending.server_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO pending_verifications
                (subject_id, server_id, code, username_hint, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(pending.subject_id.into_inner())
        .bind(pending.server_id.into_inner())
        .bind(pending.code.as_str())
        .bind(&pending.username_hint)
        .bind(pending.created_at)
        .bind(pending.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        if previous.is_some() {
            debug!("Superseded previous pending verification");
        }

        // A corrupt superseded row is gone now; don't fail the insert over it
        Ok(previous.and_then(|m| PendingVerification::try_from(m).ok()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, subject_id: Snowflake, server_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM pending_verifications WHERE subject_id = $1 AND server_id = $2
            ",
        )
        .bind(subject_id.into_inner())
        .bind(server_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_if_code(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
        code: &VerificationCode,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM pending_verifications
            WHERE subject_id = $1 AND server_id = $2 AND code = $3
            ",
        )
        .bind(subject_id.into_inner())
        .bind(server_id.into_inner())
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
