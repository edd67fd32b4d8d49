//! PostgreSQL implementation of VerifiedLinkRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};

use verify_core::entities::VerifiedLink;
use verify_core::traits::{RepoResult, VerifiedLinkRepository};
use verify_core::value_objects::Snowflake;

use crate::models::VerifiedLinkModel;

use super::error::map_db_error;
use super::lock::begin_locked;

const TABLE: &str = "verified_links";

/// PostgreSQL implementation of VerifiedLinkRepository
#[derive(Clone)]
pub struct PgVerifiedLinkRepository {
    pool: PgPool,
}

impl PgVerifiedLinkRepository {
    /// Create a new PgVerifiedLinkRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerifiedLinkRepository for PgVerifiedLinkRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
    ) -> RepoResult<Option<VerifiedLink>> {
        let result = sqlx::query_as::<_, VerifiedLinkModel>(
            r"
            SELECT id, subject_id, server_id, external_id, external_username, verified_at, code
            FROM verified_links
            WHERE subject_id = $1 AND server_id = $2
            ORDER BY verified_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(subject_id.into_inner())
        .bind(server_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(VerifiedLink::try_from).transpose()
    }

    #[instrument(skip(self, link), fields(subject_id = %link.subject_id, server_id = %link.server_id))]
    async fn replace(&self, link: &VerifiedLink) -> RepoResult<()> {
        let mut tx = begin_locked(&self.pool, TABLE, link.subject_id, link.server_id).await?;

        let removed = sqlx::query(
            r"
            DELETE FROM verified_links WHERE subject_id = $1 AND server_id = $2
            ",
        )
        .bind(link.subject_id.into_inner())
        .bind(link.server_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?
        .rows_affected();

        if removed > 1 {
            warn!(removed, "Collapsed duplicate verified links");
        }

        sqlx::query(
            r"
            INSERT INTO verified_links
                (subject_id, server_id, external_id, external_username, verified_at, code)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(link.subject_id.into_inner())
        .bind(link.server_id.into_inner())
        .bind(&link.external_id)
        .bind(&link.external_username)
        .bind(link.verified_at)
        .bind(link.code.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, subject_id: Snowflake, server_id: Snowflake) -> RepoResult<bool> {
        let mut tx = begin_locked(&self.pool, TABLE, subject_id, server_id).await?;

        let result = sqlx::query(
            r"
            DELETE FROM verified_links WHERE subject_id = $1 AND server_id = $2
            ",
        )
        .bind(subject_id.into_inner())
        .bind(server_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
