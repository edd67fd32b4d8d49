//! PostgreSQL implementation of ServerPolicyRepository

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use verify_core::entities::{ServerPolicy, ServerPolicyPatch, VerificationRole};
use verify_core::error::DomainError;
use verify_core::traits::{RepoResult, ServerPolicyRepository};
use verify_core::value_objects::Snowflake;

use crate::mappers::policy_with_roles;
use crate::models::{ServerConfigModel, VerificationRoleModel};

use super::error::{map_db_error, map_fk_violation};
use super::lock::begin_locked;

const TABLE: &str = "server_configs";

const SELECT_CONFIG: &str = r"
    SELECT server_id, verification_channel_id, log_channel_id, unverified_role_id,
           auto_kick_unverified, dm_on_verification, allow_reverification,
           created_at, updated_at
    FROM server_configs
    WHERE server_id = $1
";

const UPSERT_CONFIG: &str = r"
    INSERT INTO server_configs
        (server_id, verification_channel_id, log_channel_id, unverified_role_id,
         auto_kick_unverified, dm_on_verification, allow_reverification)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (server_id) DO UPDATE SET
        verification_channel_id = EXCLUDED.verification_channel_id,
        log_channel_id = EXCLUDED.log_channel_id,
        unverified_role_id = EXCLUDED.unverified_role_id,
        auto_kick_unverified = EXCLUDED.auto_kick_unverified,
        dm_on_verification = EXCLUDED.dm_on_verification,
        allow_reverification = EXCLUDED.allow_reverification,
        updated_at = NOW()
    RETURNING server_id, verification_channel_id, log_channel_id, unverified_role_id,
              auto_kick_unverified, dm_on_verification, allow_reverification,
              created_at, updated_at
";

fn upsert_query(policy: &ServerPolicy) -> QueryAs<'static, Postgres, ServerConfigModel, PgArguments> {
    sqlx::query_as::<_, ServerConfigModel>(UPSERT_CONFIG)
        .bind(policy.server_id.into_inner())
        .bind(policy.verification_channel_id.map(Snowflake::into_inner))
        .bind(policy.log_channel_id.map(Snowflake::into_inner))
        .bind(policy.unverified_role_id.map(Snowflake::into_inner))
        .bind(policy.auto_kick_unverified)
        .bind(policy.dm_on_verification)
        .bind(policy.allow_reverification)
}

/// PostgreSQL implementation of ServerPolicyRepository
#[derive(Clone)]
pub struct PgServerPolicyRepository {
    pool: PgPool,
}

impl PgServerPolicyRepository {
    /// Create a new PgServerPolicyRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_roles(&self, server_id: i64) -> RepoResult<Vec<VerificationRoleModel>> {
        sqlx::query_as::<_, VerificationRoleModel>(
            r"
            SELECT server_id, role_id, role_name, role_color, created_at
            FROM verification_roles
            WHERE server_id = $1
            ORDER BY created_at, role_id
            ",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl ServerPolicyRepository for PgServerPolicyRepository {
    #[instrument(skip(self))]
    async fn find(&self, server_id: Snowflake) -> RepoResult<Option<ServerPolicy>> {
        let result = sqlx::query_as::<_, ServerConfigModel>(SELECT_CONFIG)
            .bind(server_id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        match result {
            Some(model) => {
                let roles = self.load_roles(model.server_id).await?;
                Ok(Some(policy_with_roles(model, roles)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, policy), fields(server_id = %policy.server_id))]
    async fn save(&self, policy: &ServerPolicy) -> RepoResult<()> {
        upsert_query(policy)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        server_id: Snowflake,
        patch: &ServerPolicyPatch,
    ) -> RepoResult<ServerPolicy> {
        let mut tx = begin_locked(&self.pool, TABLE, server_id, server_id).await?;

        let current = sqlx::query_as::<_, ServerConfigModel>(SELECT_CONFIG)
            .bind(server_id.into_inner())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        let mut policy = match current {
            Some(model) => policy_with_roles(model, Vec::new()),
            None => ServerPolicy::defaults(server_id),
        };
        patch.apply(&mut policy);

        let model = upsert_query(&policy)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;

        let roles = self.load_roles(model.server_id).await?;
        Ok(policy_with_roles(model, roles))
    }

    #[instrument(skip(self, role), fields(server_id = %role.server_id, role_id = %role.role_id))]
    async fn add_role(&self, role: &VerificationRole) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO verification_roles (server_id, role_id, role_name, role_color)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (server_id, role_id) DO NOTHING
            ",
        )
        .bind(role.server_id.into_inner())
        .bind(role.role_id.into_inner())
        .bind(&role.role_name)
        .bind(role.role_color)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_fk_violation(e, || {
                DomainError::ValidationError("server has no stored configuration".to_string())
            })
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn remove_role(&self, server_id: Snowflake, role_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM verification_roles WHERE server_id = $1 AND role_id = $2
            ",
        )
        .bind(server_id.into_inner())
        .bind(role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
