//! Per-server policy: stored values merged over the defaults

use tracing::{info, instrument};

use verify_core::entities::{ServerPolicy, ServerPolicyPatch, VerificationRole};
use verify_core::value_objects::Snowflake;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Resolves and updates server policy
pub struct ConfigResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Stored policy, or the defaults when nothing is stored
    #[instrument(skip(self))]
    pub async fn resolve(&self, server_id: Snowflake) -> ServiceResult<ServerPolicy> {
        Ok(self
            .ctx
            .policy_repo()
            .find(server_id)
            .await?
            .unwrap_or_else(|| ServerPolicy::defaults(server_id)))
    }

    /// Merge a partial update into the stored policy, creating it if absent
    #[instrument(skip(self, patch))]
    pub async fn upsert(
        &self,
        server_id: Snowflake,
        patch: &ServerPolicyPatch,
    ) -> ServiceResult<ServerPolicy> {
        let policy = self.ctx.policy_repo().update(server_id, patch).await?;
        info!(server_id = %server_id, changes = ?patch.describe(), "Server policy updated");
        Ok(policy)
    }

    /// Add a verification role; `false` if it was already configured
    #[instrument(skip(self, role), fields(server_id = %role.server_id, role_id = %role.role_id))]
    pub async fn add_role(&self, role: &VerificationRole) -> ServiceResult<bool> {
        // Roles hang off the stored row; create it without touching existing settings
        self.ctx
            .policy_repo()
            .update(role.server_id, &ServerPolicyPatch::default())
            .await?;
        Ok(self.ctx.policy_repo().add_role(role).await?)
    }

    /// Remove a verification role; `false` if it was not configured
    #[instrument(skip(self))]
    pub async fn remove_role(&self, server_id: Snowflake, role_id: Snowflake) -> ServiceResult<bool> {
        Ok(self.ctx.policy_repo().remove_role(server_id, role_id).await?)
    }
}
