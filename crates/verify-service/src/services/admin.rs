//! Admin service
//!
//! Server-management operations. Every call re-checks the acting member's
//! permissions on the chat platform.

use tracing::{info, instrument, warn};

use verify_core::entities::{AuditStatus, Member, NewAuditEntry, ServerPolicyPatch, VerificationRole};
use verify_core::error::DomainError;
use verify_core::value_objects::{Permissions, Snowflake};

use crate::dto::{
    AddRoleRequest, AuditEntryResponse, PolicyResponse, RecentLogsQuery, ResetResponse,
    RoleChangeResponse, SetupRequest, UpdateConfigRequest,
};

use super::audit::AuditLogger;
use super::config_resolver::ConfigResolver;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Largest page of audit entries returned at once
pub const MAX_LOG_LIMIT: i64 = 50;

/// Admin service
pub struct AdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AdminService<'a> {
    /// Create a new AdminService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetch the acting member and require a permission
    async fn authorize(
        &self,
        server_id: Snowflake,
        admin: Snowflake,
        permission: Permissions,
        name: &str,
    ) -> ServiceResult<Member> {
        let member = self
            .ctx
            .platform()
            .fetch_member(server_id, admin)
            .await
            .map_err(|e| ServiceError::upstream("member lookup", &e))?
            .ok_or(DomainError::MemberNotFound)?;

        if !member.can(permission) {
            warn!(user_id = %admin, server_id = %server_id, permission = name, "Permission denied");
            return Err(ServiceError::permission_denied(name));
        }
        Ok(member)
    }

    /// Delete a member's link (and any outstanding attempt) so they must verify again
    #[instrument(skip(self))]
    pub async fn reset_verification(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        target: Snowflake,
    ) -> ServiceResult<ResetResponse> {
        let actor = self
            .authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;

        let link = self
            .ctx
            .link_repo()
            .find(target, server_id)
            .await?
            .ok_or(DomainError::NotVerified)?;
        self.ctx.link_repo().delete(target, server_id).await?;
        let removed_pending = self.ctx.pending_repo().delete(target, server_id).await?;

        info!(target_id = %target, admin_id = %admin, "Verification reset");

        let target_name = match self.ctx.platform().fetch_member(server_id, target).await {
            Ok(Some(member)) => member.display_name().to_string(),
            _ => target.to_string(),
        };
        let policy = ConfigResolver::new(self.ctx).resolve(server_id).await?;
        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(
                    target,
                    target_name,
                    server_id,
                    AuditStatus::Pending,
                    format!("Forced reverification by {}", actor.display_name()),
                )
                .with_external_username(Some(link.external_username.clone())),
                &policy,
            )
            .await;

        Ok(ResetResponse {
            removed_link: (&link).into(),
            removed_pending,
        })
    }

    /// Set the verification channel and unverified role, and add the verification role
    #[instrument(skip(self, request))]
    pub async fn setup(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        request: SetupRequest,
    ) -> ServiceResult<PolicyResponse> {
        let actor = self
            .authorize(server_id, admin, Permissions::MANAGE_ROLES, "MANAGE_ROLES")
            .await?;

        let resolver = ConfigResolver::new(self.ctx);
        let patch = ServerPolicyPatch {
            verification_channel_id: Some(Some(request.verification_channel_id)),
            unverified_role_id: request.unverified_role_id.map(Some),
            ..Default::default()
        };
        resolver.upsert(server_id, &patch).await?;
        resolver
            .add_role(&VerificationRole::new(server_id, request.verification_role_id))
            .await?;
        let policy = resolver.resolve(server_id).await?;

        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(
                    admin,
                    actor.display_name(),
                    server_id,
                    AuditStatus::Success,
                    format!(
                        "Verification system configured: role {}, channel {}",
                        request.verification_role_id, request.verification_channel_id
                    ),
                ),
                &policy,
            )
            .await;

        Ok(policy.into())
    }

    /// Effective policy for the server
    #[instrument(skip(self))]
    pub async fn get_config(&self, admin: Snowflake, server_id: Snowflake) -> ServiceResult<PolicyResponse> {
        self.authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;
        Ok(ConfigResolver::new(self.ctx).resolve(server_id).await?.into())
    }

    /// Apply a partial policy update
    #[instrument(skip(self, request))]
    pub async fn configure(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        request: UpdateConfigRequest,
    ) -> ServiceResult<PolicyResponse> {
        let actor = self
            .authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;

        let patch = ServerPolicyPatch::from(request);
        if patch.is_empty() {
            return Err(ServiceError::validation("No configuration changes provided"));
        }

        let policy = ConfigResolver::new(self.ctx).upsert(server_id, &patch).await?;
        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(
                    admin,
                    actor.display_name(),
                    server_id,
                    AuditStatus::Success,
                    format!("Configuration updated: {}", patch.describe().join(", ")),
                ),
                &policy,
            )
            .await;

        Ok(policy.into())
    }

    /// Add a verification role; succeeds if it is already configured
    #[instrument(skip(self, request))]
    pub async fn add_verification_role(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        role_id: Snowflake,
        request: AddRoleRequest,
    ) -> ServiceResult<RoleChangeResponse> {
        self.authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;

        let role = VerificationRole {
            role_name: request.role_name,
            role_color: request.role_color,
            ..VerificationRole::new(server_id, role_id)
        };
        let changed = ConfigResolver::new(self.ctx).add_role(&role).await?;
        info!(role_id = %role_id, changed, "Verification role added");

        Ok(RoleChangeResponse { role_id, changed })
    }

    /// Remove a verification role; succeeds if it is not configured
    #[instrument(skip(self))]
    pub async fn remove_verification_role(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        role_id: Snowflake,
    ) -> ServiceResult<RoleChangeResponse> {
        self.authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;

        let changed = ConfigResolver::new(self.ctx)
            .remove_role(server_id, role_id)
            .await?;
        info!(role_id = %role_id, changed, "Verification role removed");

        Ok(RoleChangeResponse { role_id, changed })
    }

    /// Most recent audit entries, newest first
    #[instrument(skip(self))]
    pub async fn recent_logs(
        &self,
        admin: Snowflake,
        server_id: Snowflake,
        query: RecentLogsQuery,
    ) -> ServiceResult<Vec<AuditEntryResponse>> {
        self.authorize(server_id, admin, Permissions::MANAGE_GUILD, "MANAGE_GUILD")
            .await?;

        let limit = query.limit().clamp(1, MAX_LOG_LIMIT);
        let entries = AuditLogger::new(self.ctx).recent(server_id, limit).await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }
}
