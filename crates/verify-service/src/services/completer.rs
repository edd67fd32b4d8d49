//! Applies the effects of a positive match
//!
//! Only persisting the link and retiring the pending attempt must succeed.
//! Role changes, the rename and the confirmation DM are attempted and
//! reported, and never undo the persisted link.

use tracing::{debug, info, instrument, warn};

use verify_core::entities::{ExternalAccount, Member, PendingVerification, ServerPolicy, VerifiedLink};
use verify_core::traits::Notice;
use verify_core::value_objects::Snowflake;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// What completion actually changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub link: VerifiedLink,
    pub roles_added: Vec<Snowflake>,
    pub roles_removed: Vec<Snowflake>,
    /// Role changes the platform rejected
    pub roles_failed: Vec<Snowflake>,
    pub renamed: bool,
    pub notified: bool,
}

/// Completes a verification
pub struct VerificationCompleter<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationCompleter<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip_all, fields(subject_id = %pending.subject_id, server_id = %pending.server_id, account_id = %account.id))]
    pub async fn complete(
        &self,
        pending: &PendingVerification,
        account: &ExternalAccount,
        policy: &ServerPolicy,
        member: &Member,
    ) -> ServiceResult<CompletionReport> {
        let platform = self.ctx.platform();
        let (server_id, user_id) = (pending.server_id, pending.subject_id);

        let mut roles_added = Vec::new();
        let mut roles_removed = Vec::new();
        let mut roles_failed = Vec::new();

        for role_id in policy.verification_role_ids() {
            if member.has_role(role_id) {
                continue;
            }
            match platform.add_role(server_id, user_id, role_id).await {
                Ok(()) => roles_added.push(role_id),
                Err(e) => {
                    warn!(role_id = %role_id, error = %e, "Failed to add verification role");
                    roles_failed.push(role_id);
                }
            }
        }

        if let Some(role_id) = policy.unverified_role_id.filter(|&r| member.has_role(r)) {
            match platform.remove_role(server_id, user_id, role_id).await {
                Ok(()) => roles_removed.push(role_id),
                Err(e) => {
                    warn!(role_id = %role_id, error = %e, "Failed to remove unverified role");
                    roles_failed.push(role_id);
                }
            }
        }

        let link = VerifiedLink::new(
            user_id,
            server_id,
            account.id.clone(),
            account.username.clone(),
            pending.code.clone(),
        );
        self.ctx.link_repo().replace(&link).await?;

        if !self
            .ctx
            .pending_repo()
            .delete_if_code(user_id, server_id, &pending.code)
            .await?
        {
            debug!("Pending attempt was already replaced or removed");
        }

        let renamed = self.rename(member, &account.username).await;
        let notified = policy.dm_on_verification && self.notify(member, account).await;

        info!(
            username = %account.username,
            roles_added = roles_added.len(),
            roles_failed = roles_failed.len(),
            renamed,
            notified,
            "Verification completed"
        );

        Ok(CompletionReport {
            link,
            roles_added,
            roles_removed,
            roles_failed,
            renamed,
            notified,
        })
    }

    async fn rename(&self, member: &Member, username: &str) -> bool {
        if !member.manageable {
            debug!("Member outranks the bot; skipping rename");
            return false;
        }
        if member.nickname.as_deref() == Some(username) {
            return true;
        }
        match self
            .ctx
            .platform()
            .set_display_name(member.server_id, member.user_id, username)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to update nickname");
                false
            }
        }
    }

    async fn notify(&self, member: &Member, account: &ExternalAccount) -> bool {
        let description = match member.server_name.as_deref() {
            Some(server) => format!(
                "You have been successfully verified as **{}** in {server}",
                account.username
            ),
            None => format!("You have been successfully verified as **{}**", account.username),
        };
        let notice = Notice::new("Verification Successful", description, Notice::GREEN)
            .field("Account ID", account.id.clone());

        match self.ctx.platform().send_direct_message(member.user_id, &notice).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send verification DM");
                false
            }
        }
    }
}
