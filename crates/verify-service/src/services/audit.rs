//! Audit trail: append-only, never fails the caller

use tracing::{instrument, warn};

use verify_core::entities::{AuditEntry, AuditStatus, NewAuditEntry, ServerPolicy};
use verify_core::traits::Notice;
use verify_core::value_objects::Snowflake;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Records verification attempts
pub struct AuditLogger<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditLogger<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Append an entry; a store failure is only logged
    #[instrument(skip(self, entry), fields(server_id = %entry.server_id, status = %entry.status))]
    pub async fn record(&self, entry: NewAuditEntry) -> Option<AuditEntry> {
        match self.ctx.audit_repo().append(&entry).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(subject_id = %entry.subject_id, error = %e, "Failed to record audit entry");
                None
            }
        }
    }

    /// Append an entry and mirror it to the server's log channel, if one is set
    pub async fn record_and_announce(&self, entry: NewAuditEntry, policy: &ServerPolicy) {
        let notice = policy.log_channel_id.map(|channel| (channel, log_notice(&entry)));
        self.record(entry).await;

        if let Some((channel_id, notice)) = notice {
            if let Err(e) = self.ctx.platform().send_channel_message(channel_id, &notice).await {
                warn!(channel_id = %channel_id, error = %e, "Failed to post to log channel");
            }
        }
    }

    /// Newest entries first
    #[instrument(skip(self))]
    pub async fn recent(&self, server_id: Snowflake, limit: i64) -> ServiceResult<Vec<AuditEntry>> {
        Ok(self.ctx.audit_repo().list_by_server(server_id, limit).await?)
    }
}

fn log_notice(entry: &NewAuditEntry) -> Notice {
    let (title, color) = match entry.status {
        AuditStatus::Success => ("Verification Success", Notice::GREEN),
        AuditStatus::Failed => ("Verification Failed", Notice::RED),
        AuditStatus::Pending => ("Verification Pending", Notice::YELLOW),
    };

    let mut notice = Notice::new(title, entry.message.clone(), color)
        .field("User", format!("{} ({})", entry.display_name, entry.subject_id));
    if let Some(username) = &entry.external_username {
        notice = notice.field("Roblox Account", username.clone());
    }
    notice
}
