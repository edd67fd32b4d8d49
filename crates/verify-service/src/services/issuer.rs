//! Code issuance: one outstanding attempt per (subject, server)

use tracing::{debug, info, instrument};

use verify_core::entities::PendingVerification;
use verify_core::value_objects::Snowflake;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Issues verification codes
pub struct CodeIssuer<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CodeIssuer<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a fresh code, superseding any attempt outstanding for the key
    ///
    /// The hint is stored as given (trimmed); its plausibility is not checked.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        subject_id: Snowflake,
        server_id: Snowflake,
        username_hint: Option<String>,
    ) -> ServiceResult<PendingVerification> {
        let pending = PendingVerification::new(subject_id, server_id, username_hint);

        if let Some(superseded) = self.ctx.pending_repo().replace(&pending).await? {
            debug!(old_code = %superseded.code, "Superseded outstanding verification");
        }

        info!(
            subject_id = %subject_id,
            server_id = %server_id,
            code = %pending.code,
            expires_at = %pending.expires_at,
            "Verification code issued"
        );
        Ok(pending)
    }
}
