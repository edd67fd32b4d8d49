//! Verification service
//!
//! Member-facing operations: start, check, update, cancel and status.

use chrono::Utc;
use tracing::{info, instrument, warn};

use verify_core::entities::{
    AuditStatus, ExternalAccount, NewAuditEntry, PendingVerification, ServerPolicy,
};
use verify_core::error::DomainError;
use verify_core::value_objects::Snowflake;

use crate::dto::{
    CheckVerificationRequest, CheckVerificationResponse, LinkResponse, StartVerificationRequest,
    StartVerificationResponse, StatusResponse,
};

use super::audit::AuditLogger;
use super::completer::VerificationCompleter;
use super::config_resolver::ConfigResolver;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::issuer::CodeIssuer;
use super::scanner::{ProfileScanner, ScanOutcome};

/// Verification service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    /// Create a new VerificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a code for the member, optionally naming the account they claim
    ///
    /// An existing link stays in place until a new verification completes.
    #[instrument(skip(self, request))]
    pub async fn start_verification(
        &self,
        actor: Snowflake,
        server_id: Snowflake,
        request: StartVerificationRequest,
    ) -> ServiceResult<StartVerificationResponse> {
        let policy = ConfigResolver::new(self.ctx).resolve(server_id).await?;
        let current = self.ctx.link_repo().find(actor, server_id).await?;
        if let Some(link) = &current {
            if !policy.allow_reverification {
                return Err(DomainError::ReverificationDisabled {
                    external_username: link.external_username.clone(),
                }
                .into());
            }
        }

        let pending = CodeIssuer::new(self.ctx)
            .issue(actor, server_id, request.username)
            .await?;

        let preview = match pending.username_hint.as_deref() {
            Some(hint) => self.preview(hint).await,
            None => None,
        };

        let display_name = request.display_name.unwrap_or_else(|| actor.to_string());
        let message = format!("Verification initiated with code {}", pending.code);
        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(actor, display_name, server_id, AuditStatus::Pending, message)
                    .with_external_username(pending.username_hint.clone()),
                &policy,
            )
            .await;

        Ok(StartVerificationResponse {
            pending: (&pending).into(),
            preview: preview.as_ref().map(Into::into),
            current_link: current.as_ref().map(Into::into),
        })
    }

    /// Scan for the issued code and complete the link on a match
    #[instrument(skip(self, request))]
    pub async fn check_verification(
        &self,
        actor: Snowflake,
        server_id: Snowflake,
        request: CheckVerificationRequest,
    ) -> ServiceResult<CheckVerificationResponse> {
        let Some(pending) = self.ctx.pending_repo().find(actor, server_id).await? else {
            return match self.ctx.link_repo().find(actor, server_id).await? {
                Some(link) => Ok(CheckVerificationResponse::AlreadyVerified {
                    link: LinkResponse::from(&link),
                }),
                None => Err(DomainError::NoPendingVerification.into()),
            };
        };

        let policy = ConfigResolver::new(self.ctx).resolve(server_id).await?;
        if pending.is_expired_at(Utc::now()) {
            let display_name = request.display_name.unwrap_or_else(|| actor.to_string());
            return Err(self.expire(&pending, display_name, &policy).await);
        }

        let member = self
            .ctx
            .platform()
            .fetch_member(server_id, actor)
            .await
            .map_err(|e| ServiceError::upstream("member lookup", &e))?
            .ok_or(DomainError::MemberNotFound)?;
        let audit_name = member.display_name().to_string();
        // Discovery uses the account handle; server nicknames rarely match an external name
        let scan_name = request
            .display_name
            .unwrap_or_else(|| member.username.clone());

        let audit = AuditLogger::new(self.ctx);
        let outcome = match ProfileScanner::new(self.ctx).scan(&pending, &scan_name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_transient() {
                    audit
                        .record_and_announce(
                            NewAuditEntry::new(
                                actor,
                                audit_name,
                                server_id,
                                AuditStatus::Failed,
                                format!("Profile check failed: {e}"),
                            ),
                            &policy,
                        )
                        .await;
                }
                return Err(e);
            }
        };

        match outcome {
            ScanOutcome::Expired => Err(self.expire(&pending, audit_name, &policy).await),
            ScanOutcome::NoMatch => {
                audit
                    .record(NewAuditEntry::new(
                        actor,
                        audit_name,
                        server_id,
                        AuditStatus::Failed,
                        "Verification code not found in profile",
                    ))
                    .await;
                Ok(CheckVerificationResponse::NotYetVerified {
                    code: pending.code.to_string(),
                    expires_at: pending.expires_at,
                })
            }
            ScanOutcome::Matched(account) => {
                let report = VerificationCompleter::new(self.ctx)
                    .complete(&pending, &account, &policy, &member)
                    .await?;

                audit
                    .record_and_announce(
                        NewAuditEntry::new(
                            actor,
                            audit_name,
                            server_id,
                            AuditStatus::Success,
                            format!("Verified as {}", account.username),
                        )
                        .with_external_username(Some(account.username.clone())),
                        &policy,
                    )
                    .await;

                Ok(CheckVerificationResponse::Verified {
                    link: LinkResponse::from(&report.link),
                    completion: (&report).into(),
                })
            }
        }
    }

    /// Issue a fresh code for an already linked member
    #[instrument(skip(self, request))]
    pub async fn start_update(
        &self,
        actor: Snowflake,
        server_id: Snowflake,
        request: StartVerificationRequest,
    ) -> ServiceResult<StartVerificationResponse> {
        let link = self
            .ctx
            .link_repo()
            .find(actor, server_id)
            .await?
            .ok_or(DomainError::NotVerified)?;

        let pending = CodeIssuer::new(self.ctx).issue(actor, server_id, None).await?;

        let policy = ConfigResolver::new(self.ctx).resolve(server_id).await?;
        let display_name = request.display_name.unwrap_or_else(|| actor.to_string());
        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(
                    actor,
                    display_name,
                    server_id,
                    AuditStatus::Pending,
                    "Verification update initiated",
                )
                .with_external_username(Some(link.external_username.clone())),
                &policy,
            )
            .await;

        Ok(StartVerificationResponse {
            pending: (&pending).into(),
            preview: None,
            current_link: Some((&link).into()),
        })
    }

    /// Drop the outstanding attempt
    #[instrument(skip(self))]
    pub async fn cancel_verification(&self, actor: Snowflake, server_id: Snowflake) -> ServiceResult<()> {
        if !self.ctx.pending_repo().delete(actor, server_id).await? {
            return Err(DomainError::NoPendingVerification.into());
        }

        info!(subject_id = %actor, server_id = %server_id, "Verification cancelled");
        AuditLogger::new(self.ctx)
            .record(NewAuditEntry::new(
                actor,
                actor.to_string(),
                server_id,
                AuditStatus::Failed,
                "Verification cancelled",
            ))
            .await;
        Ok(())
    }

    /// Current link and outstanding attempt; an expired attempt reads as none
    #[instrument(skip(self))]
    pub async fn status(&self, actor: Snowflake, server_id: Snowflake) -> ServiceResult<StatusResponse> {
        let link = self.ctx.link_repo().find(actor, server_id).await?;
        let now = Utc::now();
        let pending = self
            .ctx
            .pending_repo()
            .find(actor, server_id)
            .await?
            .filter(|p| !p.is_expired_at(now));

        Ok(StatusResponse {
            verified: link.is_some(),
            link: link.as_ref().map(Into::into),
            pending: pending.as_ref().map(Into::into),
        })
    }

    async fn preview(&self, username: &str) -> Option<ExternalAccount> {
        match self.ctx.directory().lookup_by_name(username).await {
            Ok(accounts) => accounts.into_iter().next(),
            Err(e) => {
                warn!(username, error = %e, "Preview lookup failed");
                None
            }
        }
    }

    /// Retire an expired attempt, record it, and return the error to surface
    async fn expire(
        &self,
        pending: &PendingVerification,
        display_name: String,
        policy: &ServerPolicy,
    ) -> ServiceError {
        if let Err(e) = self
            .ctx
            .pending_repo()
            .delete_if_code(pending.subject_id, pending.server_id, &pending.code)
            .await
        {
            warn!(error = %e, "Failed to remove expired verification");
        }

        AuditLogger::new(self.ctx)
            .record_and_announce(
                NewAuditEntry::new(
                    pending.subject_id,
                    display_name,
                    pending.server_id,
                    AuditStatus::Failed,
                    "Verification code expired",
                ),
                policy,
            )
            .await;

        DomainError::VerificationExpired.into()
    }
}
