//! Entity to DTO mappers

use verify_core::entities::{
    AuditEntry, ExternalAccount, PendingVerification, ServerPolicy, VerificationRole, VerifiedLink,
};

use crate::services::CompletionReport;

use super::responses::{
    AuditEntryResponse, CompletionResponse, ExternalAccountResponse, LinkResponse,
    PendingResponse, PolicyResponse, RoleResponse,
};

impl From<&ExternalAccount> for ExternalAccountResponse {
    fn from(account: &ExternalAccount) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            display_name: account.display_name.clone(),
        }
    }
}

impl From<&PendingVerification> for PendingResponse {
    fn from(pending: &PendingVerification) -> Self {
        Self {
            code: pending.code.to_string(),
            created_at: pending.created_at,
            expires_at: pending.expires_at,
            username_hint: pending.username_hint.clone(),
        }
    }
}

impl From<&VerifiedLink> for LinkResponse {
    fn from(link: &VerifiedLink) -> Self {
        Self {
            subject_id: link.subject_id,
            server_id: link.server_id,
            external_id: link.external_id.clone(),
            external_username: link.external_username.clone(),
            verified_at: link.verified_at,
        }
    }
}

impl From<&CompletionReport> for CompletionResponse {
    fn from(report: &CompletionReport) -> Self {
        Self {
            roles_added: report.roles_added.clone(),
            roles_removed: report.roles_removed.clone(),
            roles_failed: report.roles_failed.clone(),
            renamed: report.renamed,
            notified: report.notified,
        }
    }
}

impl From<&VerificationRole> for RoleResponse {
    fn from(role: &VerificationRole) -> Self {
        Self {
            role_id: role.role_id,
            role_name: role.role_name.clone(),
            role_color: role.role_color,
        }
    }
}

impl From<ServerPolicy> for PolicyResponse {
    fn from(policy: ServerPolicy) -> Self {
        Self {
            server_id: policy.server_id,
            verification_roles: policy.verification_roles.iter().map(RoleResponse::from).collect(),
            unverified_role_id: policy.unverified_role_id,
            verification_channel_id: policy.verification_channel_id,
            log_channel_id: policy.log_channel_id,
            auto_kick_unverified: policy.auto_kick_unverified,
            dm_on_verification: policy.dm_on_verification,
            allow_reverification: policy.allow_reverification,
            stored: policy.is_stored(),
            updated_at: policy.updated_at,
        }
    }
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            subject_id: entry.subject_id,
            display_name: entry.display_name,
            external_username: entry.external_username,
            status: entry.status,
            message: entry.message,
            timestamp: entry.timestamp,
        }
    }
}
