//! AuditEntry entity <-> model mapper

use verify_core::entities::{AuditEntry, AuditStatus};
use verify_core::error::DomainError;
use verify_core::value_objects::Snowflake;

use crate::models::AuditLogModel;

impl TryFrom<AuditLogModel> for AuditEntry {
    type Error = DomainError;

    fn try_from(model: AuditLogModel) -> Result<Self, Self::Error> {
        let status = AuditStatus::parse(&model.status).ok_or_else(|| {
            DomainError::DatabaseError(format!("unknown log status: {}", model.status))
        })?;

        Ok(AuditEntry {
            id: model.id,
            subject_id: Snowflake::new(model.subject_id),
            display_name: model.display_name,
            external_username: model.external_username,
            server_id: Snowflake::new(model.server_id),
            status,
            message: model.message,
            timestamp: model.created_at,
        })
    }
}
