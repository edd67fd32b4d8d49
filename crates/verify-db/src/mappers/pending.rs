//! PendingVerification entity <-> model mapper

use verify_core::entities::PendingVerification;
use verify_core::error::DomainError;
use verify_core::value_objects::{Snowflake, VerificationCode};

use crate::models::PendingVerificationModel;

impl TryFrom<PendingVerificationModel> for PendingVerification {
    type Error = DomainError;

    fn try_from(model: PendingVerificationModel) -> Result<Self, Self::Error> {
        let code = VerificationCode::parse(&model.code)
            .map_err(|e| DomainError::DatabaseError(format!("corrupt pending row: {e}")))?;

        Ok(PendingVerification {
            subject_id: Snowflake::new(model.subject_id),
            server_id: Snowflake::new(model.server_id),
            code,
            created_at: model.created_at,
            expires_at: model.expires_at,
            username_hint: model.username_hint,
        })
    }
}
