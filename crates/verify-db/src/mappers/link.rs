//! VerifiedLink entity <-> model mapper

use verify_core::entities::VerifiedLink;
use verify_core::error::DomainError;
use verify_core::value_objects::{Snowflake, VerificationCode};

use crate::models::VerifiedLinkModel;

impl TryFrom<VerifiedLinkModel> for VerifiedLink {
    type Error = DomainError;

    fn try_from(model: VerifiedLinkModel) -> Result<Self, Self::Error> {
        let code = VerificationCode::parse(&model.code)
            .map_err(|e| DomainError::DatabaseError(format!("corrupt link row {}: {e}", model.id)))?;

        Ok(VerifiedLink {
            subject_id: Snowflake::new(model.subject_id),
            server_id: Snowflake::new(model.server_id),
            external_id: model.external_id,
            external_username: model.external_username,
            verified_at: model.verified_at,
            code,
        })
    }
}
