//! ServerPolicy entity <-> model mapper

use verify_core::entities::{ServerPolicy, VerificationRole};
use verify_core::value_objects::Snowflake;

use crate::models::{ServerConfigModel, VerificationRoleModel};

impl From<VerificationRoleModel> for VerificationRole {
    fn from(model: VerificationRoleModel) -> Self {
        VerificationRole {
            server_id: Snowflake::new(model.server_id),
            role_id: Snowflake::new(model.role_id),
            role_name: model.role_name,
            role_color: model.role_color,
        }
    }
}

/// Build the policy entity from its config row and role rows
pub fn policy_with_roles(model: ServerConfigModel, roles: Vec<VerificationRoleModel>) -> ServerPolicy {
    ServerPolicy {
        server_id: Snowflake::new(model.server_id),
        verification_roles: roles.into_iter().map(VerificationRole::from).collect(),
        unverified_role_id: model.unverified_role_id.map(Snowflake::new),
        verification_channel_id: model.verification_channel_id.map(Snowflake::new),
        log_channel_id: model.log_channel_id.map(Snowflake::new),
        auto_kick_unverified: model.auto_kick_unverified,
        dm_on_verification: model.dm_on_verification,
        allow_reverification: model.allow_reverification,
        updated_at: Some(model.updated_at),
    }
}
