//! Member handle - a chat user's membership in a server, as seen by the bot

use crate::value_objects::{Permissions, Snowflake};

/// Snapshot of a server member fetched from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub username: String,
    pub global_name: Option<String>,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    /// Effective server-level permissions
    pub permissions: Permissions,
    /// Whether the bot outranks this member and may change their nickname
    pub manageable: bool,
    pub server_name: Option<String>,
}

impl Member {
    /// Create a member handle with no roles and no permissions
    pub fn new(server_id: Snowflake, user_id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            server_id,
            user_id,
            username: username.into(),
            global_name: None,
            nickname: None,
            role_ids: Vec::new(),
            permissions: Permissions::empty(),
            manageable: true,
            server_name: None,
        }
    }

    /// Name shown in the server: nickname, then global display name, then username
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.global_name.as_deref())
            .unwrap_or(&self.username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Record a role as held (no-op if already held)
    pub fn add_role(&mut self, role_id: Snowflake) {
        if !self.has_role(role_id) {
            self.role_ids.push(role_id);
        }
    }

    /// Record a role as no longer held
    pub fn remove_role(&mut self, role_id: Snowflake) {
        self.role_ids.retain(|&id| id != role_id);
    }

    /// Check a server-level permission (administrators pass everything)
    #[inline]
    pub fn can(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }
}
