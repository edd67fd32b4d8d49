//! Discord REST implementation of ChatPlatform

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use verify_core::entities::Member;
use verify_core::traits::{ChatPlatform, Notice, UpstreamResult};
use verify_core::value_objects::{Permissions, Snowflake};

use crate::http::{
    build_client, join, map_send_error, optional_success, read_json, require_success, HttpSettings,
};

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/verify-bot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Longest nickname the platform accepts
pub const MAX_NICKNAME_CHARS: usize = 32;

/// REST client for the Discord bot API
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    auth: HeaderValue,
    bot_id: OnceCell<Snowflake>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UserObject {
    id: Snowflake,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberObject {
    user: UserObject,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    roles: Vec<Snowflake>,
}

#[derive(Debug, Deserialize)]
struct RoleObject {
    id: Snowflake,
    permissions: Permissions,
    #[serde(default)]
    position: i32,
}

#[derive(Debug, Deserialize)]
struct GuildObject {
    #[serde(default)]
    name: Option<String>,
    owner_id: Snowflake,
    #[serde(default)]
    roles: Vec<RoleObject>,
}

#[derive(Debug, Deserialize)]
struct ChannelObject {
    id: Snowflake,
}

#[derive(Debug, Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
    fields: Vec<EmbedField<'a>>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    embeds: [Embed<'a>; 1],
}

impl<'a> From<&'a Notice> for MessagePayload<'a> {
    fn from(notice: &'a Notice) -> Self {
        Self {
            embeds: [Embed {
                title: &notice.title,
                description: &notice.description,
                color: notice.color,
                fields: notice
                    .fields
                    .iter()
                    .map(|(name, value)| EmbedField {
                        name,
                        value,
                        inline: false,
                    })
                    .collect(),
                timestamp: Utc::now().to_rfc3339(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct NicknamePatch<'a> {
    nick: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenDm {
    recipient_id: Snowflake,
}

// ============================================================================
// Client
// ============================================================================

impl DiscordClient {
    /// Create a client for the given bot token
    pub fn new(api_base: impl Into<String>, token: &str, settings: HttpSettings) -> Self {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}")).unwrap_or_else(|e| {
            warn!(error = %e, "bot token is not a valid header value");
            HeaderValue::from_static("")
        });
        auth.set_sensitive(true);

        Self {
            http: build_client(settings, USER_AGENT),
            api_base: api_base.into(),
            auth,
            bot_id: OnceCell::new(),
        }
    }

    /// Create a client from application configuration
    pub fn from_config(config: &verify_common::DiscordConfig, settings: HttpSettings) -> Self {
        Self::new(config.api_base.clone(), &config.token, settings)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, join(&self.api_base, path))
            .header(AUTHORIZATION, self.auth.clone())
    }

    async fn send(&self, builder: RequestBuilder) -> UpstreamResult<reqwest::Response> {
        builder.send().await.map_err(|e| map_send_error(&e))
    }

    async fn fetch_member_object(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<MemberObject>> {
        let response = self
            .send(self.request(
                reqwest::Method::GET,
                &format!("/guilds/{server_id}/members/{user_id}"),
            ))
            .await?;
        match optional_success(response)? {
            Some(response) => Ok(Some(read_json(response).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_guild(&self, server_id: Snowflake) -> UpstreamResult<GuildObject> {
        let response = self
            .send(self.request(reqwest::Method::GET, &format!("/guilds/{server_id}")))
            .await?;
        read_json(require_success(response)?).await
    }

    async fn bot_id(&self) -> UpstreamResult<Snowflake> {
        self.bot_id
            .get_or_try_init(|| async {
                let response = self
                    .send(self.request(reqwest::Method::GET, "/users/@me"))
                    .await?;
                let me: UserObject = read_json(require_success(response)?).await?;
                debug!(bot_id = %me.id, "Resolved bot identity");
                Ok(me.id)
            })
            .await
            .copied()
    }

    async fn post_message(&self, channel_id: Snowflake, notice: &Notice) -> UpstreamResult<()> {
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/channels/{channel_id}/messages"),
                )
                .json(&MessagePayload::from(notice)),
            )
            .await?;
        require_success(response)?;
        Ok(())
    }
}

/// Effective guild permissions: owner gets everything, otherwise @everyone plus member roles
fn effective_permissions(
    guild: &GuildObject,
    server_id: Snowflake,
    member: &MemberObject,
) -> Permissions {
    if guild.owner_id == member.user.id {
        return Permissions::all();
    }
    guild
        .roles
        .iter()
        .filter(|role| role.id == server_id || member.roles.contains(&role.id))
        .map(|role| role.permissions)
        .collect()
}

/// Highest role position a member holds (0 for @everyone only)
fn top_position(positions: &HashMap<Snowflake, i32>, roles: &[Snowflake]) -> i32 {
    roles
        .iter()
        .filter_map(|id| positions.get(id).copied())
        .max()
        .unwrap_or(0)
}

/// Trim a nickname to the platform limit on a character boundary
pub fn truncate_nickname(name: &str) -> &str {
    match name.char_indices().nth(MAX_NICKNAME_CHARS) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    #[instrument(skip(self))]
    async fn fetch_member(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<Member>> {
        let Some(object) = self.fetch_member_object(server_id, user_id).await? else {
            return Ok(None);
        };
        let guild = self.fetch_guild(server_id).await?;
        let positions: HashMap<Snowflake, i32> =
            guild.roles.iter().map(|r| (r.id, r.position)).collect();

        let manageable = if object.user.id == guild.owner_id {
            false
        } else {
            let bot_id = self.bot_id().await?;
            if bot_id == guild.owner_id {
                true
            } else {
                let bot_roles = self
                    .fetch_member_object(server_id, bot_id)
                    .await?
                    .map(|m| m.roles)
                    .unwrap_or_default();
                top_position(&positions, &bot_roles) > top_position(&positions, &object.roles)
            }
        };

        let permissions = effective_permissions(&guild, server_id, &object);
        let mut member = Member::new(server_id, object.user.id, object.user.username);
        member.global_name = object.user.global_name;
        member.nickname = object.nick;
        member.role_ids = object.roles;
        member.permissions = permissions;
        member.manageable = manageable;
        member.server_name = guild.name;
        Ok(Some(member))
    }

    #[instrument(skip(self))]
    async fn add_role(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        let response = self
            .send(self.request(
                reqwest::Method::PUT,
                &format!("/guilds/{server_id}/members/{user_id}/roles/{role_id}"),
            ))
            .await?;
        require_success(response)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_role(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        let response = self
            .send(self.request(
                reqwest::Method::DELETE,
                &format!("/guilds/{server_id}/members/{user_id}/roles/{role_id}"),
            ))
            .await?;
        require_success(response)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_display_name(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        name: &str,
    ) -> UpstreamResult<()> {
        let response = self
            .send(
                self.request(
                    reqwest::Method::PATCH,
                    &format!("/guilds/{server_id}/members/{user_id}"),
                )
                .json(&NicknamePatch {
                    nick: truncate_nickname(name),
                }),
            )
            .await?;
        require_success(response)?;
        Ok(())
    }

    #[instrument(skip(self, notice), fields(title = %notice.title))]
    async fn send_direct_message(&self, user_id: Snowflake, notice: &Notice) -> UpstreamResult<()> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/users/@me/channels")
                    .json(&OpenDm {
                        recipient_id: user_id,
                    }),
            )
            .await?;
        let channel: ChannelObject = read_json(require_success(response)?).await?;
        self.post_message(channel.id, notice).await
    }

    #[instrument(skip(self, notice), fields(title = %notice.title))]
    async fn send_channel_message(
        &self,
        channel_id: Snowflake,
        notice: &Notice,
    ) -> UpstreamResult<()> {
        self.post_message(channel_id, notice).await
    }
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}
