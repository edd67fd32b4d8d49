//! Roblox web API implementation of IdentityDirectory

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use verify_core::entities::ExternalAccount;
use verify_core::traits::{IdentityDirectory, UpstreamResult};
use verify_core::value_objects::SessionCredential;

use crate::http::{
    build_client, join, map_send_error, optional_success, read_json, require_success, HttpSettings,
};

/// Profile pages are only served in full to browser-like clients
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Page sizes the search endpoint accepts
const SEARCH_PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];

/// Client for the Roblox users, web and friends APIs
#[derive(Clone)]
pub struct RobloxDirectory {
    http: reqwest::Client,
    users_api: String,
    web_base: String,
    friends_api: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernamesRequest<'a> {
    usernames: [&'a str; 1],
    exclude_banned_users: bool,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    id: u64,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<UserSummary> for ExternalAccount {
    fn from(user: UserSummary) -> Self {
        ExternalAccount {
            id: user.id.to_string(),
            username: user.name,
            display_name: user.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserDetails {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileHeader {
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

impl RobloxDirectory {
    /// Create a directory client against explicit base URLs
    pub fn new(
        users_api: impl Into<String>,
        web_base: impl Into<String>,
        friends_api: impl Into<String>,
        settings: HttpSettings,
    ) -> Self {
        Self {
            http: build_client(settings, BROWSER_USER_AGENT),
            users_api: users_api.into(),
            web_base: web_base.into(),
            friends_api: friends_api.into(),
        }
    }

    /// Create a directory client from application configuration
    pub fn from_config(config: &verify_common::IdentityConfig) -> Self {
        Self::new(
            config.users_api.clone(),
            config.web_base.clone(),
            config.friends_api.clone(),
            HttpSettings::from(config),
        )
    }

    fn page_size(limit: u32) -> u32 {
        SEARCH_PAGE_SIZES
            .into_iter()
            .find(|&size| size >= limit)
            .unwrap_or(SEARCH_PAGE_SIZES[SEARCH_PAGE_SIZES.len() - 1])
    }
}

#[async_trait]
impl IdentityDirectory for RobloxDirectory {
    #[instrument(skip(self))]
    async fn lookup_by_name(&self, username: &str) -> UpstreamResult<Vec<ExternalAccount>> {
        let response = self
            .http
            .post(join(&self.users_api, "/v1/usernames/users"))
            .json(&UsernamesRequest {
                usernames: [username],
                exclude_banned_users: true,
            })
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        let envelope: DataEnvelope<UserSummary> = read_json(require_success(response)?).await?;
        Ok(envelope.data.into_iter().map(ExternalAccount::from).collect())
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str, limit: u32) -> UpstreamResult<Vec<ExternalAccount>> {
        let limit = limit.max(1);
        let page_size = Self::page_size(limit).to_string();
        let response = self
            .http
            .get(join(&self.users_api, "/v1/users/search"))
            .query(&[("keyword", keyword), ("limit", page_size.as_str())])
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        let envelope: DataEnvelope<UserSummary> = read_json(require_success(response)?).await?;
        Ok(envelope
            .data
            .into_iter()
            .take(limit as usize)
            .map(ExternalAccount::from)
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_description(&self, account_id: &str) -> UpstreamResult<Option<String>> {
        let response = self
            .http
            .get(join(&self.users_api, &format!("/v1/users/{account_id}")))
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        match optional_success(response)? {
            Some(response) => Ok(read_json::<UserDetails>(response).await?.description),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_profile_info(&self, account_id: &str) -> UpstreamResult<Option<String>> {
        let response = self
            .http
            .get(join(&self.web_base, "/users/profile/profileheader-json"))
            .query(&[("userId", account_id)])
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        match optional_success(response)? {
            Some(response) => Ok(read_json::<ProfileHeader>(response).await?.description),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, session), fields(authenticated = session.is_some()))]
    async fn fetch_profile_markup(
        &self,
        account_id: &str,
        session: Option<&SessionCredential>,
    ) -> UpstreamResult<String> {
        let mut request = self
            .http
            .get(join(&self.web_base, &format!("/users/{account_id}/profile")))
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        if let Some(session) = session {
            request = request.header(COOKIE, format!(".ROBLOSECURITY={}", session.expose()));
        }

        let response = request.send().await.map_err(|e| map_send_error(&e))?;
        let body = require_success(response)?
            .text()
            .await
            .map_err(|e| map_send_error(&e))?;
        debug!(bytes = body.len(), "Fetched profile markup");
        Ok(body)
    }

    #[instrument(skip(self, session))]
    async fn fetch_authenticated_profile(
        &self,
        account_id: &str,
        session: &SessionCredential,
    ) -> UpstreamResult<Option<String>> {
        let response = self
            .http
            .get(join(&self.friends_api, &format!("/v1/users/{account_id}")))
            .header(COOKIE, format!(".ROBLOSECURITY={}", session.expose()))
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        match optional_success(response)? {
            Some(response) => Ok(read_json::<UserDetails>(response).await?.description),
            None => Ok(None),
        }
    }
}
