//! Profile scanner
//!
//! Resolves which external accounts the subject may own, then looks for the
//! issued code in each account's profile text through an ordered chain of
//! fetch strategies. Every strategy may fail on its own; a failure is logged
//! and the chain moves on. Only failing to discover candidates at all is an
//! error.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use verify_core::entities::{ExternalAccount, PendingVerification};
use verify_core::error::DomainError;
use verify_core::traits::UpstreamResult;
use verify_core::value_objects::VerificationCode;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Result of scanning for a pending code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The code was found in this account's profile
    Matched(ExternalAccount),
    /// No candidate profile carries the code (yet)
    NoMatch,
    /// The pending attempt is past its expiry; nothing was fetched
    Expired,
}

impl ScanOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Ways of reading an account's profile text, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Description,
    ProfileInfo,
    ProfileMarkup,
    /// Only attempted when a session credential is configured
    Authenticated,
}

impl FetchStrategy {
    pub const CHAIN: [FetchStrategy; 4] = [
        Self::Description,
        Self::ProfileInfo,
        Self::ProfileMarkup,
        Self::Authenticated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::ProfileInfo => "profile_info",
            Self::ProfileMarkup => "profile_markup",
            Self::Authenticated => "authenticated",
        }
    }
}

/// One way of finding candidate accounts
#[derive(Debug, Clone, Copy)]
enum Discovery<'n> {
    Hint(&'n str),
    DisplayName(&'n str),
    Search(&'n str),
}

impl Discovery<'_> {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hint(_) => "hint",
            Self::DisplayName(_) => "display_name",
            Self::Search(_) => "search",
        }
    }
}

/// Strip a trailing `#1234` discriminator from a chat display name
pub fn strip_discriminator(name: &str) -> &str {
    let name = name.trim();
    match name.rsplit_once('#') {
        Some((base, tag)) if tag.len() == 4 && tag.bytes().all(|b| b.is_ascii_digit()) => {
            base.trim_end()
        }
        _ => name,
    }
}

/// Scans external profiles for an issued code
pub struct ProfileScanner<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileScanner<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Scan for the pending code, bounded by the configured scan deadline
    ///
    /// An expired attempt yields [`ScanOutcome::Expired`] whatever the
    /// profile says. A deadline overrun is a transient error.
    #[instrument(skip(self, pending), fields(subject_id = %pending.subject_id, server_id = %pending.server_id))]
    pub async fn scan(
        &self,
        pending: &PendingVerification,
        display_name: &str,
    ) -> ServiceResult<ScanOutcome> {
        if pending.is_expired_at(Utc::now()) {
            return Ok(ScanOutcome::Expired);
        }

        let deadline = self.ctx.scan().timeout;
        let scan = self.scan_candidates(pending, display_name);
        if let Ok(result) = tokio::time::timeout(deadline, scan).await {
            result
        } else {
            warn!(timeout_secs = deadline.as_secs(), "Profile scan timed out");
            Err(DomainError::UpstreamUnavailable("profile scan timed out".to_string()).into())
        }
    }

    async fn scan_candidates(
        &self,
        pending: &PendingVerification,
        display_name: &str,
    ) -> ServiceResult<ScanOutcome> {
        let candidates = self
            .discover(pending.username_hint.as_deref(), display_name)
            .await?;
        if candidates.is_empty() {
            info!("No candidate accounts found");
            return Ok(ScanOutcome::NoMatch);
        }

        let scanner = self;
        let code = &pending.code;
        // `buffered` yields in input order, so the lowest discovery index wins
        // and dropping the stream cancels checks still in flight.
        let mut checks = stream::iter(candidates)
            .map(move |account| async move {
                let hit = scanner.check_candidate(&account, code).await;
                (account, hit)
            })
            .buffered(self.ctx.scan().concurrency.max(1));

        while let Some((account, hit)) = checks.next().await {
            if hit {
                info!(account_id = %account.id, username = %account.username, "Code found in profile");
                return Ok(ScanOutcome::Matched(account));
            }
        }

        Ok(ScanOutcome::NoMatch)
    }

    /// Candidate accounts from the first discovery step that yields any
    async fn discover(
        &self,
        hint: Option<&str>,
        display_name: &str,
    ) -> ServiceResult<Vec<ExternalAccount>> {
        let hint = hint.map(str::trim).filter(|h| !h.is_empty());
        let base_name = strip_discriminator(display_name);

        let mut steps = Vec::with_capacity(3);
        if let Some(hint) = hint {
            steps.push(Discovery::Hint(hint));
        }
        if !base_name.is_empty() {
            if !hint.is_some_and(|h| h.eq_ignore_ascii_case(base_name)) {
                steps.push(Discovery::DisplayName(base_name));
            }
            steps.push(Discovery::Search(base_name));
        }

        let directory = self.ctx.directory();
        let mut rejected = None;
        for step in steps {
            let result = match step {
                Discovery::Hint(name) | Discovery::DisplayName(name) => {
                    directory.lookup_by_name(name).await
                }
                Discovery::Search(keyword) => {
                    directory.search(keyword, self.ctx.scan().search_limit).await
                }
            };

            match result {
                Ok(accounts) if !accounts.is_empty() => {
                    debug!(step = step.as_str(), count = accounts.len(), "Candidates discovered");
                    return Ok(dedup_by_id(accounts));
                }
                Ok(_) => debug!(step = step.as_str(), "No candidates from step"),
                Err(e) if e.is_network() => {
                    warn!(step = step.as_str(), error = %e, "Candidate discovery failed");
                    return Err(ServiceError::upstream("candidate discovery", &e));
                }
                Err(e) => {
                    warn!(step = step.as_str(), error = %e, "Discovery step rejected");
                    rejected = Some(e);
                }
            }
        }

        // An empty result only counts as "no candidates" when every step answered
        match rejected {
            Some(e) => Err(ServiceError::upstream("candidate discovery", &e)),
            None => Ok(Vec::new()),
        }
    }

    /// Run the strategy chain for one account; `true` on the first hit
    async fn check_candidate(&self, account: &ExternalAccount, code: &VerificationCode) -> bool {
        let session_configured = self.ctx.scan().session.is_some();
        for strategy in FetchStrategy::CHAIN {
            if strategy == FetchStrategy::Authenticated && !session_configured {
                continue;
            }
            match self.fetch(strategy, &account.id).await {
                Ok(Some(text)) if code.is_contained_in(&text) => {
                    debug!(account_id = %account.id, strategy = strategy.as_str(), "Strategy matched");
                    return true;
                }
                Ok(_) => {
                    debug!(account_id = %account.id, strategy = strategy.as_str(), "Code not present");
                }
                Err(e) => {
                    warn!(
                        account_id = %account.id,
                        strategy = strategy.as_str(),
                        error = %e,
                        "Profile fetch failed"
                    );
                }
            }
        }
        false
    }

    async fn fetch(&self, strategy: FetchStrategy, account_id: &str) -> UpstreamResult<Option<String>> {
        let directory = self.ctx.directory();
        let session = self.ctx.scan().session.as_ref();
        match strategy {
            FetchStrategy::Description => directory.fetch_description(account_id).await,
            FetchStrategy::ProfileInfo => directory.fetch_profile_info(account_id).await,
            FetchStrategy::ProfileMarkup => directory
                .fetch_profile_markup(account_id, session)
                .await
                .map(Some),
            FetchStrategy::Authenticated => match session {
                Some(session) => directory.fetch_authenticated_profile(account_id, session).await,
                None => Ok(None),
            },
        }
    }
}

fn dedup_by_id(accounts: Vec<ExternalAccount>) -> Vec<ExternalAccount> {
    let mut seen = std::collections::HashSet::new();
    accounts
        .into_iter()
        .filter(|account| seen.insert(account.id.clone()))
        .collect()
}
