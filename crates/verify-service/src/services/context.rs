//! Service context - dependency container for services
//!
//! Every service borrows its repositories and outbound clients from here.

use std::sync::Arc;
use std::time::Duration;

use verify_common::{IdentityConfig, ScanSettings};
use verify_core::traits::{
    AuditLogRepository, ChatPlatform, IdentityDirectory, PendingVerificationRepository,
    ServerPolicyRepository, VerifiedLinkRepository,
};
use verify_core::value_objects::SessionCredential;

use super::error::{ServiceError, ServiceResult};

/// Settings injected into the profile scanner at construction
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Enables the authenticated fetch strategy when present
    pub session: Option<SessionCredential>,
    /// Candidates checked at once; results are still consumed in discovery order
    pub concurrency: usize,
    /// Cap on fuzzy search results
    pub search_limit: u32,
    /// Deadline for one whole scan
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            session: None,
            concurrency: 1,
            search_limit: 10,
            timeout: Duration::from_secs(25),
        }
    }
}

impl ScanConfig {
    /// Build from the loaded application configuration
    pub fn from_settings(scan: &ScanSettings, identity: &IdentityConfig) -> Self {
        Self {
            session: identity.session_cookie.clone().and_then(SessionCredential::new),
            concurrency: scan.concurrency.max(1),
            search_limit: scan.search_limit,
            timeout: Duration::from_secs(scan.timeout_secs),
        }
    }
}

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    pending_repo: Arc<dyn PendingVerificationRepository>,
    link_repo: Arc<dyn VerifiedLinkRepository>,
    policy_repo: Arc<dyn ServerPolicyRepository>,
    audit_repo: Arc<dyn AuditLogRepository>,

    // External collaborators
    platform: Arc<dyn ChatPlatform>,
    directory: Arc<dyn IdentityDirectory>,

    scan: ScanConfig,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        pending_repo: Arc<dyn PendingVerificationRepository>,
        link_repo: Arc<dyn VerifiedLinkRepository>,
        policy_repo: Arc<dyn ServerPolicyRepository>,
        audit_repo: Arc<dyn AuditLogRepository>,
        platform: Arc<dyn ChatPlatform>,
        directory: Arc<dyn IdentityDirectory>,
        scan: ScanConfig,
    ) -> Self {
        Self {
            pending_repo,
            link_repo,
            policy_repo,
            audit_repo,
            platform,
            directory,
            scan,
        }
    }

    // === Repositories ===

    pub fn pending_repo(&self) -> &dyn PendingVerificationRepository {
        self.pending_repo.as_ref()
    }

    pub fn link_repo(&self) -> &dyn VerifiedLinkRepository {
        self.link_repo.as_ref()
    }

    pub fn policy_repo(&self) -> &dyn ServerPolicyRepository {
        self.policy_repo.as_ref()
    }

    pub fn audit_repo(&self) -> &dyn AuditLogRepository {
        self.audit_repo.as_ref()
    }

    // === External collaborators ===

    /// Get the chat-platform client
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }

    /// Get the external identity directory
    pub fn directory(&self) -> &dyn IdentityDirectory {
        self.directory.as_ref()
    }

    /// Get the scan settings
    pub fn scan(&self) -> &ScanConfig {
        &self.scan
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("platform", &"dyn ChatPlatform")
            .field("directory", &"dyn IdentityDirectory")
            .field("scan", &self.scan)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pending_repo: Option<Arc<dyn PendingVerificationRepository>>,
    link_repo: Option<Arc<dyn VerifiedLinkRepository>>,
    policy_repo: Option<Arc<dyn ServerPolicyRepository>>,
    audit_repo: Option<Arc<dyn AuditLogRepository>>,
    platform: Option<Arc<dyn ChatPlatform>>,
    directory: Option<Arc<dyn IdentityDirectory>>,
    scan: ScanConfig,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_repo(mut self, repo: Arc<dyn PendingVerificationRepository>) -> Self {
        self.pending_repo = Some(repo);
        self
    }

    pub fn link_repo(mut self, repo: Arc<dyn VerifiedLinkRepository>) -> Self {
        self.link_repo = Some(repo);
        self
    }

    pub fn policy_repo(mut self, repo: Arc<dyn ServerPolicyRepository>) -> Self {
        self.policy_repo = Some(repo);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn ChatPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn IdentityDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Fails with a validation error naming the first missing dependency
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.pending_repo
                .ok_or_else(|| ServiceError::validation("pending_repo is required"))?,
            self.link_repo
                .ok_or_else(|| ServiceError::validation("link_repo is required"))?,
            self.policy_repo
                .ok_or_else(|| ServiceError::validation("policy_repo is required"))?,
            self.audit_repo
                .ok_or_else(|| ServiceError::validation("audit_repo is required"))?,
            self.platform
                .ok_or_else(|| ServiceError::validation("platform is required"))?,
            self.directory
                .ok_or_else(|| ServiceError::validation("directory is required"))?,
            self.scan,
        ))
    }
}
