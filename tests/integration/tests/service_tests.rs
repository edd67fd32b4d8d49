//! Dispatcher operation tests against in-memory fakes
//!
//! Run with: cargo test -p integration-tests --test service_tests

use integration_tests::*;
use verify_core::{AuditStatus, DomainError, Member, Permissions, UpstreamError};
use verify_service::dto::{
    AddRoleRequest, CheckVerificationRequest, CheckVerificationResponse, RecentLogsQuery,
    SetupRequest, StartVerificationRequest, UpdateConfigRequest,
};
use verify_service::{AdminService, ServiceError, VerificationService};

fn start(username: Option<&str>) -> StartVerificationRequest {
    StartVerificationRequest {
        username: username.map(str::to_string),
        display_name: Some("member".to_string()),
    }
}

fn is_domain(err: &ServiceError, code: &str) -> bool {
    matches!(err, ServiceError::Domain(e) if e.code() == code)
}

// ============================================================================
// Member operations
// ============================================================================

#[tokio::test]
async fn test_start_verification_issues_code_with_preview() {
    let h = TestHarness::new();
    h.add_account("42", "Builder", "");

    let response = VerificationService::new(&h.ctx)
        .start_verification(MEMBER, SERVER, start(Some("Builder")))
        .await
        .unwrap();

    assert!(response.pending.code.starts_with("VERIFY-"));
    assert_eq!(response.pending.username_hint.as_deref(), Some("Builder"));
    assert_eq!(response.preview.unwrap().id, "42");
    assert!(response.current_link.is_none());

    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Pending);
    assert_eq!(
        entry.message,
        format!("Verification initiated with code {}", response.pending.code)
    );
    assert_eq!(entry.display_name, "member");
}

#[tokio::test]
async fn test_start_verification_survives_preview_failure() {
    let h = TestHarness::new();
    h.directory.fail_lookups(UpstreamError::Timeout);

    let response = VerificationService::new(&h.ctx)
        .start_verification(MEMBER, SERVER, start(Some("Builder")))
        .await
        .unwrap();

    assert!(response.preview.is_none());
    assert_eq!(h.pending.len(), 1);
}

#[tokio::test]
async fn test_start_rejected_when_reverification_disabled() {
    let h = TestHarness::new();
    h.seed_policy(|p| p.allow_reverification = false).await;
    h.seed_link(MEMBER, "42", "Builder");

    let err = VerificationService::new(&h.ctx)
        .start_verification(MEMBER, SERVER, start(None))
        .await
        .unwrap_err();

    assert!(is_domain(&err, "REVERIFICATION_DISABLED"));
    assert_eq!(err.status_code(), 409);
    assert!(err.to_string().contains("Builder"));
    assert!(h.pending.is_empty());
}

#[tokio::test]
async fn test_reverification_keeps_existing_link_until_completion() {
    let h = TestHarness::new();
    h.seed_link(MEMBER, "42", "Builder");

    let response = VerificationService::new(&h.ctx)
        .start_verification(MEMBER, SERVER, start(None))
        .await
        .unwrap();

    assert_eq!(response.current_link.unwrap().external_id, "42");
    assert!(h.links.get(MEMBER, SERVER).is_some());
    assert_eq!(h.pending.len(), 1);
}

#[tokio::test]
async fn test_check_verification_completes_on_match() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.seed_policy(|p| p.log_channel_id = Some(LOG_CHANNEL)).await;
    h.add_account("42", "Builder", "hi VERIFY-AB12C3 bye");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let response = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap();

    let CheckVerificationResponse::Verified { link, completion } = response else {
        panic!("expected verified, got {response:?}");
    };
    assert_eq!(link.external_id, "42");
    assert_eq!(completion.roles_added, vec![VERIFIED_ROLE]);
    assert!(h.pending.is_empty());

    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Success);
    assert_eq!(entry.message, "Verified as Builder");
    assert_eq!(entry.external_username.as_deref(), Some("Builder"));

    let announced = h.platform.channel_messages(LOG_CHANNEL);
    assert_eq!(announced.last().unwrap().title, "Verification Success");
}

#[tokio::test]
async fn test_check_verification_not_yet_verified() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.add_account("42", "Builder", "no code yet");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let response = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap();

    match response {
        CheckVerificationResponse::NotYetVerified { code, expires_at } => {
            assert_eq!(code, "VERIFY-AB12C3");
            assert_eq!(expires_at, pending.expires_at);
        }
        other => panic!("expected not yet verified, got {other:?}"),
    }
    assert_eq!(h.pending.len(), 1);
    assert!(h.links.is_empty());
    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Failed);
    assert_eq!(entry.message, "Verification code not found in profile");
}

#[tokio::test]
async fn test_check_uses_requested_display_name_for_discovery() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let response = VerificationService::new(&h.ctx)
        .check_verification(
            MEMBER,
            SERVER,
            CheckVerificationRequest {
                display_name: Some("Builder#0001".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(matches!(response, CheckVerificationResponse::Verified { .. }));
}

#[tokio::test]
async fn test_check_discovers_by_username_not_nickname() {
    let h = TestHarness::new();
    let mut member = Member::new(SERVER, MEMBER, "Builder");
    member.nickname = Some("Server Nick".to_string());
    h.platform.add_member(member);
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let response = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap();

    assert!(matches!(response, CheckVerificationResponse::Verified { .. }));
    assert_eq!(h.directory.calls_of("lookup"), ["Builder"]);
}

#[tokio::test]
async fn test_check_expired_deletes_pending_and_audits() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    h.seed_expired_pending(MEMBER, "VERIFY-AB12C3").await;

    let err = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap_err();

    assert!(err.is_expired());
    assert_eq!(err.status_code(), 410);
    assert!(h.pending.is_empty());
    assert!(h.links.is_empty());
    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Failed);
    assert_eq!(entry.message, "Verification code expired");
}

#[tokio::test]
async fn test_check_without_pending() {
    let h = TestHarness::new();

    let err = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap_err();
    assert!(is_domain(&err, "NO_PENDING_VERIFICATION"));

    h.seed_link(MEMBER, "42", "Builder");
    let response = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap();
    assert!(matches!(
        response,
        CheckVerificationResponse::AlreadyVerified { ref link } if link.external_id == "42"
    ));
}

#[tokio::test]
async fn test_check_requires_member() {
    let h = TestHarness::new();
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let err = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap_err();

    assert!(is_domain(&err, "UNKNOWN_MEMBER"));
}

#[tokio::test]
async fn test_check_transient_failure_is_audited() {
    let h = TestHarness::new();
    h.add_member(MEMBER, "member");
    h.directory.fail_lookups(UpstreamError::Status(503));
    h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let err = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(h.pending.len(), 1);
    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Failed);
    assert!(entry.message.starts_with("Profile check failed"));
}

#[tokio::test]
async fn test_check_member_lookup_failure_is_transient() {
    let h = TestHarness::new();
    h.platform.fail_member_lookup(UpstreamError::Timeout);
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let err = VerificationService::new(&h.ctx)
        .check_verification(MEMBER, SERVER, CheckVerificationRequest::default())
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn test_start_update_requires_link() {
    let h = TestHarness::new();
    let service = VerificationService::new(&h.ctx);

    let err = service
        .start_update(MEMBER, SERVER, StartVerificationRequest::default())
        .await
        .unwrap_err();
    assert!(is_domain(&err, "NOT_VERIFIED"));

    h.seed_link(MEMBER, "42", "Builder");
    let response = service
        .start_update(MEMBER, SERVER, start(Some("Ignored")))
        .await
        .unwrap();
    assert!(response.pending.username_hint.is_none());
    assert_eq!(response.current_link.unwrap().external_username, "Builder");
    assert_eq!(h.audit.last().unwrap().message, "Verification update initiated");
}

#[tokio::test]
async fn test_cancel_verification() {
    let h = TestHarness::new();
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;
    let service = VerificationService::new(&h.ctx);

    service.cancel_verification(MEMBER, SERVER).await.unwrap();
    assert!(h.pending.is_empty());
    assert_eq!(h.audit.last().unwrap().message, "Verification cancelled");

    let err = service.cancel_verification(MEMBER, SERVER).await.unwrap_err();
    assert!(is_domain(&err, "NO_PENDING_VERIFICATION"));
}

#[tokio::test]
async fn test_status_hides_expired_pending() {
    let h = TestHarness::new();
    h.seed_link(MEMBER, "42", "Builder");
    h.seed_expired_pending(MEMBER, "VERIFY-AB12C3").await;

    let status = VerificationService::new(&h.ctx).status(MEMBER, SERVER).await.unwrap();

    assert!(status.verified);
    assert!(status.pending.is_none());
    assert_eq!(status.link.unwrap().external_id, "42");
}

// ============================================================================
// Admin operations
// ============================================================================

#[tokio::test]
async fn test_admin_operations_require_permission() {
    let h = TestHarness::new();
    h.add_member(ADMIN, "not-admin");
    let admin = AdminService::new(&h.ctx);

    let err = admin.get_config(ADMIN, SERVER).await.unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied { ref permission } if permission == "MANAGE_GUILD"));
    assert_eq!(err.status_code(), 403);

    let err = admin
        .setup(
            ADMIN,
            SERVER,
            SetupRequest {
                verification_role_id: VERIFIED_ROLE,
                verification_channel_id: VERIFY_CHANNEL,
                unverified_role_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied { ref permission } if permission == "MANAGE_ROLES"));
}

#[tokio::test]
async fn test_administrator_passes_every_check() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::ADMINISTRATOR);

    let policy = AdminService::new(&h.ctx).get_config(ADMIN, SERVER).await.unwrap();

    assert!(!policy.stored);
    assert!(policy.dm_on_verification);
    assert!(policy.allow_reverification);
}

#[tokio::test]
async fn test_admin_requires_membership() {
    let h = TestHarness::new();

    let err = AdminService::new(&h.ctx).get_config(ADMIN, SERVER).await.unwrap_err();

    assert!(is_domain(&err, "UNKNOWN_MEMBER"));
}

#[tokio::test]
async fn test_reset_verification() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "Moderator", Permissions::MANAGE_GUILD);
    h.add_member(MEMBER, "member");
    h.seed_link(MEMBER, "42", "Builder");
    h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;
    let admin = AdminService::new(&h.ctx);

    let response = admin.reset_verification(ADMIN, SERVER, MEMBER).await.unwrap();

    assert_eq!(response.removed_link.external_username, "Builder");
    assert!(response.removed_pending);
    assert!(h.links.is_empty() && h.pending.is_empty());
    let entry = h.audit.last().unwrap();
    assert_eq!(entry.status, AuditStatus::Pending);
    assert_eq!(entry.message, "Forced reverification by Moderator");
    assert_eq!(entry.display_name, "member");

    let err = admin.reset_verification(ADMIN, SERVER, MEMBER).await.unwrap_err();
    assert!(is_domain(&err, "NOT_VERIFIED"));
}

#[tokio::test]
async fn test_setup_stores_channel_and_roles() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_ROLES);

    let policy = AdminService::new(&h.ctx)
        .setup(
            ADMIN,
            SERVER,
            SetupRequest {
                verification_role_id: VERIFIED_ROLE,
                verification_channel_id: VERIFY_CHANNEL,
                unverified_role_id: Some(UNVERIFIED_ROLE),
            },
        )
        .await
        .unwrap();

    assert!(policy.stored);
    assert_eq!(policy.verification_channel_id, Some(VERIFY_CHANNEL));
    assert_eq!(policy.unverified_role_id, Some(UNVERIFIED_ROLE));
    assert_eq!(policy.verification_roles.len(), 1);
    assert_eq!(policy.verification_roles[0].role_id, VERIFIED_ROLE);
    assert_eq!(h.audit.last().unwrap().status, AuditStatus::Success);
}

#[tokio::test]
async fn test_configure_applies_patch_and_rejects_empty() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);
    let admin = AdminService::new(&h.ctx);

    let err = admin
        .configure(ADMIN, SERVER, UpdateConfigRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(err.status_code(), 400);

    let policy = admin
        .configure(
            ADMIN,
            SERVER,
            UpdateConfigRequest {
                log_channel_id: Some(Some(LOG_CHANNEL)),
                dm_on_verification: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(policy.log_channel_id, Some(LOG_CHANNEL));
    assert!(!policy.dm_on_verification);
    assert!(policy.allow_reverification);
    assert!(h.audit.last().unwrap().message.starts_with("Configuration updated: "));
    assert_eq!(h.platform.channel_messages(LOG_CHANNEL).len(), 1);

    let policy = admin
        .configure(
            ADMIN,
            SERVER,
            UpdateConfigRequest {
                log_channel_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(policy.log_channel_id, None);
    assert!(!policy.dm_on_verification);
}

#[tokio::test]
async fn test_concurrent_configure_keeps_every_change() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);
    let admin = AdminService::new(&h.ctx);

    let (a, b) = tokio::join!(
        admin.configure(
            ADMIN,
            SERVER,
            UpdateConfigRequest {
                dm_on_verification: Some(false),
                ..Default::default()
            },
        ),
        admin.configure(
            ADMIN,
            SERVER,
            UpdateConfigRequest {
                allow_reverification: Some(false),
                ..Default::default()
            },
        ),
    );
    a.unwrap();
    b.unwrap();

    let policy = h.policies.get(SERVER).unwrap();
    assert!(!policy.dm_on_verification);
    assert!(!policy.allow_reverification);
}

#[tokio::test]
async fn test_role_changes_are_idempotent() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);
    let admin = AdminService::new(&h.ctx);
    let request = || AddRoleRequest {
        role_name: Some("Verified".to_string()),
        role_color: Some(0x00FF00),
    };

    assert!(admin.add_verification_role(ADMIN, SERVER, VERIFIED_ROLE, request()).await.unwrap().changed);
    assert!(!admin.add_verification_role(ADMIN, SERVER, VERIFIED_ROLE, request()).await.unwrap().changed);

    let stored = h.policies.get(SERVER).unwrap();
    assert_eq!(stored.verification_roles[0].role_color, Some(0x00FF00));

    assert!(admin.remove_verification_role(ADMIN, SERVER, VERIFIED_ROLE).await.unwrap().changed);
    assert!(!admin.remove_verification_role(ADMIN, SERVER, VERIFIED_ROLE).await.unwrap().changed);
}

#[tokio::test]
async fn test_recent_logs_newest_first_and_limited() {
    let h = TestHarness::new();
    h.add_admin(ADMIN, "owner", Permissions::MANAGE_GUILD);
    let service = VerificationService::new(&h.ctx);
    for _ in 0..3 {
        service.start_verification(MEMBER, SERVER, start(None)).await.unwrap();
    }
    service.cancel_verification(MEMBER, SERVER).await.unwrap();

    let logs = AdminService::new(&h.ctx)
        .recent_logs(ADMIN, SERVER, RecentLogsQuery { limit: Some(2) })
        .await
        .unwrap();

    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "Verification cancelled");
    assert!(logs[0].id > logs[1].id);

    let all = AdminService::new(&h.ctx)
        .recent_logs(ADMIN, SERVER, RecentLogsQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_domain_error_surfaces_through_service_error() {
    let err = ServiceError::from(DomainError::VerificationExpired);
    assert_eq!(err.error_code(), "VERIFICATION_EXPIRED");
}
