//! Engine tests: code issuance, profile scanning and completion
//!
//! Run with: cargo test -p integration-tests --test engine_tests

use std::time::Duration;

use integration_tests::*;
use verify_core::{
    ExternalAccount, Notice, PendingVerificationRepository, ServerPolicy, SessionCredential,
    UpstreamError, VerificationCode, VerifiedLinkRepository, VERIFICATION_TTL_MINUTES,
};
use verify_service::{
    CodeIssuer, ConfigResolver, ProfileScanner, ScanConfig, ScanOutcome, VerificationCompleter,
};

// ============================================================================
// Code issuance
// ============================================================================

#[tokio::test]
async fn test_issued_code_format_and_expiry() {
    let h = TestHarness::new();

    let pending = CodeIssuer::new(&h.ctx).issue(MEMBER, SERVER, None).await.unwrap();

    assert!(VerificationCode::is_valid_format(pending.code.as_str()));
    assert!(pending.code.as_str().starts_with("VERIFY-"));
    assert_eq!(
        pending.expires_at - pending.created_at,
        chrono::Duration::minutes(VERIFICATION_TTL_MINUTES)
    );
    assert_eq!(VERIFICATION_TTL_MINUTES, 30);
    assert_eq!(h.pending.get(MEMBER, SERVER), Some(pending));
}

#[tokio::test]
async fn test_reissue_invalidates_previous_code() {
    let h = TestHarness::new();
    let issuer = CodeIssuer::new(&h.ctx);

    let first = issuer.issue(MEMBER, SERVER, Some("Builder".into())).await.unwrap();
    let second = issuer.issue(MEMBER, SERVER, None).await.unwrap();

    assert_eq!(h.pending.len(), 1);
    let stored = h.pending.get(MEMBER, SERVER).unwrap();
    assert_eq!(stored.code, second.code);
    assert_eq!(stored.username_hint, None);
    if first.code != second.code {
        assert!(h
            .pending
            .find_by_code(SERVER, &first.code)
            .await
            .unwrap()
            .is_none());
    }
}

#[tokio::test]
async fn test_concurrent_issue_leaves_exactly_one_pending() {
    let h = TestHarness::new();
    let issuer = CodeIssuer::new(&h.ctx);

    let (a, b) = tokio::join!(
        issuer.issue(MEMBER, SERVER, None),
        issuer.issue(MEMBER, SERVER, None)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(h.pending.len(), 1);
    let survivor = h.pending.get(MEMBER, SERVER).unwrap();
    assert!(survivor.code == a.code || survivor.code == b.code);
}

#[tokio::test]
async fn test_keys_are_independent() {
    let h = TestHarness::new();
    let issuer = CodeIssuer::new(&h.ctx);

    issuer.issue(MEMBER, SERVER, None).await.unwrap();
    issuer.issue(OTHER_MEMBER, SERVER, None).await.unwrap();

    assert_eq!(h.pending.len(), 2);
}

// ============================================================================
// Profile scanning
// ============================================================================

#[tokio::test]
async fn test_code_matches_with_interior_whitespace_and_mixed_case() {
    let h = TestHarness::new();
    h.add_account("42", "Builder", "proof: verify-\n ab12 C3 thanks");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "someone").await.unwrap();

    assert_eq!(outcome, ScanOutcome::Matched(ExternalAccount::new("42", "Builder")));
}

#[tokio::test]
async fn test_no_match_when_every_strategy_misses_or_fails() {
    let h = TestHarness::new();
    h.add_account("42", "Builder", "nothing to see here");
    h.directory.fail_profile_info("42", UpstreamError::Timeout);
    h.directory
        .fail_markup("42", UpstreamError::Connect("connection refused".into()));
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Builder").await.unwrap();

    assert_eq!(outcome, ScanOutcome::NoMatch);
    assert_eq!(h.directory.calls_of("description"), ["42"]);
    assert_eq!(h.directory.calls_of("profile_info"), ["42"]);
    assert_eq!(h.directory.calls_of("markup"), ["42"]);
    assert!(h.directory.calls_of("authenticated").is_empty());
}

#[tokio::test]
async fn test_later_strategy_matches_after_earlier_failure() {
    let h = TestHarness::new();
    h.directory.add_account(ExternalAccount::new("42", "Builder"));
    h.directory.fail_description("42", UpstreamError::Status(500));
    h.directory
        .set_markup("42", "<div class=\"profile-about\">VERIFY-AB12C3</div>");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Builder").await.unwrap();

    assert!(outcome.is_matched());
}

#[tokio::test]
async fn test_expired_pending_yields_expired_regardless_of_profile() {
    let h = TestHarness::new();
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    let pending = h.seed_expired_pending(MEMBER, "VERIFY-AB12C3").await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Builder").await.unwrap();

    assert_eq!(outcome, ScanOutcome::Expired);
    assert!(h.directory.calls().is_empty());
}

#[tokio::test]
async fn test_hint_is_tried_before_display_name() {
    let h = TestHarness::new();
    h.add_account("1", "Hinted", "VERIFY-AB12C3");
    h.add_account("2", "Shown", "VERIFY-AB12C3");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Hinted")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Shown").await.unwrap();

    assert_eq!(outcome, ScanOutcome::Matched(ExternalAccount::new("1", "Hinted")));
    assert_eq!(h.directory.calls_of("lookup"), ["Hinted"]);
}

#[tokio::test]
async fn test_display_name_discriminator_is_stripped() {
    let h = TestHarness::new();
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let outcome = ProfileScanner::new(&h.ctx)
        .scan(&pending, "Builder#1234")
        .await
        .unwrap();

    assert!(outcome.is_matched());
    assert_eq!(h.directory.calls_of("lookup"), ["Builder"]);
}

#[tokio::test]
async fn test_search_fallback_when_lookups_find_nothing() {
    let h = TestHarness::new();
    h.directory.set_search(
        "Build",
        vec![
            ExternalAccount::new("7", "Build3r"),
            ExternalAccount::new("8", "BuildMaster"),
        ],
    );
    h.directory.set_description("8", "VERIFY-AB12C3");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Nobody")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Build").await.unwrap();

    assert_eq!(
        outcome,
        ScanOutcome::Matched(ExternalAccount::new("8", "BuildMaster"))
    );
    assert_eq!(h.directory.calls_of("lookup"), ["Nobody", "Build"]);
    assert_eq!(h.directory.calls_of("search"), ["Build"]);
}

#[tokio::test]
async fn test_search_results_are_capped() {
    let h = TestHarness::with_scan(ScanConfig {
        search_limit: 2,
        ..ScanConfig::default()
    });
    let many: Vec<_> = (1..=5)
        .map(|i| ExternalAccount::new(i.to_string(), format!("Builder{i}")))
        .collect();
    h.directory.set_search("Builder", many);
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Builder").await.unwrap();

    assert_eq!(outcome, ScanOutcome::NoMatch);
    assert_eq!(h.directory.calls_of("description"), ["1", "2"]);
}

#[tokio::test]
async fn test_lowest_discovery_index_wins_under_concurrency() {
    let h = TestHarness::with_scan(ScanConfig {
        concurrency: 4,
        ..ScanConfig::default()
    });
    h.directory.set_search(
        "Builder",
        vec![
            ExternalAccount::new("1", "Builder_a"),
            ExternalAccount::new("2", "Builder_b"),
            ExternalAccount::new("3", "Builder_c"),
        ],
    );
    h.directory.set_description("2", "VERIFY-AB12C3");
    h.directory.set_description("3", "VERIFY-AB12C3");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "Builder").await.unwrap();

    assert_eq!(
        outcome,
        ScanOutcome::Matched(ExternalAccount::new("2", "Builder_b"))
    );
}

#[tokio::test]
async fn test_authenticated_fetch_requires_session() {
    let without = TestHarness::new();
    without.directory.add_account(ExternalAccount::new("42", "Builder"));
    without.directory.set_authenticated("42", "VERIFY-AB12C3");
    let pending = without.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;
    let outcome = ProfileScanner::new(&without.ctx)
        .scan(&pending, "Builder")
        .await
        .unwrap();
    assert_eq!(outcome, ScanOutcome::NoMatch);
    assert!(without.directory.calls_of("authenticated").is_empty());

    let with = TestHarness::with_scan(ScanConfig {
        session: SessionCredential::new("cookie"),
        ..ScanConfig::default()
    });
    with.directory.add_account(ExternalAccount::new("42", "Builder"));
    with.directory.set_authenticated("42", "VERIFY-AB12C3");
    let pending = with.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;
    let outcome = ProfileScanner::new(&with.ctx)
        .scan(&pending, "Builder")
        .await
        .unwrap();
    assert!(outcome.is_matched());
}

#[tokio::test]
async fn test_discovery_network_failure_is_transient() {
    let h = TestHarness::new();
    h.directory.fail_lookups(UpstreamError::Timeout);
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let err = ProfileScanner::new(&h.ctx)
        .scan(&pending, "Builder")
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_rejected_discovery_is_transient_not_a_miss() {
    for error in [UpstreamError::Decode("bad json".into()), UpstreamError::Forbidden] {
        let h = TestHarness::new();
        h.add_account("42", "Builder", "VERIFY-AB12C3");
        h.directory.fail_lookups(error);
        let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Roblox")).await;

        let err = ProfileScanner::new(&h.ctx)
            .scan(&pending, "Builder")
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(err.status_code(), 503);
        // Every step was still tried before giving up
        assert_eq!(h.directory.calls_of("lookup"), ["Roblox", "Builder"]);
        assert_eq!(h.directory.calls_of("search"), ["Builder"]);
    }
}

#[tokio::test]
async fn test_scan_deadline_is_transient_and_persists_nothing() {
    let h = TestHarness::with_scan(ScanConfig {
        timeout: Duration::from_millis(50),
        ..ScanConfig::default()
    });
    h.add_account("42", "Builder", "VERIFY-AB12C3");
    h.directory.delay_fetches(Duration::from_millis(500));
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let err = ProfileScanner::new(&h.ctx)
        .scan(&pending, "Builder")
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(h.links.is_empty());
    assert_eq!(h.pending.get(MEMBER, SERVER), Some(pending));
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test]
async fn test_scenario_issue_scan_complete() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    h.seed_policy(|_| {}).await;
    h.add_account("42", "Builder", "hi VERIFY-AB12C3 bye");
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", Some("Builder")).await;

    let outcome = ProfileScanner::new(&h.ctx).scan(&pending, "member").await.unwrap();
    let ScanOutcome::Matched(account) = outcome else {
        panic!("expected a match, got {outcome:?}");
    };
    assert_eq!(account.id, "42");

    let policy = ConfigResolver::new(&h.ctx).resolve(SERVER).await.unwrap();
    assert_eq!(policy.verification_roles[0].role_name.as_deref(), Some("Verified"));
    let report = VerificationCompleter::new(&h.ctx)
        .complete(&pending, &account, &policy, &member)
        .await
        .unwrap();

    assert_eq!(report.roles_added, vec![VERIFIED_ROLE]);
    assert!(h.platform.calls().contains(&PlatformCall::AddRole {
        user_id: MEMBER,
        role_id: VERIFIED_ROLE
    }));
    let link = h.links.get(MEMBER, SERVER).unwrap();
    assert_eq!((link.subject_id, link.server_id), (MEMBER, SERVER));
    assert_eq!(link.external_id, "42");
    assert_eq!(link.code, code("VERIFY-AB12C3"));
    assert!(h.pending.is_empty());
}

#[tokio::test]
async fn test_complete_twice_keeps_one_link() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    let policy = ServerPolicy::defaults(SERVER);
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;
    let completer = VerificationCompleter::new(&h.ctx);

    completer
        .complete(&pending, &ExternalAccount::new("42", "Builder"), &policy, &member)
        .await
        .unwrap();
    completer
        .complete(&pending, &ExternalAccount::new("43", "Builder2"), &policy, &member)
        .await
        .unwrap();

    assert_eq!(h.links.len(), 1);
    let link = h.links.find(MEMBER, SERVER).await.unwrap().unwrap();
    assert_eq!(link.external_id, "43");
}

#[tokio::test]
async fn test_removing_unheld_unverified_role_is_noop() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    h.seed_policy(|p| p.unverified_role_id = Some(UNVERIFIED_ROLE)).await;
    let policy = ConfigResolver::new(&h.ctx).resolve(SERVER).await.unwrap();
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(&pending, &ExternalAccount::new("42", "Builder"), &policy, &member)
        .await
        .unwrap();

    assert!(report.roles_removed.is_empty());
    assert!(report.roles_failed.is_empty());
    assert!(!h
        .platform
        .calls()
        .iter()
        .any(|c| matches!(c, PlatformCall::RemoveRole { .. })));
}

#[tokio::test]
async fn test_held_unverified_role_is_removed_and_held_roles_not_readded() {
    let h = TestHarness::new();
    let mut member = h.add_member(MEMBER, "member");
    member.add_role(UNVERIFIED_ROLE);
    member.add_role(VERIFIED_ROLE);
    h.platform.add_member(member.clone());
    h.seed_policy(|p| p.unverified_role_id = Some(UNVERIFIED_ROLE)).await;
    let policy = ConfigResolver::new(&h.ctx).resolve(SERVER).await.unwrap();
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(&pending, &ExternalAccount::new("42", "Builder"), &policy, &member)
        .await
        .unwrap();

    assert!(report.roles_added.is_empty());
    assert_eq!(report.roles_removed, vec![UNVERIFIED_ROLE]);
    assert!(!h.platform.member(SERVER, MEMBER).unwrap().has_role(UNVERIFIED_ROLE));
}

#[tokio::test]
async fn test_side_effect_failures_do_not_undo_link() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    h.seed_policy(|_| {}).await;
    h.platform.reject_role(VERIFIED_ROLE);
    h.platform.fail_direct_messages();
    let policy = ConfigResolver::new(&h.ctx).resolve(SERVER).await.unwrap();
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(&pending, &ExternalAccount::new("42", "Builder"), &policy, &member)
        .await
        .unwrap();

    assert_eq!(report.roles_failed, vec![VERIFIED_ROLE]);
    assert!(!report.notified);
    assert!(report.renamed);
    assert!(h.links.get(MEMBER, SERVER).is_some());
}

#[tokio::test]
async fn test_rename_skipped_when_member_outranks_bot() {
    let h = TestHarness::new();
    let mut member = h.add_member(MEMBER, "member");
    member.manageable = false;
    h.platform.add_member(member.clone());
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(
            &pending,
            &ExternalAccount::new("42", "Builder"),
            &ServerPolicy::defaults(SERVER),
            &member,
        )
        .await
        .unwrap();

    assert!(!report.renamed);
    assert!(!h
        .platform
        .calls()
        .iter()
        .any(|c| matches!(c, PlatformCall::SetDisplayName { .. })));
}

#[tokio::test]
async fn test_completion_renames_and_sends_dm() {
    let h = TestHarness::new();
    let mut member = h.add_member(MEMBER, "member");
    member.server_name = Some("Builders Club".to_string());
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(
            &pending,
            &ExternalAccount::new("42", "Builder"),
            &ServerPolicy::defaults(SERVER),
            &member,
        )
        .await
        .unwrap();

    assert!(report.renamed && report.notified);
    assert_eq!(
        h.platform.member(SERVER, MEMBER).unwrap().nickname.as_deref(),
        Some("Builder")
    );
    let dms = h.platform.direct_messages();
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].title, "Verification Successful");
    assert_eq!(
        dms[0].description,
        "You have been successfully verified as **Builder** in Builders Club"
    );
    assert_eq!(dms[0].color, Notice::GREEN);
    assert_eq!(Notice::GREEN, 0x0057_F287);
}

#[tokio::test]
async fn test_dm_disabled_by_policy() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    h.seed_policy(|p| p.dm_on_verification = false).await;
    let policy = ConfigResolver::new(&h.ctx).resolve(SERVER).await.unwrap();
    let pending = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;

    let report = VerificationCompleter::new(&h.ctx)
        .complete(&pending, &ExternalAccount::new("42", "Builder"), &policy, &member)
        .await
        .unwrap();

    assert!(!report.notified);
    assert!(h.platform.direct_messages().is_empty());
}

#[tokio::test]
async fn test_completion_keeps_newer_pending_issued_during_scan() {
    let h = TestHarness::new();
    let member = h.add_member(MEMBER, "member");
    let scanned = h.seed_pending(MEMBER, "VERIFY-AB12C3", None).await;
    let newer = CodeIssuer::new(&h.ctx).issue(MEMBER, SERVER, None).await.unwrap();

    VerificationCompleter::new(&h.ctx)
        .complete(
            &scanned,
            &ExternalAccount::new("42", "Builder"),
            &ServerPolicy::defaults(SERVER),
            &member,
        )
        .await
        .unwrap();

    assert!(h.links.get(MEMBER, SERVER).is_some());
    assert_eq!(h.pending.get(MEMBER, SERVER).map(|p| p.code), Some(newer.code));
}
