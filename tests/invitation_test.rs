//! Engine-level tests for the invitation lifecycle.

mod helpers;

use std::collections::BTreeMap;

use keelson::capability_model;
use keelson_core::ErrorKind;
use keelson_core::config::{AppConfig, CapabilityTableConfig};
use keelson_core::types::PrincipalId;
use keelson_entity::access::{Permission, Role};
use keelson_entity::invitation::InvitationState;
use keelson_service::VerifiedIdentity;

const TARGET: &str = "target@example.com";

#[tokio::test]
async fn test_invite_redeem_revoke_lifecycle() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let target = VerifiedIdentity::new(PrincipalId::new(), TARGET);

    let issued = app.invite(owner, &vessel, TARGET, Role::Viewer, Some(7)).await;
    assert!(
        !app.allowed(target.principal_id, &vessel, Permission::ViewBasicInfo)
            .await
    );

    let redemption = app
        .engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect("redeem");
    assert_eq!(redemption.role, Role::Viewer);
    assert_eq!(
        redemption.permissions,
        app.engine.capabilities.default_permissions(Role::Viewer)
    );
    assert!(
        app.allowed(target.principal_id, &vessel, Permission::ViewBasicInfo)
            .await
    );
    assert!(
        !app.allowed(target.principal_id, &vessel, Permission::ManageAccess)
            .await
    );

    let replay = app
        .engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect("redeem again");
    assert_eq!(replay, redemption);

    let grants = app
        .engine
        .grants
        .list_grants(owner, &vessel, true)
        .await
        .expect("list");
    assert_eq!(
        grants
            .iter()
            .filter(|g| g.principal_id == target.principal_id)
            .count(),
        1
    );
    assert_eq!(grants[0].granted_by, owner);

    app.engine
        .grants
        .revoke_grant(owner, &vessel, target.principal_id)
        .await
        .expect("revoke");
    assert!(
        !app.allowed(target.principal_id, &vessel, Permission::ViewBasicInfo)
            .await
    );
}

#[tokio::test]
async fn test_zero_ttl_invitation_is_expired() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let target = VerifiedIdentity::new(PrincipalId::new(), TARGET);

    let issued = app.invite(owner, &vessel, TARGET, Role::Viewer, Some(0)).await;

    let err = app
        .engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect_err("expired");
    assert_eq!(err.kind, ErrorKind::InvitationExpired);

    let grants = app
        .engine
        .grants
        .list_grants(owner, &vessel, true)
        .await
        .expect("list");
    assert!(grants.is_empty());
}

#[tokio::test]
async fn test_invitation_lapses_after_ttl() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let target = VerifiedIdentity::new(PrincipalId::new(), TARGET);

    let issued = app.invite(owner, &vessel, TARGET, Role::Editor, Some(3)).await;
    app.advance_days(3);

    let view = app
        .engine
        .invitations
        .preview(&issued.token)
        .await
        .expect("preview");
    assert_eq!(view.state, InvitationState::Expired);

    let err = app
        .engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect_err("expired");
    assert_eq!(err.kind, ErrorKind::InvitationExpired);
}

#[tokio::test]
async fn test_cancelled_invitation_cannot_be_redeemed() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let target = VerifiedIdentity::new(PrincipalId::new(), TARGET);

    let issued = app.invite(owner, &vessel, TARGET, Role::Viewer, None).await;
    let view = app
        .engine
        .invitations
        .cancel_invitation(owner, issued.invitation.id)
        .await
        .expect("cancel");
    assert_eq!(view.state, InvitationState::Cancelled);

    let err = app
        .engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect_err("cancelled");
    assert_eq!(err.kind, ErrorKind::InvitationCancelled);
}

#[tokio::test]
async fn test_accepted_token_cannot_be_replayed_by_another_principal() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let target = VerifiedIdentity::new(PrincipalId::new(), TARGET);
    let intruder = VerifiedIdentity::new(PrincipalId::new(), TARGET);

    let issued = app.invite(owner, &vessel, TARGET, Role::Viewer, None).await;
    app.engine
        .invitations
        .redeem(&issued.token, &target)
        .await
        .expect("redeem");

    let err = app
        .engine
        .invitations
        .redeem(&issued.token, &intruder)
        .await
        .expect_err("replay");
    assert_eq!(err.kind, ErrorKind::IdentityMismatch);
    assert!(
        !app.allowed(intruder.principal_id, &vessel, Permission::ViewBasicInfo)
            .await
    );
}

#[tokio::test]
async fn test_wrong_identity_and_unknown_token() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);
    let other = VerifiedIdentity::new(PrincipalId::new(), "other@example.com");

    let issued = app.invite(owner, &vessel, TARGET, Role::Viewer, None).await;

    let err = app
        .engine
        .invitations
        .redeem(&issued.token, &other)
        .await
        .expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::IdentityMismatch);

    let err = app
        .engine
        .invitations
        .redeem("not-a-token", &other)
        .await
        .expect_err("unknown");
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_latest_pending_reflects_newest_offer() {
    let app = helpers::TestApp::new();
    let owner = PrincipalId::new();
    let vessel = app.vessel(owner);

    app.invite(owner, &vessel, TARGET, Role::Viewer, None).await;
    app.advance_days(1);
    let newer = app.invite(owner, &vessel, TARGET, Role::Captain, None).await;

    let latest = app
        .engine
        .invitations
        .latest_pending_for(owner, &vessel, "Target@Example.com")
        .await
        .expect("latest")
        .expect("pending invitation");
    assert_eq!(latest.id, newer.invitation.id);
    assert_eq!(latest.role, Role::Captain);

    let pending = app
        .engine
        .invitations
        .list_invitations(owner, &vessel, Some(InvitationState::Pending))
        .await
        .expect("list");
    assert_eq!(pending.len(), 2);
}

#[test]
fn test_configured_capability_table_must_be_total() {
    let mut config: AppConfig = serde_json::from_value(serde_json::json!({
        "database": { "url": "postgres://localhost/keelson" }
    }))
    .expect("deserialize");

    let mut roles = BTreeMap::new();
    roles.insert("owner".to_string(), vec!["full_access".to_string()]);
    roles.insert("viewer".to_string(), vec!["view_basic_info".to_string()]);
    config.capabilities = Some(CapabilityTableConfig { version: 2, roles });

    let err = capability_model(&config).expect_err("partial table");
    assert_eq!(err.kind, ErrorKind::Configuration);

    config.capabilities = None;
    let model = capability_model(&config).expect("built-in table");
    assert_eq!(model.version(), 1);
}
