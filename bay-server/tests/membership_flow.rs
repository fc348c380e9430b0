//! 店铺加入码与成员审批

mod common;

use bay_server::identity::{IdentityError, LoginRequest};
use bay_server::membership::MembershipError;
use bay_server::notify::NotificationKind;
use common::*;
use shared::models::{Certification, MembershipStatus};
use shared::{AppError, ErrorCode};

fn login(email: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: "secret123".to_string(),
    }
}

#[tokio::test]
async fn test_technician_signup_waits_for_approval() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;

    let response = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &shop.code, &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap();
    assert!(response.token.is_none());
    assert_eq!(response.user.membership_status, MembershipStatus::Pending);
    assert!(!response.user.is_active);

    assert!(matches!(
        app.state.identity.login(login("tess@example.com")).await,
        Err(IdentityError::MembershipPending)
    ));

    let pending = app.state.membership.list_pending(&manager).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(app.notifier.sent_of(NotificationKind::MembershipRequestAck).len(), 1);

    let approved = app
        .state
        .membership
        .approve(&manager, &response.user.id, T0 + MINUTE)
        .await
        .unwrap();
    assert_eq!(approved.membership_status, MembershipStatus::Approved);
    assert!(app.state.identity.login(login("tess@example.com")).await.is_ok());
}

#[tokio::test]
async fn test_rejected_technician_cannot_log_in() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let response = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &shop.code, &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap();

    app.state
        .membership
        .reject(&manager, &response.user.id, Some("No EV bay yet".to_string()), T0)
        .await
        .unwrap();
    assert!(matches!(
        app.state.identity.login(login("tess@example.com")).await,
        Err(IdentityError::MembershipRejected)
    ));

    // 已拒绝的申请不能再批准
    assert!(matches!(
        app.state
            .membership
            .approve(&manager, &response.user.id, T0)
            .await,
        Err(MembershipError::NotPending)
    ));
}

#[tokio::test]
async fn test_signup_with_unknown_code_leaves_no_account() {
    let app = setup().await;
    app.manager("morgan@example.com").await;

    let err = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", "XX-0000", &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidShopCode);

    let err = app
        .state
        .identity
        .login(login("tess@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = setup().await;
    app.manager("morgan@example.com").await;
    let err: AppError = app
        .state
        .identity
        .signup(manager_signup("MORGAN@example.com", "Second Shop"), T0)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmailExists);
}

#[tokio::test]
async fn test_regenerated_code_replaces_old_one() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;

    let updated = app.state.membership.regenerate_code(&manager).await.unwrap();
    assert_ne!(updated.code, shop.code);
    assert!(updated.code.starts_with("TG-"));

    assert!(matches!(
        app.state.membership.validate_code(&shop.code).await,
        Err(MembershipError::InvalidCode(_))
    ));
    let info = app
        .state
        .membership
        .validate_code(&updated.code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(info.shop_name, "Downtown Auto");

    // 旧码注册失败且不留账户，新码进入待审批
    let err = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &shop.code, &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidShopCode);

    let response = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &updated.code, &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap();
    assert_eq!(response.user.membership_status, MembershipStatus::Pending);
}

#[tokio::test]
async fn test_rejoin_requires_current_code() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    app.state
        .membership
        .remove(&manager, &tess.id.to_string(), T0)
        .await
        .unwrap();
    let updated = app.state.membership.regenerate_code(&manager).await.unwrap();
    let tess = app.actor(&tess.id.to_string()).await;

    assert!(matches!(
        app.state.membership.join(&tess, &shop.code, None, T0).await,
        Err(MembershipError::InvalidCode(_))
    ));
    let rejoined = app
        .state
        .membership
        .join(&tess, &updated.code, None, T0 + MINUTE)
        .await
        .unwrap();
    assert_eq!(rejoined.membership_status, MembershipStatus::Pending);
}

#[tokio::test]
async fn test_membership_link_approves_once() {
    let app = setup().await;
    let (_, shop) = app.manager("morgan@example.com").await;
    let response = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &shop.code, &[Certification::Ev]),
            T0,
        )
        .await
        .unwrap();
    let token = app.last_token(NotificationKind::MembershipRequestToManager, "approve_url");

    let tech = app
        .state
        .membership
        .approve_via_token(&response.user.id, &token, T0)
        .await
        .unwrap();
    assert_eq!(tech.membership_status, MembershipStatus::Approved);
    assert_eq!(
        app.notifier
            .sent_of(NotificationKind::MembershipDecisionToTech)
            .len(),
        1
    );

    assert!(matches!(
        app.state
            .membership
            .approve_via_token(&response.user.id, &token, T0)
            .await,
        Err(MembershipError::CapabilityInvalid)
    ));
}

#[tokio::test]
async fn test_removed_technician_can_rejoin() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;

    app.state
        .membership
        .remove(&manager, &tess.id.to_string(), T0)
        .await
        .unwrap();
    assert!(app.state.identity.login(login("tess@example.com")).await.is_ok());

    let tess = app.actor(&tess.id.to_string()).await;
    assert!(tess.shop.is_none());
    let rejoined = app
        .state
        .membership
        .join(&tess, &shop.code, None, T0 + MINUTE)
        .await
        .unwrap();
    assert_eq!(rejoined.membership_status, MembershipStatus::Pending);
    assert_eq!(rejoined.certifications, vec![Certification::Engine]);
}

#[tokio::test]
async fn test_manager_owns_one_shop() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let mine = app.state.membership.my_shop(&manager).await.unwrap();
    assert_eq!(mine.code, shop.code);
    assert_eq!(mine.manager, manager.id);
}
