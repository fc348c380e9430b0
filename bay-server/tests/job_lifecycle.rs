//! 工单生命周期: 服务层 + 内存数据库

mod common;

use bay_server::db::models::{IncentiveRuleCreate, JobCreate};
use bay_server::identity::LoginRequest;
use bay_server::jobs::{CompleteJob, JobError};
use bay_server::notify::NotificationKind;
use common::*;
use shared::{AppError, ErrorCode};
use shared::models::{
    AssignmentType, Certification, CertificationScope, JobStatus, MembershipStatus, Priority,
    RequestStatus,
};

fn rule(threshold: i64, per_unit: f64) -> IncentiveRuleCreate {
    IncentiveRuleCreate {
        name: "Quarter-hour bonus".to_string(),
        description: String::new(),
        time_saved_threshold: threshold,
        bonus_per_unit: per_unit,
        is_active: true,
        applicable_certs: vec![CertificationScope::All],
        effective_from: None,
        effective_until: None,
    }
}

#[tokio::test]
async fn test_request_approve_start_complete_pays_bonus() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Brakes])
        .await;
    app.state
        .incentives
        .create(&manager, rule(15, 10.0), T0)
        .await
        .unwrap();

    let job = app.job(&manager, Certification::Brakes, 120).await;
    assert_eq!(job.service_order_number, "SO-001001");
    let job_id = job.id_string();

    let requested = app
        .state
        .jobs
        .request_to_work(&tess, &job_id, T0 + MINUTE)
        .await
        .unwrap();
    assert_eq!(requested.status, JobStatus::PendingApproval);
    assert_eq!(requested.request_status, RequestStatus::Pending);
    assert_eq!(
        app.notifier
            .sent_of(NotificationKind::JobRequestToManager)
            .len(),
        1
    );

    let approved = app
        .state
        .jobs
        .approve_request(&manager, &job_id, T0 + 2 * MINUTE)
        .await
        .unwrap();
    assert_eq!(approved.status, JobStatus::Available);
    assert_eq!(approved.assignment_type, AssignmentType::Requested);
    assert!(approved.is_assigned_to(&tess.id));

    let started = app
        .state
        .jobs
        .start(&tess, &job_id, T0 + 10 * MINUTE)
        .await
        .unwrap();
    assert_eq!(started.status, JobStatus::InProgress);

    let done = app
        .state
        .jobs
        .complete(
            &tess,
            &job_id,
            CompleteJob {
                actual_time: Some(90),
                notes: Some("Pads and rotors".to_string()),
            },
            T0 + 100 * MINUTE,
        )
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.time_saved, 30);
    assert_eq!(done.incentive_earned, 20.0);

    let stats = app
        .state
        .identity
        .stats(&manager, &tess.id.to_string())
        .await
        .unwrap();
    assert_eq!(stats.weekly_earnings, 20.0);
    assert_eq!(stats.total_jobs_completed, 1);
    assert_eq!(stats.total_time_saved, 30);
    assert_eq!(app.notifier.sent_of(NotificationKind::BonusEarned).len(), 1);
}

#[tokio::test]
async fn test_second_job_gets_next_service_order_number() {
    let app = setup().await;
    let (manager, _) = app.manager("morgan@example.com").await;
    let first = app.job(&manager, Certification::Engine, 60).await;
    let second = app.job(&manager, Certification::Engine, 60).await;
    assert_eq!(first.service_order_number, "SO-001001");
    assert_eq!(second.service_order_number, "SO-001002");
}

#[tokio::test]
async fn test_uncertified_technician_cannot_request() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Brakes])
        .await;
    let job = app.job(&manager, Certification::Ev, 60).await;

    let err = app
        .state
        .jobs
        .request_to_work(&tess, &job.id_string(), T0)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::NotEligible(_)));
}

#[tokio::test]
async fn test_concurrent_start_has_one_winner() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let theo = app
        .technician(&manager, &shop, "Theo", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();

    let jobs = app.state.jobs.clone();
    let (a, b) = tokio::join!(
        jobs.start(&tess, &job_id, T0 + MINUTE),
        jobs.start(&theo, &job_id, T0 + MINUTE),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(JobError::InvalidState(_))));
}

#[tokio::test]
async fn test_approve_twice_second_is_invalid_state() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();

    app.state
        .jobs
        .request_to_work(&tess, &job_id, T0)
        .await
        .unwrap();
    app.state
        .jobs
        .approve_request(&manager, &job_id, T0)
        .await
        .unwrap();
    let err = app
        .state
        .jobs
        .approve_request(&manager, &job_id, T0)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::InvalidState(_)));
}

#[tokio::test]
async fn test_emailed_link_is_single_use() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();

    app.state
        .jobs
        .request_to_work(&tess, &job_id, T0)
        .await
        .unwrap();
    let approve = app.last_token(NotificationKind::JobRequestToManager, "approve_url");
    let reject = app.last_token(NotificationKind::JobRequestToManager, "reject_url");

    // 令牌绑定动作: 批准令牌不能用来拒绝
    assert!(matches!(
        app.state
            .jobs
            .reject_via_token(&job_id, &approve, None, T0)
            .await,
        Err(JobError::CapabilityInvalid)
    ));

    let job = app
        .state
        .jobs
        .approve_via_token(&job_id, &approve, T0)
        .await
        .unwrap();
    assert!(job.is_assigned_to(&tess.id));
    assert!(job.capabilities.is_empty());

    assert!(matches!(
        app.state.jobs.approve_via_token(&job_id, &approve, T0).await,
        Err(JobError::CapabilityInvalid)
    ));
    assert!(matches!(
        app.state
            .jobs
            .reject_via_token(&job_id, &reject, None, T0)
            .await,
        Err(JobError::CapabilityInvalid)
    ));
}

#[tokio::test]
async fn test_notifier_failure_does_not_block_request() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();

    app.notifier.set_failing(true);
    let job = app
        .state
        .jobs
        .request_to_work(&tess, &job_id, T0)
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::PendingApproval);
    assert!(app
        .notifier
        .sent_of(NotificationKind::JobRequestToManager)
        .is_empty());
}

#[tokio::test]
async fn test_other_shop_cannot_touch_job() {
    let app = setup().await;
    let (manager, _) = app.manager("morgan@example.com").await;
    let (rival, _) = app.manager("riley@example.com").await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();

    let err = app.state.jobs.get(&rival, &job_id).await.unwrap_err();
    assert!(matches!(err, JobError::NotEligible(_)));

    let err = app
        .state
        .jobs
        .cancel(&rival, &job_id, None, T0)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::ShopMismatch(_)));
    assert_eq!(AppError::from(err).code, ErrorCode::ShopMismatch);
}

#[tokio::test]
async fn test_in_progress_job_cannot_be_cancelled_or_deleted() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();
    app.state
        .jobs
        .direct_assign(&manager, &job_id, &tess.id.to_string(), T0)
        .await
        .unwrap();
    app.state.jobs.start(&tess, &job_id, T0).await.unwrap();

    assert!(matches!(
        app.state.jobs.cancel(&manager, &job_id, None, T0).await,
        Err(JobError::InvalidState(_))
    ));
    assert!(matches!(
        app.state.jobs.delete(&manager, &job_id).await,
        Err(JobError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_reassign_in_progress_returns_to_available() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;
    let tess = app
        .technician(&manager, &shop, "Tess", &[Certification::Engine])
        .await;
    let theo = app
        .technician(&manager, &shop, "Theo", &[Certification::Engine])
        .await;
    let job_id = app.job(&manager, Certification::Engine, 60).await.id_string();
    app.state
        .jobs
        .direct_assign(&manager, &job_id, &tess.id.to_string(), T0)
        .await
        .unwrap();
    let first_start = app.state.jobs.start(&tess, &job_id, T0).await.unwrap();
    let original_started_at = first_start.started_at.unwrap();

    let job = app
        .state
        .jobs
        .reassign(
            &manager,
            &job_id,
            &theo.id.to_string(),
            Some("Tess called in sick".to_string()),
            T0 + MINUTE,
        )
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Available);
    assert!(job.is_assigned_to(&theo.id));
    assert!(job.started_at.is_none());

    // 原技师不能再完工
    assert!(matches!(
        app.state
            .jobs
            .complete(&tess, &job_id, CompleteJob::default(), T0 + 2 * MINUTE)
            .await,
        Err(JobError::InvalidState(_)) | Err(JobError::NotAssignedToYou)
    ));

    // 新技师重新开工，计时从头开始
    let restarted = app
        .state
        .jobs
        .start(&theo, &job_id, T0 + 5 * MINUTE)
        .await
        .unwrap();
    assert_eq!(restarted.status, JobStatus::InProgress);
    assert!(restarted.is_assigned_to(&theo.id));
    assert!(restarted.started_at.unwrap() > original_started_at);
}

#[tokio::test]
async fn test_oil_change_within_threshold_earns_nothing() {
    let app = setup().await;
    let (manager, shop) = app.manager("morgan@example.com").await;

    let signup = app
        .state
        .identity
        .signup(
            technician_signup("Tess", "tess@example.com", &shop.code, &[Certification::Engine]),
            T0,
        )
        .await
        .unwrap();
    assert_eq!(signup.user.membership_status, MembershipStatus::Pending);

    app.state
        .membership
        .approve(&manager, &signup.user.id, T0 + MINUTE)
        .await
        .unwrap();
    let session = app
        .state
        .identity
        .login(LoginRequest {
            email: "tess@example.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.membership_status, MembershipStatus::Approved);
    let tess = app.actor(&signup.user.id).await;

    app.state
        .incentives
        .create(&manager, rule(30, 10.0), T0)
        .await
        .unwrap();
    let job = app
        .state
        .jobs
        .create(
            &manager,
            JobCreate {
                title: "Oil Change".to_string(),
                description: String::new(),
                vehicle: Default::default(),
                required_cert: Certification::Engine,
                book_time: 60,
                priority: Priority::Medium,
                notes: String::new(),
            },
            T0,
        )
        .await
        .unwrap();
    let job_id = job.id_string();
    app.state
        .jobs
        .direct_assign(&manager, &job_id, &tess.id.to_string(), T0)
        .await
        .unwrap();
    app.state
        .jobs
        .start(&tess, &job_id, T0 + 10 * MINUTE)
        .await
        .unwrap();

    let done = app
        .state
        .jobs
        .complete(
            &tess,
            &job_id,
            CompleteJob {
                actual_time: Some(40),
                notes: None,
            },
            T0 + 50 * MINUTE,
        )
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.time_saved, 20);
    assert_eq!(done.incentive_earned, 0.0);

    let stats = app
        .state
        .identity
        .stats(&manager, &tess.id.to_string())
        .await
        .unwrap();
    assert_eq!(stats.weekly_earnings, 0.0);
    assert_eq!(stats.total_jobs_completed, 1);
    assert_eq!(stats.total_time_saved, 20);
    assert!(app.notifier.sent_of(NotificationKind::BonusEarned).is_empty());
}
