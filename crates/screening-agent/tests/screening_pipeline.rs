use std::sync::Arc;

use chrono::Utc;

use screening_agent::config::{NotificationConfig, ScreeningConfig};
use screening_agent::workflows::screening::export::export_shortlist;
use screening_agent::workflows::screening::fixtures::{
    FixtureBackend, FixtureSession, ADVANCED_TEST_ID, INITIAL_TEST_ID,
};
use screening_agent::workflows::screening::notify::{EmailTemplate, Notifier};
use screening_agent::workflows::screening::service::PipelineRequest;
use screening_agent::workflows::screening::{
    into_payload, PipelinePlan, ScreeningPipeline, ScreeningService,
};

fn fixture_service(notify_on_pipeline: bool) -> ScreeningService {
    let notifications = NotificationConfig {
        notify_on_pipeline,
        ..NotificationConfig::default()
    };
    ScreeningService::new(
        Arc::new(FixtureBackend),
        Notifier::dry_run(&notifications),
        ScreeningConfig {
            test_a_id: INITIAL_TEST_ID,
            test_b_id: ADVANCED_TEST_ID,
            use_fixture_data: true,
            ..ScreeningConfig::default()
        },
        &notifications,
    )
}

#[test]
fn fixture_run_notifies_top_three_when_configured() {
    let service = fixture_service(true);

    let response = service
        .run_pipeline(PipelineRequest::default())
        .expect("pipeline runs");

    let notifications = response.report.notifications.expect("notify stage ran");
    assert_eq!(notifications.emails_sent, 7);
    let booked: Vec<_> = notifications
        .meeting_invites
        .successful
        .iter()
        .map(|invite| invite.email.as_str())
        .collect();
    assert_eq!(
        booked,
        vec![
            "grace.hopper@example.com",
            "katherine.johnson@example.com",
            "diana.prince@example.com"
        ]
    );
}

#[test]
fn stricter_thresholds_shrink_the_shortlist() {
    let session = FixtureSession;
    let plan = PipelinePlan::new(INITIAL_TEST_ID, ADVANCED_TEST_ID).with_thresholds(90.0, 95.0);

    let report = ScreeningPipeline::new(&session)
        .run(&plan, Utc::now())
        .expect("pipeline runs");

    assert_eq!(report.test_a.passed_count, 3);
    let ready: Vec<_> = report
        .recruiter_ready_candidates
        .iter()
        .filter_map(|candidate| candidate.email.as_deref())
        .collect();
    assert_eq!(
        ready,
        vec![
            "diana.prince@example.com",
            "grace.hopper@example.com",
            "katherine.johnson@example.com"
        ]
    );
}

#[test]
fn shortlist_export_writes_one_row_per_ready_candidate() {
    let service = fixture_service(false);
    let response = service
        .run_pipeline(PipelineRequest::default())
        .expect("pipeline runs");
    let path = std::env::temp_dir().join(format!("shortlist-{}.csv", std::process::id()));

    export_shortlist(&path, &response.report.recruiter_ready_candidates).expect("export");
    let contents = std::fs::read_to_string(&path).expect("read export");
    std::fs::remove_file(&path).ok();

    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("email,name,score,test_a_score"));
    assert_eq!(lines.count(), 7);
    assert!(contents.contains("grace.hopper@example.com,Grace Hopper,98.0,95.0"));
}

#[test]
fn payload_helper_wraps_success_bodies() {
    let service = fixture_service(false);

    let payload = into_payload(service.test_candidates(INITIAL_TEST_ID));

    assert_eq!(payload["total"], 12);
    assert_eq!(payload["fixture_data"], true);
    assert!(payload.get("error").is_none());
}

#[test]
fn custom_template_is_rendered_per_candidate() {
    let notifier = Notifier::dry_run(&NotificationConfig::default());
    let template = EmailTemplate::with_overrides(
        Some("Next steps for {name}".to_string()),
        Some("Score: {score}".to_string()),
    );
    let session = FixtureSession;
    let report = ScreeningPipeline::new(&session)
        .with_notifications(&notifier, template)
        .run(&PipelinePlan::new(INITIAL_TEST_ID, ADVANCED_TEST_ID), Utc::now())
        .expect("pipeline runs");

    let emails = report.notifications.expect("notify stage ran").email_results;
    assert_eq!(emails.succeeded, 7);
    assert!(emails.failed.is_empty());
}
