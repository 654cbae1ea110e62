use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use screening_agent::config::{ApiCredentials, HackerRankConfig};
use screening_agent::workflows::screening::hackerrank::{HackerRankBackend, HackerRankClient};
use screening_agent::workflows::screening::{
    dispatch_invitations, CandidateRecord, CandidateSource, ScreeningBackend, TestId,
    TransportError,
};

fn config(base_url: String) -> HackerRankConfig {
    HackerRankConfig {
        base_url,
        credentials: ApiCredentials {
            access_token: Some("access-123".to_string()),
            api_token: Some("api-456".to_string()),
            jwt_access_token: None,
            jwt_refresh_token: None,
        },
        request_timeout: Duration::from_secs(2),
    }
}

fn emails(records: &[CandidateRecord]) -> Vec<&str> {
    records.iter().filter_map(CandidateRecord::email).collect()
}

#[test]
fn follows_next_cursor_across_pages() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/tests/7/candidates")
            .query_param("offset", "0")
            .query_param("limit", "50")
            .header("authorization", "Bearer access-123")
            .header("x-auth-token", "api-456");
        then.status(200).json_body(json!({
            "data": [
                {"email": "a@example.com", "percentage_score": 91},
                {"email": "b@example.com", "score": 72},
                {"email": "c@example.com"}
            ],
            "next": "offset=50"
        }));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/tests/7/candidates")
            .query_param("offset", "50");
        then.status(200).json_body(json!({
            "data": [{"email": "d@example.com"}, {"email": "e@example.com"}],
            "next": null
        }));
    });

    let client = HackerRankClient::connect(&config(server.base_url())).expect("client builds");
    let candidates = client.candidates(TestId(7)).expect("candidates load");

    assert_eq!(
        emails(&candidates),
        vec![
            "a@example.com",
            "b@example.com",
            "c@example.com",
            "d@example.com",
            "e@example.com"
        ]
    );
    first.assert_hits(1);
    second.assert_hits(1);
}

#[test]
fn mistyped_fields_in_one_record_do_not_abort_the_page() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/tests/7/candidates");
        then.status(200).json_body(json!({
            "data": [
                {"email": "a@example.com", "percentage_score": 90, "test_id": "7"},
                {"email": "b@example.com", "name": {"first": "B"}, "score": "high"}
            ],
            "next": false
        }));
    });

    let client = HackerRankClient::connect(&config(server.base_url())).expect("client builds");
    let candidates = client.candidates(TestId(7)).expect("candidates load");

    assert_eq!(emails(&candidates), vec!["a@example.com", "b@example.com"]);
    assert_eq!(candidates[0].test_id, Some(TestId(7)));
    assert_eq!(candidates[1].display_name(), None);
    page.assert_hits(1);
}

#[test]
fn non_success_status_aborts_retrieval() {
    let server = MockServer::start();
    let unauthorized = server.mock(|when, then| {
        when.method(GET).path("/tests/7/candidates");
        then.status(401).body("Unauthorized");
    });

    let client = HackerRankClient::connect(&config(server.base_url())).expect("client builds");
    let error = client.candidates(TestId(7)).expect_err("fetch fails");

    match error {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    unauthorized.assert_hits(1);
}

#[test]
fn invites_accept_created_and_report_rejections() {
    let server = MockServer::start();
    let accepted = server.mock(|when, then| {
        when.method(POST)
            .path("/tests/9/invites")
            .json_body(json!({
                "email": "ok@example.com",
                "name": "ok",
                "send_email": true
            }));
        then.status(201).json_body(json!({"id": "inv-1"}));
    });
    let rejected = server.mock(|when, then| {
        when.method(POST)
            .path("/tests/9/invites")
            .body_contains("bad@example.com");
        then.status(422).body("Invalid email");
    });

    let client = HackerRankClient::connect(&config(server.base_url())).expect("client builds");
    let report = dispatch_invitations(
        &client,
        TestId(9),
        vec!["ok@example.com".to_string(), "bad@example.com".to_string()],
    );

    assert_eq!(report.succeeded(), 1);
    let failure = report.failures().next().expect("failure recorded");
    assert_eq!(failure.email.as_deref(), Some("bad@example.com"));
    assert!(failure.error.contains("422"));
    accepted.assert_hits(1);
    rejected.assert_hits(1);
}

#[test]
fn backend_sessions_reach_the_configured_server() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/tests/3/candidates");
        then.status(200).json_body(json!({"data": [], "next": false}));
    });

    let backend = HackerRankBackend::new(config(format!("{}/", server.base_url())));
    let session = backend.open_session().expect("session opens");
    let candidates = session.candidates(TestId(3)).expect("candidates load");

    assert!(candidates.is_empty());
    page.assert_hits(1);
}
