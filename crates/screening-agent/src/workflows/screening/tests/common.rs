use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::{NotificationConfig, ScreeningConfig};
use crate::workflows::screening::domain::{CandidateRecord, TestId};
use crate::workflows::screening::notify::Notifier;
use crate::workflows::screening::source::{
    BackendError, CandidateSource, InviteError, Inviter, ScreeningBackend, ScreeningSession,
    TransportError,
};
use crate::workflows::screening::ScreeningService;

pub(super) const TEST_A: TestId = TestId(101);
pub(super) const TEST_B: TestId = TestId(202);

pub(super) fn candidate(email: &str, name: &str, score: f64) -> CandidateRecord {
    CandidateRecord::new(email)
        .with_full_name(name)
        .with_percentage_score(score)
}

/// Canned platform state shared by every session a `FakeBackend` opens.
#[derive(Default)]
pub(super) struct FakeData {
    pub(super) candidates: HashMap<TestId, Vec<CandidateRecord>>,
    pub(super) failing_tests: HashSet<TestId>,
    pub(super) rejected_emails: HashSet<String>,
}

impl FakeData {
    pub(super) fn with_test(mut self, test_id: TestId, candidates: Vec<CandidateRecord>) -> Self {
        self.candidates.insert(test_id, candidates);
        self
    }

    pub(super) fn failing(mut self, test_id: TestId) -> Self {
        self.failing_tests.insert(test_id);
        self
    }

    pub(super) fn rejecting(mut self, email: &str) -> Self {
        self.rejected_emails.insert(email.to_string());
        self
    }
}

pub(super) type InviteLog = Arc<Mutex<Vec<(TestId, String, String)>>>;

pub(super) struct FakeSession {
    data: Arc<FakeData>,
    invites: InviteLog,
}

impl FakeSession {
    pub(super) fn new(data: FakeData) -> (Self, InviteLog) {
        let invites = InviteLog::default();
        let session = Self {
            data: Arc::new(data),
            invites: invites.clone(),
        };
        (session, invites)
    }
}

impl CandidateSource for FakeSession {
    fn candidates(&self, test_id: TestId) -> Result<Vec<CandidateRecord>, TransportError> {
        if self.data.failing_tests.contains(&test_id) {
            return Err(TransportError::Status {
                test_id,
                status: 401,
                body: "Unauthorized".to_string(),
            });
        }
        Ok(self
            .data
            .candidates
            .get(&test_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl Inviter for FakeSession {
    fn send_invite(&self, test_id: TestId, email: &str, name: &str) -> Result<(), InviteError> {
        self.invites
            .lock()
            .expect("invite log mutex")
            .push((test_id, email.to_string(), name.to_string()));
        if self.data.rejected_emails.contains(email) {
            return Err(InviteError::Rejected {
                status: 422,
                body: "Invalid email".to_string(),
            });
        }
        Ok(())
    }
}

pub(super) struct FakeBackend {
    data: Arc<FakeData>,
    invites: InviteLog,
    unavailable: bool,
}

impl FakeBackend {
    pub(super) fn new(data: FakeData) -> Self {
        Self {
            data: Arc::new(data),
            invites: InviteLog::default(),
            unavailable: false,
        }
    }

    pub(super) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(FakeData::default())
        }
    }

    pub(super) fn invites(&self) -> InviteLog {
        self.invites.clone()
    }
}

impl ScreeningBackend for FakeBackend {
    fn open_session(&self) -> Result<Box<dyn ScreeningSession>, BackendError> {
        if self.unavailable {
            return Err(BackendError::MissingCredentials);
        }
        Ok(Box::new(FakeSession {
            data: self.data.clone(),
            invites: self.invites.clone(),
        }))
    }

    fn uses_fixtures(&self) -> bool {
        false
    }
}

pub(super) fn screening_config() -> ScreeningConfig {
    ScreeningConfig {
        test_a_id: TEST_A,
        test_b_id: TEST_B,
        ..ScreeningConfig::default()
    }
}

pub(super) fn service_with(backend: Arc<dyn ScreeningBackend>) -> ScreeningService {
    let notifications = NotificationConfig::default();
    ScreeningService::new(
        backend,
        Notifier::dry_run(&notifications),
        screening_config(),
        &notifications,
    )
}

pub(super) fn fixture_service() -> ScreeningService {
    use crate::workflows::screening::fixtures::{FixtureBackend, ADVANCED_TEST_ID, INITIAL_TEST_ID};

    let notifications = NotificationConfig::default();
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

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
