//! Bundled demo dataset used when `USE_MOCK_DATA=true`.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::domain::{CandidateRecord, ScoreValue, TestId};
use super::source::{
    BackendError, CandidateSource, InviteError, Inviter, ScreeningBackend, ScreeningSession,
    TransportError,
};

pub const INITIAL_TEST_ID: TestId = TestId(356098);
pub const ADVANCED_TEST_ID: TestId = TestId(2263157);

/// Static metadata describing a fixture test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureTestInfo {
    pub id: TestId,
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

const INITIAL_RESULTS: [(&str, &str, u32, u32); 12] = [
    ("alice.wonderland@example.com", "Alice Wonderland", 85, 10 * 60 + 30),
    ("bob.builder@example.com", "Bob Builder", 65, 11 * 60),
    ("charlie.brown@example.com", "Charlie Brown", 75, 11 * 60 + 30),
    ("diana.prince@example.com", "Diana Prince", 90, 12 * 60),
    ("emma.watson@example.com", "Emma Watson", 88, 12 * 60 + 30),
    ("frank.sinatra@example.com", "Frank Sinatra", 72, 13 * 60),
    ("grace.hopper@example.com", "Grace Hopper", 95, 13 * 60 + 30),
    ("henry.ford@example.com", "Henry Ford", 68, 14 * 60),
    ("isabella.swan@example.com", "Isabella Swan", 79, 14 * 60 + 30),
    ("jack.sparrow@example.com", "Jack Sparrow", 55, 15 * 60),
    ("katherine.johnson@example.com", "Katherine Johnson", 92, 15 * 60 + 30),
    ("leonardo.davinci@example.com", "Leonardo da Vinci", 87, 16 * 60),
];

const ADVANCED_RESULTS: [(&str, &str, u32, u32); 8] = [
    ("alice.wonderland@example.com", "Alice Wonderland", 92, 10 * 60),
    ("charlie.brown@example.com", "Charlie Brown", 78, 11 * 60),
    ("diana.prince@example.com", "Diana Prince", 95, 12 * 60),
    ("emma.watson@example.com", "Emma Watson", 89, 12 * 60 + 30),
    ("grace.hopper@example.com", "Grace Hopper", 98, 13 * 60),
    ("isabella.swan@example.com", "Isabella Swan", 82, 13 * 60 + 30),
    ("katherine.johnson@example.com", "Katherine Johnson", 96, 14 * 60),
    ("leonardo.davinci@example.com", "Leonardo da Vinci", 91, 14 * 60 + 30),
];

/// Candidates recorded for a fixture test; unknown tests have none.
pub fn fixture_candidates(test_id: TestId) -> Vec<CandidateRecord> {
    let (rows, day): (&[(&str, &str, u32, u32)], u32) = match test_id {
        INITIAL_TEST_ID => (&INITIAL_RESULTS[..], 15),
        ADVANCED_TEST_ID => (&ADVANCED_RESULTS[..], 16),
        _ => return Vec::new(),
    };

    rows.iter()
        .map(|&(email, name, score, minute_of_day)| CandidateRecord {
            email: Some(email.to_string()),
            full_name: Some(name.to_string()),
            name: Some(name.to_string()),
            percentage_score: Some(ScoreValue::Number(f64::from(score))),
            score: Some(ScoreValue::Number(f64::from(score))),
            status: Some(2),
            completed_at: completion_time(day, minute_of_day),
            test_id: Some(test_id),
        })
        .collect()
}

fn completion_time(day: u32, minute_of_day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2024, 1, day, minute_of_day / 60, minute_of_day % 60, 0)
        .single()
}

pub fn fixture_tests() -> Vec<FixtureTestInfo> {
    vec![
        FixtureTestInfo {
            id: INITIAL_TEST_ID,
            name: "Initial Screening Test",
            kind: "initial",
            description: "Initial candidate screening assessment",
        },
        FixtureTestInfo {
            id: ADVANCED_TEST_ID,
            name: "Advanced Technical Test",
            kind: "advanced",
            description: "Advanced technical assessment for qualified candidates",
        },
    ]
}

/// In-memory session over the fixture dataset. Invites always succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSession;

impl CandidateSource for FixtureSession {
    fn candidates(&self, test_id: TestId) -> Result<Vec<CandidateRecord>, TransportError> {
        Ok(fixture_candidates(test_id))
    }
}

impl Inviter for FixtureSession {
    fn send_invite(&self, test_id: TestId, email: &str, _name: &str) -> Result<(), InviteError> {
        tracing::debug!(%test_id, email, "fixture invite recorded");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureBackend;

impl ScreeningBackend for FixtureBackend {
    fn open_session(&self) -> Result<Box<dyn ScreeningSession>, BackendError> {
        Ok(Box::new(FixtureSession))
    }

    fn uses_fixtures(&self) -> bool {
        true
    }
}
