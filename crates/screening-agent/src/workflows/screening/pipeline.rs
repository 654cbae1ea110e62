use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span};

use super::batch::BatchFailure;
use super::domain::{CandidateRecord, RecruiterReadyRecord, TestId};
use super::invites::dispatch_invitations;
use super::notify::{EmailTemplate, NotificationSummary, Notifier};
use super::scoring::{extract_score, filter_passed};
use super::source::{BackendError, ScreeningSession, TransportError};

/// Which tests to screen and the thresholds for each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelinePlan {
    pub test_a_id: TestId,
    pub test_b_id: TestId,
    pub test_a_pass_score: f64,
    pub test_b_pass_score: f64,
}

impl PipelinePlan {
    pub fn new(test_a_id: TestId, test_b_id: TestId) -> Self {
        Self {
            test_a_id,
            test_b_id,
            test_a_pass_score: 70.0,
            test_b_pass_score: 80.0,
        }
    }

    pub fn with_thresholds(mut self, test_a_pass_score: f64, test_b_pass_score: f64) -> Self {
        self.test_a_pass_score = test_a_pass_score;
        self.test_b_pass_score = test_b_pass_score;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TestA,
    TestB,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TestA => f.write_str("Test A"),
            Stage::TestB => f.write_str("Test B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub id: TestId,
    pub total_candidates: usize,
    pub passed_count: usize,
    pub passing_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub test_a: StageSummary,
    pub test_b: StageSummary,
    pub invited_to_test_b: usize,
    pub invite_failures: Vec<BatchFailure>,
    pub recruiter_ready_count: usize,
    pub recruiter_ready_candidates: Vec<RecruiterReadyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Setup(#[from] BackendError),
    #[error("failed to fetch {stage} candidates for test {test_id}: {source}")]
    Retrieval {
        stage: Stage,
        test_id: TestId,
        #[source]
        source: TransportError,
    },
}

/// Two-stage screening run over a single session.
pub struct ScreeningPipeline<'a, S: ?Sized> {
    session: &'a S,
    notifications: Option<(&'a Notifier, EmailTemplate)>,
}

impl<'a, S> ScreeningPipeline<'a, S>
where
    S: ScreeningSession + ?Sized,
{
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            notifications: None,
        }
    }

    /// Enables the notify stage after the join.
    pub fn with_notifications(mut self, notifier: &'a Notifier, template: EmailTemplate) -> Self {
        self.notifications = Some((notifier, template));
        self
    }

    pub fn run(&self, plan: &PipelinePlan, now: DateTime<Utc>) -> Result<PipelineReport, PipelineError> {
        let span = info_span!("pipeline", test_a = %plan.test_a_id, test_b = %plan.test_b_id);
        let _entered = span.enter();

        let candidates_a = self.fetch(Stage::TestA, plan.test_a_id)?;
        let passed_a = filter_passed(&candidates_a, plan.test_a_pass_score);
        info!(total = candidates_a.len(), passed = passed_a.len(), "test A filtered");

        let invites = dispatch_invitations(self.session, plan.test_b_id, passed_a.iter().cloned());

        let candidates_b = self.fetch(Stage::TestB, plan.test_b_id)?;
        let passed_b = filter_passed(&candidates_b, plan.test_b_pass_score);
        info!(total = candidates_b.len(), passed = passed_b.len(), "test B filtered");

        let recruiter_ready = join_with_test_a(&passed_b, &candidates_a);
        info!(ready = recruiter_ready.len(), "recruiter-ready list built");

        let notifications = self
            .notifications
            .as_ref()
            .map(|(notifier, template)| notifier.notify(&recruiter_ready, template, now));

        Ok(PipelineReport {
            test_a: StageSummary {
                id: plan.test_a_id,
                total_candidates: candidates_a.len(),
                passed_count: passed_a.len(),
                passing_score: plan.test_a_pass_score,
            },
            test_b: StageSummary {
                id: plan.test_b_id,
                total_candidates: candidates_b.len(),
                passed_count: passed_b.len(),
                passing_score: plan.test_b_pass_score,
            },
            invited_to_test_b: invites.succeeded(),
            invite_failures: invites.failures().cloned().collect(),
            recruiter_ready_count: recruiter_ready.len(),
            recruiter_ready_candidates: recruiter_ready,
            notifications,
        })
    }

    fn fetch(&self, stage: Stage, test_id: TestId) -> Result<Vec<CandidateRecord>, PipelineError> {
        self.session
            .candidates(test_id)
            .map_err(|source| PipelineError::Retrieval {
                stage,
                test_id,
                source,
            })
    }
}

/// Pairs each Test-B passer with the first Test-A attempt sharing its email.
pub fn join_with_test_a(
    passed_b: &[CandidateRecord],
    candidates_a: &[CandidateRecord],
) -> Vec<RecruiterReadyRecord> {
    let mut test_a_scores: HashMap<&str, f64> = HashMap::new();
    for candidate in candidates_a {
        if let Some(email) = candidate.email() {
            test_a_scores
                .entry(email)
                .or_insert_with(|| extract_score(candidate));
        }
    }

    passed_b
        .iter()
        .map(|candidate| RecruiterReadyRecord {
            email: candidate.email().map(str::to_string),
            name: candidate.display_name().map(str::to_string),
            score: extract_score(candidate),
            test_a_score: candidate
                .email()
                .and_then(|email| test_a_scores.get(email).copied()),
        })
        .collect()
}
