use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::batch::BatchFailure;
use super::domain::{CandidateRecord, RecruiterReadyRecord, TestId};
use super::fixtures::{fixture_candidates, fixture_tests, FixtureBackend};
use super::hackerrank::HackerRankBackend;
use super::invites::dispatch_invitations;
use super::notify::{EmailReceipt, EmailTemplate, MeetingInvite, Notifier};
use super::pipeline::{PipelineError, PipelinePlan, PipelineReport, ScreeningPipeline, Stage};
use super::scoring::{extract_score, filter_passed};
use super::source::{BackendError, ScreeningBackend, ScreeningSession, TransportError};
use crate::config::{AppConfig, ConfigurationView, NotificationConfig, ScreeningConfig};

/// Threshold used by `get_passed_candidates` when the caller omits one.
pub const DEFAULT_PASSING_SCORE: f64 = 60.0;

/// Picks the fixture or live backend from configuration.
pub fn backend_from_config(config: &AppConfig) -> Arc<dyn ScreeningBackend> {
    if config.screening.use_fixture_data {
        Arc::new(FixtureBackend)
    } else {
        Arc::new(HackerRankBackend::new(config.hackerrank.clone()))
    }
}

/// Operations exposed to the HTTP façade and the CLI.
pub struct ScreeningService {
    backend: Arc<dyn ScreeningBackend>,
    notifier: Notifier,
    screening: ScreeningConfig,
    api_configured: bool,
    notify_on_pipeline: bool,
}

impl ScreeningService {
    pub fn new(
        backend: Arc<dyn ScreeningBackend>,
        notifier: Notifier,
        screening: ScreeningConfig,
        notifications: &NotificationConfig,
    ) -> Self {
        Self {
            backend,
            notifier,
            screening,
            api_configured: false,
            notify_on_pipeline: notifications.notify_on_pipeline,
        }
    }

    /// Wires the configured backend with dry-run notification channels.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut service = Self::new(
            backend_from_config(config),
            Notifier::dry_run(&config.notifications),
            config.screening.clone(),
            &config.notifications,
        );
        service.api_configured = config.hackerrank.credentials.is_configured();
        service
    }

    pub fn screening_config(&self) -> &ScreeningConfig {
        &self.screening
    }

    pub fn uses_fixtures(&self) -> bool {
        self.backend.uses_fixtures()
    }

    fn session(&self) -> Result<Box<dyn ScreeningSession>, ScreeningServiceError> {
        self.backend.open_session().map_err(|err| {
            warn!(error = %err, "unable to open screening session");
            ScreeningServiceError::Setup(err)
        })
    }

    fn fetch(
        session: &dyn ScreeningSession,
        test_id: TestId,
    ) -> Result<Vec<CandidateRecord>, ScreeningServiceError> {
        session
            .candidates(test_id)
            .map_err(|source| ScreeningServiceError::Retrieval { test_id, source })
    }

    /// Candidates meeting `passing_score` (60 when omitted).
    pub fn get_passed_candidates(
        &self,
        test_id: TestId,
        passing_score: Option<f64>,
    ) -> Result<PassedCandidatesResponse, ScreeningServiceError> {
        let passing_score = passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
        let session = self.session()?;
        let candidates = Self::fetch(session.as_ref(), test_id)?;
        let passed = filter_passed(&candidates, passing_score);

        Ok(PassedCandidatesResponse {
            test_id,
            total: candidates.len(),
            passed_count: passed.len(),
            passing_score,
            passed_candidates: passed.iter().map(CandidateSummary::from_record).collect(),
            fixture_data: self.uses_fixtures(),
        })
    }

    pub fn invite_candidates(
        &self,
        test_id: TestId,
        emails: Vec<String>,
    ) -> Result<InviteResponse, ScreeningServiceError> {
        let session = self.session()?;
        let report = dispatch_invitations(session.as_ref(), test_id, emails);

        Ok(InviteResponse {
            test_id,
            total_invited: report.succeeded(),
            successful: report.successes().map(|receipt| receipt.email.clone()).collect(),
            failed: report.failures().cloned().collect(),
            fixture_data: self.uses_fixtures(),
        })
    }

    /// Runs both screening stages; unset fields fall back to configuration.
    pub fn run_pipeline(
        &self,
        request: PipelineRequest,
    ) -> Result<PipelineResponse, ScreeningServiceError> {
        let plan = PipelinePlan::new(
            request.test_a_id.unwrap_or(self.screening.test_a_id),
            request.test_b_id.unwrap_or(self.screening.test_b_id),
        )
        .with_thresholds(
            request
                .test_a_pass_score
                .unwrap_or(self.screening.test_a_pass_score),
            request
                .test_b_pass_score
                .unwrap_or(self.screening.test_b_pass_score),
        );
        let notify = request.notify.unwrap_or(self.notify_on_pipeline);

        let session = self.session()?;
        let pipeline = ScreeningPipeline::new(session.as_ref());
        let pipeline = if notify {
            pipeline.with_notifications(&self.notifier, EmailTemplate::default())
        } else {
            pipeline
        };

        let report = pipeline.run(&plan, Utc::now())?;
        info!(
            invited = report.invited_to_test_b,
            ready = report.recruiter_ready_count,
            notify,
            "pipeline run completed"
        );

        Ok(PipelineResponse {
            report,
            fixture_data: self.uses_fixtures(),
        })
    }

    /// Every candidate with raw score details, optionally narrowed to one email.
    pub fn get_scores(
        &self,
        test_id: TestId,
        email: Option<&str>,
    ) -> Result<ScoresResponse, ScreeningServiceError> {
        let session = self.session()?;
        let candidates = Self::fetch(session.as_ref(), test_id)?;
        let wanted = email.map(str::trim).filter(|email| !email.is_empty());

        let entries: Vec<ScoreEntry> = candidates
            .iter()
            .filter(|candidate| match wanted {
                Some(wanted) => candidate
                    .email()
                    .is_some_and(|email| email.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .map(ScoreEntry::from_record)
            .collect();

        Ok(ScoresResponse {
            test_id,
            total: candidates.len(),
            filtered_count: entries.len(),
            candidates: entries,
            fixture_data: self.uses_fixtures(),
        })
    }

    pub fn test_candidates(
        &self,
        test_id: TestId,
    ) -> Result<TestCandidatesResponse, ScreeningServiceError> {
        let session = self.session()?;
        let candidates = Self::fetch(session.as_ref(), test_id)?;

        Ok(TestCandidatesResponse {
            test_id,
            total: candidates.len(),
            candidates: candidates.iter().map(CandidateSummary::from_record).collect(),
            fixture_data: self.uses_fixtures(),
        })
    }

    /// Configured tests with candidate counts and score statistics.
    pub fn list_tests(&self) -> Result<TestListResponse, ScreeningServiceError> {
        if self.uses_fixtures() {
            let tests = fixture_tests()
                .into_iter()
                .map(|info| {
                    let scores: Vec<f64> =
                        fixture_candidates(info.id).iter().map(extract_score).collect();
                    TestSummary::with_scores(
                        info.id,
                        info.name.to_string(),
                        info.kind,
                        Some(info.description.to_string()),
                        &scores,
                    )
                })
                .collect();
            return Ok(TestListResponse {
                tests,
                fixture_data: true,
            });
        }

        let session = self.session()?;
        let configured = [
            (self.screening.test_a_id, Stage::TestA, "initial"),
            (self.screening.test_b_id, Stage::TestB, "advanced"),
        ];
        let tests = configured
            .into_iter()
            .map(|(test_id, stage, kind)| match session.candidates(test_id) {
                Ok(candidates) => {
                    let scores: Vec<f64> = candidates
                        .iter()
                        .map(extract_score)
                        .filter(|score| *score > 0.0)
                        .collect();
                    let mut summary =
                        TestSummary::with_scores(test_id, stage.to_string(), kind, None, &scores);
                    summary.candidate_count = candidates.len();
                    summary
                }
                Err(err) => {
                    warn!(%test_id, error = %err, "unable to load test statistics");
                    TestSummary::unavailable(test_id, stage.to_string(), kind, &err)
                }
            })
            .collect();

        Ok(TestListResponse {
            tests,
            fixture_data: false,
        })
    }

    pub fn configuration(&self) -> ConfigurationView {
        ConfigurationView {
            test_a_id: self.screening.test_a_id,
            test_b_id: self.screening.test_b_id,
            test_a_pass_score: self.screening.test_a_pass_score,
            test_b_pass_score: self.screening.test_b_pass_score,
            api_configured: self.api_configured,
            use_mock_data: self.uses_fixtures(),
        }
    }

    pub fn send_emails(&self, request: EmailRequest) -> EmailBatchResponse {
        let template = EmailTemplate::with_overrides(request.email_subject, request.email_template);
        let report = self.notifier.send_emails(&request.candidates, &template);

        EmailBatchResponse {
            total_candidates: request.candidates.len(),
            emails_sent: report.succeeded(),
            successful: report.successes().cloned().collect(),
            failed: report.failures().cloned().collect(),
        }
    }

    pub fn send_meeting_invites(&self, request: MeetingInviteRequest) -> MeetingBatchResponse {
        let top_n = request.top_n.unwrap_or(self.notifier.top_n());
        let report = self
            .notifier
            .send_meeting_invites(&request.candidates, Some(top_n), Utc::now());

        MeetingBatchResponse {
            total_candidates: request.candidates.len(),
            top_n,
            invites_sent: report.succeeded(),
            successful: report.successes().cloned().collect(),
            failed: report.failures().cloned().collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Setup(#[from] BackendError),
    #[error("failed to fetch candidates for test {test_id}: {source}")]
    Retrieval {
        test_id: TestId,
        #[source]
        source: TransportError,
    },
}

impl From<PipelineError> for ScreeningServiceError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::Setup(err) => Self::Setup(err),
            PipelineError::Retrieval {
                test_id, source, ..
            } => Self::Retrieval { test_id, source },
        }
    }
}

/// Uniform `{error}` body returned when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl From<&ScreeningServiceError> for ErrorPayload {
    fn from(value: &ScreeningServiceError) -> Self {
        Self {
            error: value.to_string(),
        }
    }
}

/// Flattens an operation result into its success payload or an `{error}` object.
pub fn into_payload<T: Serialize>(
    result: Result<T, ScreeningServiceError>,
) -> serde_json::Value {
    let value = match result {
        Ok(body) => serde_json::to_value(body),
        Err(err) => serde_json::to_value(ErrorPayload::from(&err)),
    };
    value.unwrap_or_else(|err| serde_json::json!({ "error": err.to_string() }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub email: Option<String>,
    pub name: Option<String>,
    pub score: f64,
}

impl CandidateSummary {
    fn from_record(record: &CandidateRecord) -> Self {
        Self {
            email: record.email().map(str::to_string),
            name: record.display_name().map(str::to_string),
            score: extract_score(record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassedCandidatesResponse {
    pub test_id: TestId,
    pub total: usize,
    pub passed_count: usize,
    pub passing_score: f64,
    pub passed_candidates: Vec<CandidateSummary>,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InviteResponse {
    pub test_id: TestId,
    pub total_invited: usize,
    pub successful: Vec<String>,
    pub failed: Vec<BatchFailure>,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub test_a_id: Option<TestId>,
    #[serde(default)]
    pub test_b_id: Option<TestId>,
    #[serde(default)]
    pub test_a_pass_score: Option<f64>,
    #[serde(default)]
    pub test_b_pass_score: Option<f64>,
    #[serde(default)]
    pub notify: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResponse {
    #[serde(flatten)]
    pub report: PipelineReport,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub email: Option<String>,
    pub name: Option<String>,
    pub score: f64,
    pub raw_percentage: Option<f64>,
    pub status: Option<String>,
}

impl ScoreEntry {
    fn from_record(record: &CandidateRecord) -> Self {
        Self {
            email: record.email().map(str::to_string),
            name: record.display_name().map(str::to_string),
            score: extract_score(record),
            raw_percentage: record.raw_percentage(),
            status: record.status().map(|status| status.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoresResponse {
    pub test_id: TestId,
    pub total: usize,
    pub filtered_count: usize,
    pub candidates: Vec<ScoreEntry>,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCandidatesResponse {
    pub test_id: TestId,
    pub total: usize,
    pub candidates: Vec<CandidateSummary>,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub id: TestId,
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub candidate_count: usize,
    pub average_score: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TestSummary {
    fn with_scores(
        id: TestId,
        name: String,
        kind: &'static str,
        description: Option<String>,
        scores: &[f64],
    ) -> Self {
        let average = (!scores.is_empty())
            .then(|| round_to_cents(scores.iter().sum::<f64>() / scores.len() as f64));
        Self {
            id,
            name,
            kind,
            description,
            candidate_count: scores.len(),
            average_score: average,
            min_score: scores.iter().copied().reduce(f64::min),
            max_score: scores.iter().copied().reduce(f64::max),
            note: None,
        }
    }

    fn unavailable(id: TestId, name: String, kind: &'static str, err: &TransportError) -> Self {
        Self {
            id,
            name,
            kind,
            description: None,
            candidate_count: 0,
            average_score: None,
            min_score: None,
            max_score: None,
            note: Some(format!("could not load candidates: {err}")),
        }
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestListResponse {
    pub tests: Vec<TestSummary>,
    pub fixture_data: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailRequest {
    pub candidates: Vec<RecruiterReadyRecord>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub email_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailBatchResponse {
    pub total_candidates: usize,
    pub emails_sent: usize,
    pub successful: Vec<EmailReceipt>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeetingInviteRequest {
    pub candidates: Vec<RecruiterReadyRecord>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingBatchResponse {
    pub total_candidates: usize,
    pub top_n: usize,
    pub invites_sent: usize,
    pub successful: Vec<MeetingInvite>,
    pub failed: Vec<BatchFailure>,
}
