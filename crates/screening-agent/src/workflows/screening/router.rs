use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::TestId;
use super::prompts::{analyze_test_results, generate_recruiter_summary};
use super::service::{
    EmailRequest, ErrorPayload, MeetingInviteRequest, PipelineRequest, ScreeningService,
    ScreeningServiceError,
};

/// Router builder exposing the screening operations over HTTP.
pub fn screening_router(service: Arc<ScreeningService>) -> Router {
    Router::new()
        .route("/api/v1/screening/configuration", get(configuration_handler))
        .route("/api/v1/screening/tests", get(list_tests_handler))
        .route(
            "/api/v1/screening/tests/:test_id/candidates",
            get(candidates_handler),
        )
        .route("/api/v1/screening/tests/:test_id/passed", get(passed_handler))
        .route("/api/v1/screening/tests/:test_id/scores", get(scores_handler))
        .route("/api/v1/screening/tests/:test_id/invites", post(invite_handler))
        .route("/api/v1/screening/pipeline", post(pipeline_handler))
        .route("/api/v1/screening/notifications/emails", post(emails_handler))
        .route(
            "/api/v1/screening/notifications/meetings",
            post(meetings_handler),
        )
        .route("/api/v1/screening/prompts/analysis", get(analysis_prompt_handler))
        .route(
            "/api/v1/screening/prompts/recruiter-summary",
            get(summary_prompt_handler),
        )
        .with_state(service)
}

/// Runs a blocking service call off the async executor.
async fn run_blocking<T, F>(service: Arc<ScreeningService>, operation: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&ScreeningService) -> Result<T, ScreeningServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || operation(&service)).await {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(err)) => error_response(&err),
        Err(join_error) => {
            let payload = json!({
                "error": join_error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) fn error_response(err: &ScreeningServiceError) -> Response {
    let status = match err {
        ScreeningServiceError::Setup(_) => StatusCode::SERVICE_UNAVAILABLE,
        ScreeningServiceError::Retrieval { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorPayload::from(err))).into_response()
}

fn rejected(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorPayload {
            error: error.into(),
        }),
    )
        .into_response()
}

fn json_rejected(rejection: JsonRejection) -> Response {
    rejected(rejection.status(), rejection.body_text())
}

fn path_rejected(rejection: PathRejection) -> Response {
    rejected(rejection.status(), rejection.body_text())
}

fn query_rejected(rejection: QueryRejection) -> Response {
    rejected(rejection.status(), rejection.body_text())
}

fn finite_score(passing_score: Option<f64>) -> Result<Option<f64>, Response> {
    match passing_score {
        Some(score) if !score.is_finite() => Err(rejected(
            StatusCode::BAD_REQUEST,
            format!("passing_score must be a finite number (got {score})"),
        )),
        other => Ok(other),
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub(crate) async fn configuration_handler(
    State(service): State<Arc<ScreeningService>>,
) -> Response {
    (StatusCode::OK, Json(service.configuration())).into_response()
}

pub(crate) async fn list_tests_handler(State(service): State<Arc<ScreeningService>>) -> Response {
    run_blocking(service, |service| service.list_tests()).await
}

pub(crate) async fn candidates_handler(
    State(service): State<Arc<ScreeningService>>,
    test_id: Result<Path<u64>, PathRejection>,
) -> Response {
    let Path(test_id) = match test_id {
        Ok(path) => path,
        Err(rejection) => return path_rejected(rejection),
    };
    run_blocking(service, move |service| service.test_candidates(TestId(test_id))).await
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PassedQuery {
    passing_score: Option<f64>,
}

pub(crate) async fn passed_handler(
    State(service): State<Arc<ScreeningService>>,
    test_id: Result<Path<u64>, PathRejection>,
    query: Result<Query<PassedQuery>, QueryRejection>,
) -> Response {
    let Path(test_id) = match test_id {
        Ok(path) => path,
        Err(rejection) => return path_rejected(rejection),
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    let passing_score = match finite_score(query.passing_score) {
        Ok(score) => score,
        Err(response) => return response,
    };
    run_blocking(service, move |service| {
        service.get_passed_candidates(TestId(test_id), passing_score)
    })
    .await
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScoresQuery {
    email: Option<String>,
}

pub(crate) async fn scores_handler(
    State(service): State<Arc<ScreeningService>>,
    test_id: Result<Path<u64>, PathRejection>,
    query: Result<Query<ScoresQuery>, QueryRejection>,
) -> Response {
    let Path(test_id) = match test_id {
        Ok(path) => path,
        Err(rejection) => return path_rejected(rejection),
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    run_blocking(service, move |service| {
        service.get_scores(TestId(test_id), query.email.as_deref())
    })
    .await
}

#[derive(Debug, Deserialize)]
pub(crate) struct InviteBody {
    emails: Vec<String>,
}

pub(crate) async fn invite_handler(
    State(service): State<Arc<ScreeningService>>,
    test_id: Result<Path<u64>, PathRejection>,
    body: Result<Json<InviteBody>, JsonRejection>,
) -> Response {
    let Path(test_id) = match test_id {
        Ok(path) => path,
        Err(rejection) => return path_rejected(rejection),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejected(rejection),
    };
    run_blocking(service, move |service| {
        service.invite_candidates(TestId(test_id), body.emails)
    })
    .await
}

/// An empty body runs with the configured defaults; anything else must be a JSON request.
pub(crate) async fn pipeline_handler(
    State(service): State<Arc<ScreeningService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PipelineRequest::default()
    } else if !has_json_content_type(&headers) {
        return rejected(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected request with `Content-Type: application/json`",
        );
    } else {
        match Json::<PipelineRequest>::from_bytes(&body) {
            Ok(Json(request)) => request,
            Err(rejection) => return json_rejected(rejection),
        }
    };
    run_blocking(service, move |service| service.run_pipeline(request)).await
}

pub(crate) async fn emails_handler(
    State(service): State<Arc<ScreeningService>>,
    request: Result<Json<EmailRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return json_rejected(rejection),
    };
    run_blocking(service, move |service| Ok(service.send_emails(request))).await
}

pub(crate) async fn meetings_handler(
    State(service): State<Arc<ScreeningService>>,
    request: Result<Json<MeetingInviteRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return json_rejected(rejection),
    };
    run_blocking(service, move |service| Ok(service.send_meeting_invites(request))).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisQuery {
    test_id: u64,
    passing_score: Option<f64>,
}

pub(crate) async fn analysis_prompt_handler(
    query: Result<Query<AnalysisQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    let passing_score = match finite_score(query.passing_score) {
        Ok(score) => score,
        Err(response) => return response,
    };
    let prompt = analyze_test_results(TestId(query.test_id), passing_score);
    (StatusCode::OK, Json(json!({ "prompt": prompt }))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryQuery {
    test_a_id: u64,
    test_b_id: u64,
}

pub(crate) async fn summary_prompt_handler(
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejected(rejection),
    };
    let prompt = generate_recruiter_summary(TestId(query.test_a_id), TestId(query.test_b_id));
    (StatusCode::OK, Json(json!({ "prompt": prompt }))).into_response()
}
