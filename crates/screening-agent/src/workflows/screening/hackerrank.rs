//! Blocking HackerRank for Work (API v3) transport.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ApiCredentials, HackerRankConfig};

use super::domain::{CandidateRecord, TestId};
use super::source::{
    get_all_candidates, BackendError, CandidatePage, CandidateSource, InviteError, Inviter,
    PageFetcher, ScreeningBackend, ScreeningSession, TransportError,
};

/// Authenticated session against the HackerRank REST API.
#[derive(Debug, Clone)]
pub struct HackerRankClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(default)]
    data: Vec<CandidateRecord>,
    #[serde(default)]
    next: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct InvitePayload<'a> {
    email: &'a str,
    name: &'a str,
    send_email: bool,
}

impl HackerRankClient {
    pub fn connect(config: &HackerRankConfig) -> Result<Self, BackendError> {
        let headers = auth_headers(&config.credentials)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| BackendError::Session(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn candidates_url(&self, test_id: TestId) -> String {
        format!("{}/tests/{}/candidates", self.base_url, test_id)
    }

    fn invites_url(&self, test_id: TestId) -> String {
        format!("{}/tests/{}/invites", self.base_url, test_id)
    }
}

impl PageFetcher for HackerRankClient {
    fn fetch_page(
        &self,
        test_id: TestId,
        offset: usize,
        limit: usize,
    ) -> Result<CandidatePage, TransportError> {
        let resp = self
            .client
            .get(self.candidates_url(test_id))
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().unwrap_or_default();
            return Err(TransportError::Status {
                test_id,
                status: status.as_u16(),
                body,
            });
        }

        let payload: CandidatesResponse = resp
            .json()
            .map_err(|err| TransportError::Decode(err.to_string()))?;

        Ok(CandidatePage {
            records: payload.data,
            has_more: payload.next.as_ref().is_some_and(is_truthy),
        })
    }
}

impl CandidateSource for HackerRankClient {
    fn candidates(&self, test_id: TestId) -> Result<Vec<CandidateRecord>, TransportError> {
        get_all_candidates(self, test_id)
    }
}

impl Inviter for HackerRankClient {
    fn send_invite(&self, test_id: TestId, email: &str, name: &str) -> Result<(), InviteError> {
        let payload = InvitePayload {
            email,
            name,
            send_email: true,
        };

        let resp = self
            .client
            .post(self.invites_url(test_id))
            .json(&payload)
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = resp.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            debug!(%test_id, email, "invite accepted");
            return Ok(());
        }

        let body = resp.text().unwrap_or_default();
        warn!(%test_id, email, status = status.as_u16(), "invite rejected");
        Err(InviteError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Backend opening a fresh authenticated client per operation.
#[derive(Debug, Clone)]
pub struct HackerRankBackend {
    config: HackerRankConfig,
}

impl HackerRankBackend {
    pub fn new(config: HackerRankConfig) -> Self {
        Self { config }
    }
}

impl ScreeningBackend for HackerRankBackend {
    fn open_session(&self) -> Result<Box<dyn ScreeningSession>, BackendError> {
        if !self.config.credentials.is_configured() {
            return Err(BackendError::MissingCredentials);
        }
        Ok(Box::new(HackerRankClient::connect(&self.config)?))
    }

    fn uses_fixtures(&self) -> bool {
        false
    }
}

fn auth_headers(credentials: &ApiCredentials) -> Result<HeaderMap, BackendError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = &credentials.access_token {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
    }

    let named = [
        ("x-auth-token", &credentials.api_token),
        ("x-jwt-token", &credentials.jwt_access_token),
        ("x-refresh-token", &credentials.jwt_refresh_token),
    ];
    for (name, value) in named {
        if let Some(value) = value {
            headers.insert(HeaderName::from_static(name), header_value(value)?);
        }
    }

    Ok(headers)
}

fn header_value(raw: &str) -> Result<HeaderValue, BackendError> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|_| BackendError::Session("credential contains invalid header characters".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

// Any non-empty, non-false, non-zero cursor means another page exists.
fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(raw) => !raw.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}
