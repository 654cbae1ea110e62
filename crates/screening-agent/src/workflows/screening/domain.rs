use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder used when a candidate carries neither `full_name` nor `name`.
pub const PLACEHOLDER_NAME: &str = "Candidate";

/// Opaque HackerRank test identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub u64);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw value of a score field as delivered by the assessment platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Other(serde_json::Value),
}

impl ScoreValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(value) => Some(*value),
            ScoreValue::Other(_) => None,
        }
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Number(value)
    }
}

/// One candidate attempt for a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub percentage_score: Option<ScoreValue>,
    #[serde(default)]
    pub score: Option<ScoreValue>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_test_id")]
    pub test_id: Option<TestId>,
}

impl CandidateRecord {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_percentage_score(mut self, score: f64) -> Self {
        self.percentage_score = Some(ScoreValue::Number(score));
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(ScoreValue::Number(score));
        self
    }

    /// Email address, treating empty strings as missing.
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Display name following the `full_name` → `name` fallback chain.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.full_name.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    /// Name sent with invitations; falls back to a neutral placeholder.
    pub fn invite_name(&self) -> &str {
        self.display_name().unwrap_or(PLACEHOLDER_NAME)
    }

    pub fn raw_percentage(&self) -> Option<f64> {
        self.percentage_score.as_ref().and_then(ScoreValue::as_number)
    }

    pub fn status(&self) -> Option<CandidateStatus> {
        self.status.map(CandidateStatus::from_code)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Attempt status codes reported by HackerRank. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    Expired,
    NotStarted,
    InProgress,
    Completed,
    Other(i64),
}

impl CandidateStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::Expired,
            0 => Self::NotStarted,
            1 => Self::InProgress,
            2 => Self::Completed,
            other => Self::Other(other),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Expired => "Expired".to_string(),
            Self::NotStarted => "Not started".to_string(),
            Self::InProgress => "In progress".to_string(),
            Self::Completed => "Completed".to_string(),
            Self::Other(code) => format!("Status {code}"),
        }
    }
}

/// Test-B passer annotated with their Test-A score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruiterReadyRecord {
    pub email: Option<String>,
    pub name: Option<String>,
    pub score: f64,
    pub test_a_score: Option<f64>,
}

impl RecruiterReadyRecord {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(PLACEHOLDER_NAME)
    }

    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Formats a score without a trailing `.0` for whole numbers.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.is_finite() {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_i64(),
        Some(serde_json::Value::String(raw)) => raw.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) => Some(raw),
        _ => None,
    })
}

fn lenient_test_id<'de, D>(deserializer: D) -> Result<Option<TestId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_u64().map(TestId),
        Some(serde_json::Value::String(raw)) => raw.trim().parse::<u64>().ok().map(TestId),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        _ => None,
    })
}
