use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::workflows::screening::TestId;

const DEFAULT_TEST_A_ID: u64 = 356098;
const DEFAULT_TEST_B_ID: u64 = 2263157;
const DEFAULT_BASE_URL: &str = "https://www.hackerrank.com/x/api/v3";
const MEETING_LEAD_DAYS_RANGE: RangeInclusive<i64> = 0..=365;
const MEETING_DURATION_MINUTES_RANGE: RangeInclusive<i64> = 1..=24 * 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub screening: ScreeningConfig,
    pub hackerrank: HackerRankConfig,
    pub notifications: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let screening = ScreeningConfig {
            test_a_id: TestId(test_id_var("TEST_A_ID", DEFAULT_TEST_A_ID)?),
            test_b_id: TestId(test_id_var("TEST_B_ID", DEFAULT_TEST_B_ID)?),
            test_a_pass_score: parsed_var("TEST_A_PASS_SCORE", 70.0)?,
            test_b_pass_score: parsed_var("TEST_B_PASS_SCORE", 80.0)?,
            use_fixture_data: flag_var("USE_MOCK_DATA"),
        };

        let hackerrank = HackerRankConfig {
            base_url: env::var("HACKERRANK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            credentials: ApiCredentials {
                access_token: optional_var("ACCESS_TOKEN"),
                api_token: optional_var("API_TOKEN"),
                jwt_access_token: optional_var("JWT_ACCESS_TOKEN"),
                jwt_refresh_token: optional_var("JWT_REFRESH_TOKEN"),
            },
            request_timeout: Duration::from_secs(parsed_var("HACKERRANK_TIMEOUT_SECS", 30)?),
        };

        let notifications = NotificationConfig {
            top_n: parsed_var("NOTIFY_TOP_N", 3)?,
            meeting_lead_days: ranged_var("MEETING_LEAD_DAYS", 7, MEETING_LEAD_DAYS_RANGE)?,
            meeting_duration_minutes: ranged_var(
                "MEETING_DURATION_MINUTES",
                30,
                MEETING_DURATION_MINUTES_RANGE,
            )?,
            meeting_base_url: env::var("MEETING_BASE_URL")
                .unwrap_or_else(|_| "https://meet.example.com".to_string()),
            notify_on_pipeline: flag_var("NOTIFY_ON_PIPELINE"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening,
            hackerrank,
            notifications,
        })
    }

    /// Sanitized view of the screening settings; never includes credentials.
    pub fn view(&self) -> ConfigurationView {
        ConfigurationView {
            test_a_id: self.screening.test_a_id,
            test_b_id: self.screening.test_b_id,
            test_a_pass_score: self.screening.test_a_pass_score,
            test_b_pass_score: self.screening.test_b_pass_score,
            api_configured: self.hackerrank.credentials.is_configured(),
            use_mock_data: self.screening.use_fixture_data,
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Test identifiers and pass thresholds for the two screening stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub test_a_id: TestId,
    pub test_b_id: TestId,
    pub test_a_pass_score: f64,
    pub test_b_pass_score: f64,
    pub use_fixture_data: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            test_a_id: TestId(DEFAULT_TEST_A_ID),
            test_b_id: TestId(DEFAULT_TEST_B_ID),
            test_a_pass_score: 70.0,
            test_b_pass_score: 80.0,
            use_fixture_data: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HackerRankConfig {
    pub base_url: String,
    pub credentials: ApiCredentials,
    pub request_timeout: Duration,
}

/// Tokens attached to every HackerRank request.
#[derive(Clone, Default)]
pub struct ApiCredentials {
    pub access_token: Option<String>,
    pub api_token: Option<String>,
    pub jwt_access_token: Option<String>,
    pub jwt_refresh_token: Option<String>,
}

impl ApiCredentials {
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() || self.api_token.is_some()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("jwt_access_token", &self.jwt_access_token.as_ref().map(|_| "***"))
            .field("jwt_refresh_token", &self.jwt_refresh_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Knobs for the email and meeting-invite fan-out.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub top_n: usize,
    pub meeting_lead_days: i64,
    pub meeting_duration_minutes: i64,
    pub meeting_base_url: String,
    pub notify_on_pipeline: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            meeting_lead_days: 7,
            meeting_duration_minutes: 30,
            meeting_base_url: "https://meet.example.com".to_string(),
            notify_on_pipeline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationView {
    pub test_a_id: TestId,
    pub test_b_id: TestId,
    pub test_a_pass_score: f64,
    pub test_b_pass_score: f64,
    pub api_configured: bool,
    pub use_mock_data: bool,
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag_var(key: &str) -> bool {
    optional_var(key)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parsed_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}

fn ranged_var(
    key: &'static str,
    default: i64,
    range: RangeInclusive<i64>,
) -> Result<i64, ConfigError> {
    let value = parsed_var(key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
    }
}

// Zero means "not configured" and falls back to the default test.
fn test_id_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let id = parsed_var(key, 0u64)?;
    Ok(if id == 0 { default } else { id })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a number in range (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "TEST_A_ID",
            "TEST_B_ID",
            "TEST_A_PASS_SCORE",
            "TEST_B_PASS_SCORE",
            "USE_MOCK_DATA",
            "HACKERRANK_BASE_URL",
            "HACKERRANK_TIMEOUT_SECS",
            "ACCESS_TOKEN",
            "API_TOKEN",
            "JWT_ACCESS_TOKEN",
            "JWT_REFRESH_TOKEN",
            "NOTIFY_TOP_N",
            "MEETING_LEAD_DAYS",
            "MEETING_DURATION_MINUTES",
            "MEETING_BASE_URL",
            "NOTIFY_ON_PIPELINE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.screening, ScreeningConfig::default());
        assert_eq!(config.hackerrank.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.hackerrank.request_timeout, Duration::from_secs(30));
        assert_eq!(config.notifications.top_n, 3);
        assert!(!config.view().api_configured);
    }

    #[test]
    fn zero_test_ids_fall_back_to_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TEST_A_ID", "0");
        env::set_var("TEST_B_ID", "200");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.screening.test_a_id, TestId(DEFAULT_TEST_A_ID));
        assert_eq!(config.screening.test_b_id, TestId(200));
        reset_env();
    }

    #[test]
    fn view_reports_credentials_and_fixture_toggle() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TEST_A_ID", "100");
        env::set_var("TEST_A_PASS_SCORE", "65.5");
        env::set_var("ACCESS_TOKEN", "token");
        env::set_var("USE_MOCK_DATA", "TRUE");
        let view = AppConfig::load().expect("config loads").view();
        assert_eq!(view.test_a_id, TestId(100));
        assert_eq!(view.test_a_pass_score, 65.5);
        assert!(view.api_configured);
        assert!(view.use_mock_data);
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TEST_B_PASS_SCORE", "eighty");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key, value }) => {
                assert_eq!(key, "TEST_B_PASS_SCORE");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_meeting_window_out_of_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MEETING_LEAD_DAYS", "200000000000000");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key, .. }) => assert_eq!(key, "MEETING_LEAD_DAYS"),
            other => panic!("expected invalid lead days, got {other:?}"),
        }

        reset_env();
        env::set_var("MEETING_DURATION_MINUTES", "-15");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key, value }) => {
                assert_eq!(key, "MEETING_DURATION_MINUTES");
                assert_eq!(value, "-15");
            }
            other => panic!("expected invalid duration, got {other:?}"),
        }

        reset_env();
        env::set_var("MEETING_LEAD_DAYS", "0");
        let config = AppConfig::load().expect("same-day meetings are allowed");
        assert_eq!(config.notifications.meeting_lead_days, 0);
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}
