use metrics_exporter_prometheus::PrometheusHandle;
use screening_agent::config::AppConfig;
use screening_agent::error::AppError;
use screening_agent::telemetry;
use screening_agent::workflows::screening::ScreeningService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads configuration, installs logging and wires the screening service.
pub(crate) fn bootstrap() -> Result<(AppConfig, ScreeningService), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = ScreeningService::from_config(&config);
    Ok((config, service))
}

pub(crate) fn parse_test_id(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("test id must be greater than zero".to_string()),
        Ok(id) => Ok(id),
        Err(err) => Err(format!("failed to parse '{raw}' as a test id ({err})")),
    }
}

pub(crate) fn parse_score(raw: &str) -> Result<f64, String> {
    let score = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{raw}' as a score ({err})"))?;
    if score.is_finite() {
        Ok(score)
    } else {
        Err(format!("score '{raw}' must be a finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_must_be_positive_integers() {
        assert_eq!(parse_test_id(" 356098 "), Ok(356098));
        assert!(parse_test_id("0").is_err());
        assert!(parse_test_id("abc").is_err());
    }

    #[test]
    fn scores_must_be_finite() {
        assert_eq!(parse_score("72.5"), Ok(72.5));
        assert!(parse_score("NaN").is_err());
        assert!(parse_score("high").is_err());
    }
}
