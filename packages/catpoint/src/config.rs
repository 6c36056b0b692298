use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub state_path: PathBuf,
    pub classifier_timeout: Duration,
    pub listener_budget: Duration,
    pub max_sensors: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            state_path: lookup("CATPOINT_STATE_PATH")
                .unwrap_or_else(|| "catpoint-state.json".to_string())
                .into(),
            classifier_timeout: Duration::from_millis(
                lookup("CATPOINT_CLASSIFIER_TIMEOUT_MS")
                    .unwrap_or_else(|| "10000".to_string())
                    .parse()
                    .context("CATPOINT_CLASSIFIER_TIMEOUT_MS must be a valid number")?,
            ),
            listener_budget: Duration::from_millis(
                lookup("CATPOINT_LISTENER_BUDGET_MS")
                    .unwrap_or_else(|| "250".to_string())
                    .parse()
                    .context("CATPOINT_LISTENER_BUDGET_MS must be a valid number")?,
            ),
            max_sensors: lookup("CATPOINT_MAX_SENSORS")
                .unwrap_or_else(|| "4".to_string())
                .parse()
                .context("CATPOINT_MAX_SENSORS must be a valid number")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.state_path, PathBuf::from("catpoint-state.json"));
        assert_eq!(config.classifier_timeout, Duration::from_secs(10));
        assert_eq!(config.listener_budget, Duration::from_millis(250));
        assert_eq!(config.max_sensors, 4);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CATPOINT_STATE_PATH", "/var/lib/catpoint/state.json"),
            ("CATPOINT_CLASSIFIER_TIMEOUT_MS", "1500"),
            ("CATPOINT_MAX_SENSORS", "8"),
        ]))
        .unwrap();

        assert_eq!(
            config.state_path,
            PathBuf::from("/var/lib/catpoint/state.json")
        );
        assert_eq!(config.classifier_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_sensors, 8);
    }

    #[test]
    fn rejects_invalid_numbers() {
        let err = Config::from_lookup(lookup(&[("CATPOINT_MAX_SENSORS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("CATPOINT_MAX_SENSORS"));
    }
}
