//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_INFERENCE_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub inference_api_key: String,
    pub inference_base_url: String,
    pub exam_model: String,
    pub analysis_model: String,
    pub history_path: PathBuf,
    pub max_upload_bytes: usize,
    pub progress_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Inference Backend ---
        let inference_api_key = ["INFERENCE_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| ConfigError::MissingVar("INFERENCE_API_KEY".to_string()))?;
        let inference_base_url = std::env::var("INFERENCE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_INFERENCE_BASE_URL.to_string());
        let exam_model = std::env::var("EXAM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let analysis_model =
            std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        // --- Workspace Settings ---
        let history_path = std::env::var("HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./exam_history.json"));

        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?;
        let progress_interval = positive_millis("PROGRESS_INTERVAL_MS", 2000)?;

        Ok(Self {
            bind_address,
            log_level,
            inference_api_key,
            inference_base_url,
            exam_model,
            analysis_model,
            history_path,
            max_upload_bytes,
            progress_interval,
        })
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// A non-zero millisecond duration; tokio intervals reject zero periods.
fn positive_millis(name: &str, default: u64) -> Result<Duration, ConfigError> {
    match parse_or(name, default)? {
        0 => Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        )),
        millis => Ok(Duration::from_millis(millis)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        assert_eq!(parse_or::<u64>("EXAM_FORGE_TEST_UNSET_VAR", 42).unwrap(), 42);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        std::env::set_var("EXAM_FORGE_TEST_BAD_NUMBER", "lots");
        let err = parse_or::<usize>("EXAM_FORGE_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "EXAM_FORGE_TEST_BAD_NUMBER"));
    }

    #[test]
    fn zero_progress_interval_is_rejected() {
        std::env::set_var("EXAM_FORGE_TEST_ZERO_INTERVAL", "0");
        let err = positive_millis("EXAM_FORGE_TEST_ZERO_INTERVAL", 2000).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "EXAM_FORGE_TEST_ZERO_INTERVAL"));

        std::env::set_var("EXAM_FORGE_TEST_SHORT_INTERVAL", "250");
        assert_eq!(
            positive_millis("EXAM_FORGE_TEST_SHORT_INTERVAL", 2000).unwrap(),
            Duration::from_millis(250)
        );
    }
}
