use crate::valuation::engine::{EngineConfig, DEFAULT_MIN_SCORED_WEIGHT};
use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of the tool.
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let min_scored_weight = match env::var("APP_MIN_SCORED_WEIGHT") {
            Ok(raw) => parse_min_scored_weight(&raw)?,
            Err(_) => DEFAULT_MIN_SCORED_WEIGHT,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig { min_scored_weight },
        })
    }
}

/// Parses a scored-weight floor; must be a fraction in (0, 1].
pub fn parse_min_scored_weight(raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidMinScoredWeight(raw.to_string()))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidMinScoredWeight(raw.to_string()))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMinScoredWeight(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMinScoredWeight(raw) => write!(
                f,
                "APP_MIN_SCORED_WEIGHT must be a fraction in (0, 1] (found '{}')",
                raw
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
