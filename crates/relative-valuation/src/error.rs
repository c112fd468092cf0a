use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::valuation::engine::ValuationError;
use crate::valuation::ComparableImportError;
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Input(serde_json::Error),
    Import(ComparableImportError),
    Valuation(ValuationError),
}

impl AppError {
    /// Stable machine-readable category.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Valuation(ValuationError::Validation(_)) => "validation_error",
            AppError::Valuation(ValuationError::WeightResolution(_)) => "weight_resolution_error",
            AppError::Io(_) | AppError::Input(_) | AppError::Import(_) => "input_error",
            AppError::Config(_) => "config_error",
            AppError::Telemetry(_) => "telemetry_error",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.code() {
            "validation_error" => 2,
            "weight_resolution_error" => 3,
            "input_error" => 4,
            "config_error" => 5,
            _ => 1,
        }
    }

    /// `{"error": {"code", "message"}}` body written to stderr by the CLI.
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Input(err) => write!(f, "malformed input document: {}", err),
            AppError::Import(err) => write!(f, "{}", err),
            AppError::Valuation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Input(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Valuation(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}

impl From<ComparableImportError> for AppError {
    fn from(value: ComparableImportError) -> Self {
        Self::Import(value)
    }
}

impl From<ValuationError> for AppError {
    fn from(value: ValuationError) -> Self {
        Self::Valuation(value)
    }
}
