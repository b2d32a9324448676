// Error types for the analysis core
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Window length must be a positive number of minutes, got {minutes}")]
    InvalidWindow { minutes: f64 },

    #[error("Sector count must be at least 1")]
    InvalidSectorCount,

    #[error("Invalid speed bins: {0}")]
    InvalidSpeedBins(String),

    #[error("Unknown smoothing method: {0}")]
    UnknownMethod(String),

    #[error("Unknown bucket mode: {0}")]
    UnknownMode(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
