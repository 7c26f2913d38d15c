//! Error types for Invevent core domain logic

use thiserror::Error;

/// Core event domain errors
#[derive(Error, Debug)]
pub enum InveventError {
    /// A wizard draft reached commit without a required field.
    /// The step sequence makes this unreachable for well-formed flows.
    #[error("Wizard draft is missing {0}")]
    IncompleteDraft(&'static str),

    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
}

/// Result type alias for event operations
pub type InveventResult<T> = Result<T, InveventError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}
