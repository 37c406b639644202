use thiserror::Error;

/// Message returned to the host when the payload has no event tag.
pub const MISSING_EVENT_MESSAGE: &str = "no webhook event found in content";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{}", MISSING_EVENT_MESSAGE)]
    MissingEventKind,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("payload parse error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("cannot derive origin from issue url: {0}")]
    Url(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("IO error reading config file: {message}")]
    IoError { message: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },
}
